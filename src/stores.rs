//! External collaborator interfaces
//!
//! The engine does not own persistence: submissions, question data, and
//! graded results live behind these traits, implemented by the calling
//! system. Store failures surface on the infrastructure channel and are
//! never coerced into a judged outcome.
//!
//! `FsQuestionStore` is the one implementation shipped here, consuming the
//! per-question fixture directory layout: a `question.toml` manifest with
//! the limits plus `input_{i}.txt` / `expected_{i}.txt` pairs addressed by
//! 1-based test index.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::verdict::FinalVerdict;

/// A student's submitted program. Immutable input; the engine only reads it.
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: i64,
    pub student_id: i64,
    pub question_id: i64,
    pub lesson_context_id: i64,
    /// Declared language name or alias
    pub language: String,
    pub source_path: PathBuf,
}

/// One hidden test case, content already resolved
#[derive(Debug, Clone)]
pub struct TestCase {
    /// 1-based index; execution and reporting order
    pub index: u32,
    pub input: String,
    pub expected_output: String,
}

/// Grading parameters and fixtures for one question
#[derive(Debug, Clone)]
pub struct QuestionSpec {
    pub run_time_limit_ms: u32,
    pub memory_limit_mb: u32,
    pub test_cases: Vec<TestCase>,
}

/// Resolves a (student, lesson, question) tuple to the submitted source
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn resolve(
        &self,
        student_id: i64,
        lesson_context_id: i64,
        question_id: i64,
    ) -> Result<Submission>;
}

/// Resolves a question id to limits and test fixtures
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn load(&self, question_id: i64) -> Result<QuestionSpec>;
}

/// Receives the graded result; invoked at most once per session
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn record(&self, submission_id: i64, verdict: &FinalVerdict) -> Result<()>;
}

/// Default CPU budget when the question leaves it unset (5 seconds)
const DEFAULT_RUN_TIME_LIMIT_MS: u32 = 5_000;
/// Default memory ceiling when the question leaves it unset (256 MB)
const DEFAULT_MEMORY_LIMIT_MB: u32 = 256;

#[derive(Debug, Default, Deserialize)]
struct QuestionManifest {
    run_time_limit_ms: Option<u32>,
    memory_limit_mb: Option<u32>,
}

/// Question store backed by per-question fixture directories
pub struct FsQuestionStore {
    root: PathBuf,
}

impl FsQuestionStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn question_dir(&self, question_id: i64) -> PathBuf {
        self.root.join(question_id.to_string())
    }
}

#[async_trait]
impl QuestionStore for FsQuestionStore {
    async fn load(&self, question_id: i64) -> Result<QuestionSpec> {
        let dir = self.question_dir(question_id);

        let manifest: QuestionManifest = match fs::read_to_string(dir.join("question.toml")).await {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                EngineError::QuestionStore(format!(
                    "invalid manifest for question {}: {}",
                    question_id, e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => QuestionManifest::default(),
            Err(e) => {
                return Err(EngineError::QuestionStore(format!(
                    "failed to read manifest for question {}: {}",
                    question_id, e
                )))
            }
        };

        let mut test_cases = Vec::new();
        for index in 1u32.. {
            let input_path = dir.join(format!("input_{}.txt", index));
            if !fs::try_exists(&input_path).await.unwrap_or(false) {
                break;
            }
            let expected_path = dir.join(format!("expected_{}.txt", index));

            let input = fs::read_to_string(&input_path).await.map_err(|e| {
                EngineError::QuestionStore(format!("failed to read {:?}: {}", input_path, e))
            })?;
            let expected_output = fs::read_to_string(&expected_path).await.map_err(|e| {
                EngineError::QuestionStore(format!("failed to read {:?}: {}", expected_path, e))
            })?;

            test_cases.push(TestCase {
                index,
                input,
                expected_output,
            });
        }

        if test_cases.is_empty() {
            return Err(EngineError::QuestionStore(format!(
                "question {} has no test fixtures under {:?}",
                question_id, dir
            )));
        }

        debug!(
            "Loaded question {}: {} test cases",
            question_id,
            test_cases.len()
        );

        Ok(QuestionSpec {
            run_time_limit_ms: manifest.run_time_limit_ms.unwrap_or(DEFAULT_RUN_TIME_LIMIT_MS),
            memory_limit_mb: manifest.memory_limit_mb.unwrap_or(DEFAULT_MEMORY_LIMIT_MB),
            test_cases,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write_fixture(dir: &Path, index: u32, input: &str, expected: &str) {
        fs::write(dir.join(format!("input_{}.txt", index)), input)
            .await
            .unwrap();
        fs::write(dir.join(format!("expected_{}.txt", index)), expected)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn loads_ordered_fixtures_and_limits() {
        let root = tempfile::tempdir().unwrap();
        let q_dir = root.path().join("7");
        fs::create_dir_all(&q_dir).await.unwrap();
        fs::write(
            q_dir.join("question.toml"),
            "run_time_limit_ms = 2000\nmemory_limit_mb = 128\n",
        )
        .await
        .unwrap();
        write_fixture(&q_dir, 1, "1 2\n", "3\n").await;
        write_fixture(&q_dir, 2, "4 5\n", "9\n").await;

        let store = FsQuestionStore::new(root.path());
        let spec = store.load(7).await.unwrap();

        assert_eq!(spec.run_time_limit_ms, 2000);
        assert_eq!(spec.memory_limit_mb, 128);
        assert_eq!(spec.test_cases.len(), 2);
        assert_eq!(spec.test_cases[0].index, 1);
        assert_eq!(spec.test_cases[1].expected_output, "9\n");
    }

    #[tokio::test]
    async fn missing_manifest_falls_back_to_defaults() {
        let root = tempfile::tempdir().unwrap();
        let q_dir = root.path().join("3");
        fs::create_dir_all(&q_dir).await.unwrap();
        write_fixture(&q_dir, 1, "x\n", "y\n").await;

        let spec = FsQuestionStore::new(root.path()).load(3).await.unwrap();
        assert_eq!(spec.run_time_limit_ms, 5_000);
        assert_eq!(spec.memory_limit_mb, 256);
    }

    #[tokio::test]
    async fn question_without_fixtures_is_a_store_error() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("9")).await.unwrap();

        assert!(matches!(
            FsQuestionStore::new(root.path()).load(9).await,
            Err(EngineError::QuestionStore(_))
        ));
    }

    #[tokio::test]
    async fn fixture_gap_ends_the_sequence() {
        let root = tempfile::tempdir().unwrap();
        let q_dir = root.path().join("5");
        fs::create_dir_all(&q_dir).await.unwrap();
        write_fixture(&q_dir, 1, "a\n", "b\n").await;
        write_fixture(&q_dir, 3, "c\n", "d\n").await;

        let spec = FsQuestionStore::new(root.path()).load(5).await.unwrap();
        assert_eq!(spec.test_cases.len(), 1);
    }
}
