//! Evaluation orchestrator
//!
//! Drives one grading session end to end: workspace setup, compile stage,
//! per-test-case execution and classification, aggregation, result
//! write-back, teardown. Sessions are fully independent; concurrency
//! isolation comes from unique workspace and unit names, not locks.
//!
//! A failing test case never stops the loop: every case runs through to
//! classification so the full telemetry is collected. Only a compile
//! failure is pipeline-fatal, and on that path no sandbox unit is ever
//! created. Workspace teardown happens on every exit path, including
//! infrastructure failures mid-loop.

use tracing::{debug, info, warn};

use crate::classify::classify;
use crate::compiler::{compile, CompileOutcome};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::executor::{CaseLimits, CaseRunner};
use crate::languages::{get_language_config, LanguageConfig};
use crate::sandbox::ExitKind;
use crate::stores::{QuestionSpec, QuestionStore, ResultStore, Submission, SubmissionStore};
use crate::verdict::{aggregate, CaseResult, FinalVerdict};
use crate::workspace::Workspace;

/// Maximum chars of per-case stdout carried into logs
const OUTPUT_PREVIEW_CHARS: usize = 4096;

/// One evaluation request, as handed over by the job system
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub student_id: i64,
    pub lesson_context_id: i64,
    pub question_id: i64,
    /// Language name or alias as dispatched; the stored submission's own
    /// declaration is authoritative when the two disagree
    pub language: String,
}

/// The evaluation engine, wired to its external collaborators
pub struct Evaluator<'a> {
    submissions: &'a dyn SubmissionStore,
    questions: &'a dyn QuestionStore,
    results: &'a dyn ResultStore,
    runner: &'a dyn CaseRunner,
    config: EngineConfig,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        submissions: &'a dyn SubmissionStore,
        questions: &'a dyn QuestionStore,
        results: &'a dyn ResultStore,
        runner: &'a dyn CaseRunner,
        config: EngineConfig,
    ) -> Self {
        Self {
            submissions,
            questions,
            results,
            runner,
            config,
        }
    }

    /// Grade one submission and record the verdict.
    pub async fn evaluate(&self, request: &EvaluationRequest) -> Result<FinalVerdict> {
        let submission = self
            .submissions
            .resolve(
                request.student_id,
                request.lesson_context_id,
                request.question_id,
            )
            .await?;
        // The submission record carries the declared language; the request's
        // copy is only cross-checked so a stale dispatch payload cannot pick
        // the wrong adapter.
        let lang = get_language_config(&submission.language)?;
        match get_language_config(&request.language) {
            Ok(requested) if requested.name == lang.name => {}
            _ => warn!(
                "Request language {:?} disagrees with submission {}'s declared \
                 language {:?}; using the submission's",
                request.language, submission.id, submission.language
            ),
        }
        let question = self.questions.load(request.question_id).await?;

        info!(
            "Evaluating submission {} (student={}, question={}, language={}, testcases={})",
            submission.id,
            request.student_id,
            request.question_id,
            lang.name,
            question.test_cases.len()
        );

        let workspace = Workspace::create(&self.config.workspace_root).await?;
        let session = self
            .run_session(&workspace, &submission, &lang, &question)
            .await;
        // Unconditional teardown, also when the session failed mid-loop.
        workspace.destroy().await;

        let verdict = session?;
        self.results.record(submission.id, &verdict).await?;

        info!(
            "Session summary: submission={}, verdict={}, passed={}/{}, max_time_ms={}, max_memory_kb={}",
            submission.id,
            verdict.overall,
            verdict.passed_count,
            verdict.total_count,
            verdict.max_wall_time_ms,
            verdict.max_memory_kb
        );

        Ok(verdict)
    }

    async fn run_session(
        &self,
        workspace: &Workspace,
        submission: &Submission,
        lang: &LanguageConfig,
        question: &QuestionSpec,
    ) -> Result<FinalVerdict> {
        workspace
            .populate(&submission.source_path, &lang.source_file, &question.test_cases)
            .await?;

        if let Some(compile_cmd) = &lang.compile_command {
            match compile(workspace.path(), compile_cmd, self.config.compile_time_limit_ms).await? {
                CompileOutcome::Success => {}
                CompileOutcome::Failed { diagnostics } => {
                    info!(
                        "Compile failed for submission {}: {}",
                        submission.id,
                        preview(&diagnostics)
                    );
                    return Ok(FinalVerdict::compile_error());
                }
            }
        }

        let limits = CaseLimits {
            cpu_time_ms: question.run_time_limit_ms,
            memory_mb: question.memory_limit_mb,
        };

        let mut case_results = Vec::with_capacity(question.test_cases.len());
        for tc in &question.test_cases {
            let raw = self
                .runner
                .run_case(
                    workspace.path(),
                    &lang.run_command,
                    &workspace.input_path(tc.index),
                    &limits,
                )
                .await?;

            let outcome = classify(&raw, &tc.expected_output, &limits);
            debug!(
                "Case {}: {} (cpu={}ms, mem={}KB, stdout={:?})",
                tc.index,
                outcome,
                raw.metrics.cpu_time_ms,
                raw.metrics.peak_memory_kb,
                preview(&raw.stdout)
            );

            case_results.push(CaseResult {
                index: tc.index,
                outcome,
                wall_time_ms: raw.metrics.wall_time_ms,
                cpu_time_ms: raw.metrics.cpu_time_ms,
                peak_memory_kb: raw.metrics.peak_memory_kb,
                signal: match raw.exit {
                    Some(ExitKind::Signaled(sig)) => Some(sig),
                    _ => None,
                },
            });
        }

        Ok(aggregate(&case_results))
    }
}

fn preview(s: &str) -> String {
    s.chars().take(OUTPUT_PREVIEW_CHARS).collect()
}
