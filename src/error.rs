//! Infrastructure failure channel
//!
//! These errors are never graded results. A submission that times out or
//! crashes still produces a verdict; an `EngineError` means the engine
//! itself could not carry the evaluation through (workspace allocation,
//! sandbox launch, fixture access, result write-back). The surrounding job
//! system owns retry policy for these.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to create workspace under {root}: {source}")]
    WorkspaceCreate {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to populate workspace at {path}: {source}")]
    WorkspacePopulate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch sandbox unit {unit}: {source}")]
    SandboxLaunch {
        unit: String,
        #[source]
        source: std::io::Error,
    },

    #[error("sandbox unit {unit} failed: {message}")]
    Sandbox { unit: String, message: String },

    #[error("failed to invoke compiler: {0}")]
    CompilerInvocation(#[source] std::io::Error),

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("submission store: {0}")]
    SubmissionStore(String),

    #[error("question store: {0}")]
    QuestionStore(String),

    #[error("result store: {0}")]
    ResultStore(String),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
