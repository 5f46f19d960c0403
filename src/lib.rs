//! Submission grading engine
//!
//! Grades a submitted program against a question's hidden test cases:
//! compiles it when the language requires, runs each case inside a
//! network-isolated sandbox unit under hard resource limits, compares
//! output, classifies per-case outcomes, and aggregates them into one
//! final verdict with peak timing/memory and pass counts.
//!
//! The surrounding system (queue dispatch, persistence, authoring UI) is
//! out of scope; it talks to the engine through the store traits in
//! [`stores`] and the [`evaluator::Evaluator`] entry point.

pub mod classify;
pub mod comparator;
pub mod compiler;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod languages;
pub mod sandbox;
pub mod stores;
pub mod verdict;
pub mod workspace;

pub use config::EngineConfig;
pub use error::EngineError;
pub use evaluator::{EvaluationRequest, Evaluator};
pub use executor::{CaseLimits, CaseRunner, SandboxRunner};
pub use stores::{
    FsQuestionStore, QuestionSpec, QuestionStore, ResultStore, Submission, SubmissionStore,
    TestCase,
};
pub use verdict::{aggregate, CaseResult, FinalVerdict, Outcome};
pub use workspace::Workspace;
