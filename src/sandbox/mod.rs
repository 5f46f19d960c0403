//! Sandbox module - isolation unit wrapper
//!
//! Minimal abstraction over transient systemd scopes. It handles:
//! - Unit naming and creation
//! - Hard resource limits (memory, tasks, CPU, output size, network)
//! - Forced, idempotent termination by unit name
//! - Usage accounting via a metrics file
//!
//! The sandbox module does NOT:
//! - Interpret verdicts (that's the classifier's job)
//! - Know about languages or compilation
//! - Compare outputs

pub mod metrics;
pub mod unit;

pub use metrics::{parse_metrics, RunMetrics};
pub use unit::{ExitKind, SandboxUnit, UnitLimits, UnitOutcome};
