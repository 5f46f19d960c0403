//! Test case execution
//!
//! Runs one test case's artifact inside a fresh sandbox unit, wrapped in a
//! wall-clock watchdog. The watchdog timeout is deliberately larger than
//! the CPU budget: the in-unit enforcement layer (rlimits, cgroup) gets
//! first shot, and the watchdog only fires for hangs that CPU accounting
//! cannot see. On expiry the unit is force-terminated by name and the
//! execution is reported as watchdog-fired, distinct from a
//! resource-limit kill.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::sandbox::{ExitKind, RunMetrics, SandboxUnit, UnitLimits};

/// Per-case resource constraints, from the question spec
#[derive(Debug, Clone, Copy)]
pub struct CaseLimits {
    /// CPU time budget in milliseconds
    pub cpu_time_ms: u32,
    /// Resident memory ceiling in MB
    pub memory_mb: u32,
}

/// Raw signal from executing one test case (no verdict interpretation)
#[derive(Debug, Clone)]
pub struct RawExecution {
    pub stdout: String,
    /// How the process terminated; None when the watchdog cut it off
    pub exit: Option<ExitKind>,
    pub metrics: RunMetrics,
    /// Whether the wall-clock watchdog fired
    pub watchdog_fired: bool,
}

/// Execution seam between the orchestrator and the sandbox
#[async_trait]
pub trait CaseRunner: Send + Sync {
    async fn run_case(
        &self,
        work_dir: &Path,
        command: &[String],
        stdin_file: &Path,
        limits: &CaseLimits,
    ) -> Result<RawExecution>;
}

/// Runner backed by real sandbox units
pub struct SandboxRunner {
    config: EngineConfig,
}

impl SandboxRunner {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CaseRunner for SandboxRunner {
    async fn run_case(
        &self,
        work_dir: &Path,
        command: &[String],
        stdin_file: &Path,
        limits: &CaseLimits,
    ) -> Result<RawExecution> {
        let unit = SandboxUnit::new();
        let unit_limits = UnitLimits {
            cpu_time_ms: limits.cpu_time_ms,
            memory_mb: limits.memory_mb,
            max_processes: self.config.max_processes,
            max_output_kb: self.config.max_output_kb,
        };

        let wall_timeout =
            Duration::from_millis(u64::from(self.config.wall_clock_timeout_ms(limits.cpu_time_ms)));

        debug!(
            "Executing in unit {} (cpu={}ms, mem={}MB, wall={}ms)",
            unit.name(),
            limits.cpu_time_ms,
            limits.memory_mb,
            wall_timeout.as_millis()
        );

        let run = unit.run(command, work_dir, stdin_file, &unit_limits);
        let result = tokio::time::timeout(wall_timeout, run).await;

        // Teardown is unconditional on every path. The unit normally exits
        // on its own and stopping it again is a no-op; after a watchdog
        // expiry this is what actually kills the runaway process tree.
        unit.terminate().await;

        match result {
            Ok(Ok(outcome)) => Ok(RawExecution {
                stdout: outcome.stdout,
                exit: Some(outcome.exit),
                metrics: outcome.metrics,
                watchdog_fired: false,
            }),
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => {
                warn!(
                    "Wall-clock watchdog fired for unit {} after {}ms",
                    unit.name(),
                    wall_timeout.as_millis()
                );
                Ok(RawExecution {
                    stdout: String::new(),
                    exit: None,
                    metrics: RunMetrics {
                        wall_time_ms: wall_timeout.as_millis() as u32,
                        ..RunMetrics::default()
                    },
                    watchdog_fired: true,
                })
            }
        }
    }
}
