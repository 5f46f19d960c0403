//! Engine configuration
//!
//! Fixed defaults with environment overrides, loaded once at startup.

use std::path::PathBuf;

/// Configuration for the evaluation engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory under which per-session workspaces are allocated
    pub workspace_root: PathBuf,
    /// Compile time limit in milliseconds (default: 30000ms = 30s)
    pub compile_time_limit_ms: u32,
    /// Extra wall-clock margin beyond the CPU budget before the watchdog
    /// fires, to absorb sandbox start-up and scheduling jitter
    pub watchdog_margin_ms: u32,
    /// Maximum process/thread count inside a sandbox unit
    pub max_processes: u32,
    /// Maximum output file size in KB
    pub max_output_kb: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workspace_root: std::env::temp_dir().join("grader"),
            compile_time_limit_ms: 30_000,
            watchdog_margin_ms: 1_000,
            max_processes: 64,
            max_output_kb: 262_144, // 256MB
        }
    }
}

impl EngineConfig {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Self {
            workspace_root: std::env::var("GRADER_WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.workspace_root),
            compile_time_limit_ms: env_u32(
                "GRADER_COMPILE_TIME_LIMIT_MS",
                defaults.compile_time_limit_ms,
            ),
            watchdog_margin_ms: env_u32("GRADER_WATCHDOG_MARGIN_MS", defaults.watchdog_margin_ms),
            max_processes: env_u32("GRADER_MAX_PROCESSES", defaults.max_processes),
            max_output_kb: env_u32("GRADER_MAX_OUTPUT_KB", defaults.max_output_kb),
        }
    }

    /// Wall-clock watchdog timeout for a CPU budget. Intentionally larger
    /// than the CPU limit so the enforcement layer gets first shot at
    /// killing a runaway process.
    pub fn wall_clock_timeout_ms(&self, cpu_time_limit_ms: u32) -> u32 {
        cpu_time_limit_ms * 2 + self.watchdog_margin_ms
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_clock_timeout_exceeds_cpu_budget() {
        let config = EngineConfig::default();
        assert!(config.wall_clock_timeout_ms(1000) > 1000);
        assert_eq!(config.wall_clock_timeout_ms(1000), 3000);
    }
}
