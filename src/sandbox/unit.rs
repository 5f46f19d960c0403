//! Sandbox unit management
//!
//! Each test-case execution runs inside its own transient systemd scope,
//! created under a fresh random unit name. The unit name is the handle for
//! everything that follows: cgroup resource limits are attached to it and
//! forced termination kills the unit, never a raw process id. Tearing down
//! a unit that has already exited is a no-op.
//!
//! Limit enforcement is split across two layers:
//! - cgroup properties on the scope: memory ceiling, task count, network
//!   deny-all
//! - inherited rlimits set before exec: CPU seconds, output file size
//!
//! Usage accounting comes from a GNU time wrapper writing a metrics file
//! into the working directory (see `metrics`).

use std::path::{Path, PathBuf};
use std::process::Stdio;

use nix::sys::resource::{setrlimit, Resource};
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};
use uuid::Uuid;

use super::metrics::{parse_metrics, RunMetrics, TIME_FORMAT};
use crate::error::{EngineError, Result};

/// Hard limits attached to one sandbox unit
#[derive(Debug, Clone)]
pub struct UnitLimits {
    /// CPU time budget in milliseconds
    pub cpu_time_ms: u32,
    /// Resident memory ceiling in MB
    pub memory_mb: u32,
    /// Maximum process/thread count
    pub max_processes: u32,
    /// Maximum output file size in KB
    pub max_output_kb: u32,
}

/// How the sandboxed process terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    /// Normal exit with the given code
    Exited(i32),
    /// Killed by the given signal
    Signaled(i32),
}

/// Raw outcome of one sandboxed execution (no verdict interpretation)
#[derive(Debug)]
pub struct UnitOutcome {
    pub exit: ExitKind,
    pub metrics: RunMetrics,
    pub stdout: String,
}

/// A named transient isolation unit
pub struct SandboxUnit {
    name: String,
}

impl SandboxUnit {
    /// Allocate a fresh unit name. Nothing is created on the system until
    /// `run`; the name is random so concurrent sessions never collide.
    pub fn new() -> Self {
        let name = format!("grader-{}", Uuid::new_v4().simple());
        Self { name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn metrics_path(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(format!("{}.metrics", self.name))
    }

    fn stdout_path(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(format!("{}.stdout", self.name))
    }

    /// systemd-run argument list for this unit (structured, never shell
    /// interpolated)
    fn scope_args(&self, limits: &UnitLimits) -> Vec<String> {
        vec![
            "--scope".to_string(),
            "--quiet".to_string(),
            "--collect".to_string(),
            format!("--unit={}", self.name),
            "-p".to_string(),
            format!("MemoryMax={}M", limits.memory_mb),
            "-p".to_string(),
            "MemorySwapMax=0".to_string(),
            "-p".to_string(),
            format!("TasksMax={}", limits.max_processes),
            "-p".to_string(),
            "IPAddressDeny=any".to_string(),
        ]
    }

    /// Run a command inside this unit with stdin fed from a file.
    ///
    /// Blocks until the unit exits on its own; the wall-clock watchdog
    /// around this call lives in the executor.
    pub async fn run(
        &self,
        command: &[String],
        work_dir: &Path,
        stdin_file: &Path,
        limits: &UnitLimits,
    ) -> Result<UnitOutcome> {
        let metrics_path = self.metrics_path(work_dir);
        let stdout_path = self.stdout_path(work_dir);

        let mut args = self.scope_args(limits);
        args.push("--".to_string());
        args.push("/usr/bin/time".to_string());
        args.push("-f".to_string());
        args.push(TIME_FORMAT.to_string());
        args.push("-o".to_string());
        args.push(metrics_path.to_string_lossy().into_owned());
        args.extend(command.iter().cloned());

        debug!("Running unit {} with args: {:?}", self.name, args);

        let stdin = fs::File::open(stdin_file)
            .await
            .map_err(|source| EngineError::SandboxLaunch {
                unit: self.name.clone(),
                source,
            })?
            .into_std()
            .await;
        let stdout = fs::File::create(&stdout_path)
            .await
            .map_err(|source| EngineError::SandboxLaunch {
                unit: self.name.clone(),
                source,
            })?
            .into_std()
            .await;

        let mut cmd = Command::new("systemd-run");
        cmd.args(&args)
            .current_dir(work_dir)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::null())
            .kill_on_drop(true);

        // CPU and output-size ceilings travel into the unit as inherited
        // rlimits; the soft CPU limit raises SIGXCPU, the hard one SIGKILL.
        let cpu_soft_secs = (u64::from(limits.cpu_time_ms) + 999) / 1000 + 1;
        let fsize_bytes = u64::from(limits.max_output_kb) * 1024;
        unsafe {
            cmd.pre_exec(move || {
                setrlimit(Resource::RLIMIT_CPU, cpu_soft_secs, cpu_soft_secs + 1)
                    .map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
                setrlimit(Resource::RLIMIT_FSIZE, fsize_bytes, fsize_bytes)
                    .map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(|source| EngineError::SandboxLaunch {
            unit: self.name.clone(),
            source,
        })?;

        let status = child.wait().await.map_err(|source| EngineError::Sandbox {
            unit: self.name.clone(),
            message: format!("wait failed: {}", source),
        })?;

        let exit = exit_kind(&status);

        // Both files live inside the workspace and go away with it; a
        // missing metrics file just means the run was cut short.
        let metrics_content = fs::read_to_string(&metrics_path).await.unwrap_or_default();
        let metrics = parse_metrics(&metrics_content);
        let stdout_content = fs::read_to_string(&stdout_path).await.unwrap_or_default();

        Ok(UnitOutcome {
            exit,
            metrics,
            stdout: stdout_content,
        })
    }

    /// Force-terminate every process in this unit, by name.
    ///
    /// Idempotent and unconditional: stopping a unit that never started or
    /// has already exited is not an error.
    pub async fn terminate(&self) {
        let _ = Command::new("systemctl")
            .args(["stop", &format!("{}.scope", self.name)])
            .output()
            .await;
        info!("Terminated sandbox unit {}", self.name);
    }
}

impl Default for SandboxUnit {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a wait status onto the exit taxonomy. GNU time reports a signaled
/// child as exit code 128 + signal, and systemd-run propagates that.
fn exit_kind(status: &std::process::ExitStatus) -> ExitKind {
    use std::os::unix::process::ExitStatusExt;

    if let Some(sig) = status.signal() {
        return ExitKind::Signaled(sig);
    }
    match status.code() {
        Some(code) if code > 128 => ExitKind::Signaled(code - 128),
        Some(code) => ExitKind::Exited(code),
        None => ExitKind::Signaled(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> UnitLimits {
        UnitLimits {
            cpu_time_ms: 2000,
            memory_mb: 256,
            max_processes: 64,
            max_output_kb: 262_144,
        }
    }

    #[test]
    fn unit_names_are_unique() {
        let a = SandboxUnit::new();
        let b = SandboxUnit::new();
        assert_ne!(a.name(), b.name());
        assert!(a.name().starts_with("grader-"));
    }

    #[test]
    fn scope_args_carry_hard_limits() {
        let unit = SandboxUnit::new();
        let args = unit.scope_args(&limits());
        assert!(args.contains(&"MemoryMax=256M".to_string()));
        assert!(args.contains(&"TasksMax=64".to_string()));
        assert!(args.contains(&"IPAddressDeny=any".to_string()));
        assert!(args.contains(&format!("--unit={}", unit.name())));
    }

    #[test]
    fn exit_kind_decodes_signal_convention() {
        use std::os::unix::process::ExitStatusExt;
        use std::process::ExitStatus;

        // Raw wait status: exited with code 139 (128 + SIGSEGV).
        let status = ExitStatus::from_raw(139 << 8);
        assert_eq!(exit_kind(&status), ExitKind::Signaled(11));

        let status = ExitStatus::from_raw(0);
        assert_eq!(exit_kind(&status), ExitKind::Exited(0));

        // Directly signaled wait status (SIGKILL).
        let status = ExitStatus::from_raw(9);
        assert_eq!(exit_kind(&status), ExitKind::Signaled(9));
    }
}
