//! Compile stage
//!
//! Turns a submission source into a runnable artifact inside the
//! workspace, or reports a compile failure with the captured diagnostics.
//! Interpreted languages skip this stage entirely; the orchestrator only
//! calls in when the language adapter carries a compile command.
//!
//! Compilation runs the toolchain directly (no sandbox unit exists on
//! this path): any diagnostic output on either stream fails the
//! submission before a single test case executes.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{EngineError, Result};

/// Outcome of the compile stage
#[derive(Debug)]
pub enum CompileOutcome {
    /// Artifact produced, workspace holds the executable
    Success,
    /// Compilation failed; the submission is judged `CompileError`
    Failed {
        /// Combined stdout + stderr of the toolchain
        diagnostics: String,
    },
}

impl CompileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CompileOutcome::Success)
    }
}

/// Invoke the language toolchain in the workspace.
pub async fn compile(
    work_dir: &Path,
    compile_cmd: &[String],
    time_limit_ms: u32,
) -> Result<CompileOutcome> {
    let (program, args) = compile_cmd
        .split_first()
        .ok_or_else(|| EngineError::CompilerInvocation(std::io::Error::other("empty compile command")))?;

    debug!("Compiling with {:?} in {:?}", compile_cmd, work_dir);

    let child = Command::new(program)
        .args(args)
        .current_dir(work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(EngineError::CompilerInvocation)?;

    let output = match tokio::time::timeout(
        Duration::from_millis(u64::from(time_limit_ms)),
        child.wait_with_output(),
    )
    .await
    {
        Ok(result) => result.map_err(EngineError::CompilerInvocation)?,
        Err(_elapsed) => {
            info!("Compilation timed out after {}ms", time_limit_ms);
            return Ok(CompileOutcome::Failed {
                diagnostics: "compilation timed out".to_string(),
            });
        }
    };

    let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
    diagnostics.push_str(&String::from_utf8_lossy(&output.stderr));

    if !diagnostics.is_empty() {
        info!("Compilation produced diagnostics, failing submission");
        return Ok(CompileOutcome::Failed { diagnostics });
    }

    if !output.status.success() {
        return Ok(CompileOutcome::Failed {
            diagnostics: format!(
                "compiler exited with status {}",
                output.status.code().unwrap_or(-1)
            ),
        });
    }

    Ok(CompileOutcome::Success)
}
