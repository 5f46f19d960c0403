//! Per-test-case verdict classification
//!
//! State machine over the raw execution signal, inspected in fixed
//! priority order:
//!
//! 1. Watchdog fired -> `Timeout`
//! 2. Fault signal (SIGSEGV class) -> `RuntimeError`
//! 3. Enforcement kill: CPU usage at the budget -> `TimeLimitExceeded`,
//!    memory at the ceiling -> `MemoryLimitExceeded`, otherwise the cause
//!    is ambiguous and classified conservatively as `RuntimeError`
//! 4. Normal exit -> output comparison: `Accepted` or `WrongAnswer`
//!
//! Exit codes are not part of the taxonomy; a process that exits on its
//! own is judged by its output alone.

use tracing::warn;

use crate::comparator::outputs_match;
use crate::executor::{CaseLimits, RawExecution};
use crate::sandbox::ExitKind;
use crate::verdict::Outcome;

/// Signals indicating the process faulted on its own
const FAULT_SIGNALS: &[i32] = &[
    nix::libc::SIGSEGV,
    nix::libc::SIGBUS,
    nix::libc::SIGFPE,
    nix::libc::SIGILL,
    nix::libc::SIGABRT,
];

/// Signals delivered by the resource enforcement layer
const ENFORCEMENT_SIGNALS: &[i32] =
    &[nix::libc::SIGKILL, nix::libc::SIGXCPU, nix::libc::SIGXFSZ];

/// Classify one test case's raw execution into an outcome kind.
pub fn classify(raw: &RawExecution, expected_output: &str, limits: &CaseLimits) -> Outcome {
    if raw.watchdog_fired {
        return Outcome::Timeout;
    }

    if let Some(ExitKind::Signaled(sig)) = raw.exit {
        if FAULT_SIGNALS.contains(&sig) {
            return Outcome::RuntimeError;
        }

        if ENFORCEMENT_SIGNALS.contains(&sig) {
            if raw.metrics.cpu_time_ms >= limits.cpu_time_ms {
                return Outcome::TimeLimitExceeded;
            }
            let memory_limit_kb = limits.memory_mb * 1024;
            if raw.metrics.peak_memory_kb >= memory_limit_kb {
                return Outcome::MemoryLimitExceeded;
            }
            warn!(
                "Enforcement kill (signal {}) with usage under both limits \
                 (cpu={}ms/{}ms, mem={}KB/{}KB); classifying as runtime error",
                sig, raw.metrics.cpu_time_ms, limits.cpu_time_ms,
                raw.metrics.peak_memory_kb, memory_limit_kb
            );
            return Outcome::RuntimeError;
        }

        // Unexpected signal (e.g. SIGPIPE): the termination cause is not
        // attributable to either limit.
        return Outcome::RuntimeError;
    }

    if outputs_match(&raw.stdout, expected_output) {
        Outcome::Accepted
    } else {
        Outcome::WrongAnswer
    }
}
