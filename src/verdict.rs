//! Verdict kinds and aggregation
//!
//! A single evaluation produces one `CaseResult` per test case and folds
//! them into a `FinalVerdict`. Aggregation is order-independent: any case
//! hitting a higher-priority failure kind wins, regardless of where in the
//! run it happened.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Judged outcome of a test case or a whole submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    /// Wall-clock watchdog fired without a resource-limit signal
    Timeout,
    RuntimeError,
    CompileError,
}

impl Outcome {
    /// Aggregation priority: when a submission mixes failure kinds, the
    /// highest-priority kind becomes the overall verdict.
    fn priority(self) -> u8 {
        match self {
            Outcome::Accepted => 0,
            Outcome::WrongAnswer => 1,
            Outcome::TimeLimitExceeded => 2,
            Outcome::MemoryLimitExceeded => 3,
            Outcome::Timeout => 4,
            Outcome::RuntimeError => 5,
            // Short-circuits the session before aggregation; ranked here
            // only so the ordering is total.
            Outcome::CompileError => 6,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Accepted => "accepted",
            Outcome::WrongAnswer => "wrong_answer",
            Outcome::TimeLimitExceeded => "time_limit_exceeded",
            Outcome::MemoryLimitExceeded => "memory_limit_exceeded",
            Outcome::Timeout => "timeout",
            Outcome::RuntimeError => "runtime_error",
            Outcome::CompileError => "compile_error",
        };
        write!(f, "{}", s)
    }
}

/// Per-test-case execution record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    /// 1-based test case index
    pub index: u32,
    pub outcome: Outcome,
    pub wall_time_ms: u32,
    pub cpu_time_ms: u32,
    pub peak_memory_kb: u32,
    /// Terminating signal, if the process was killed by one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,
}

/// Aggregate verdict for one submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalVerdict {
    pub overall: Outcome,
    pub max_wall_time_ms: u32,
    pub max_memory_kb: u32,
    pub passed_count: u32,
    pub total_count: u32,
}

impl FinalVerdict {
    /// Verdict for a submission that never compiled: no test case was
    /// executed, so counts and metrics are all zero.
    pub fn compile_error() -> Self {
        Self {
            overall: Outcome::CompileError,
            max_wall_time_ms: 0,
            max_memory_kb: 0,
            passed_count: 0,
            total_count: 0,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.overall == Outcome::Accepted
    }
}

/// Fold per-case results into the submission verdict.
///
/// Metrics maxima cover every executed case, including failing ones.
pub fn aggregate(results: &[CaseResult]) -> FinalVerdict {
    let total_count = results.len() as u32;
    let passed_count = results
        .iter()
        .filter(|r| r.outcome == Outcome::Accepted)
        .count() as u32;

    let overall = results
        .iter()
        .map(|r| r.outcome)
        .max_by_key(|o| o.priority())
        .unwrap_or(Outcome::Accepted);

    FinalVerdict {
        overall,
        max_wall_time_ms: results.iter().map(|r| r.wall_time_ms).max().unwrap_or(0),
        max_memory_kb: results.iter().map(|r| r.peak_memory_kb).max().unwrap_or(0),
        passed_count,
        total_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(index: u32, outcome: Outcome) -> CaseResult {
        CaseResult {
            index,
            outcome,
            wall_time_ms: 10 * index,
            cpu_time_ms: 5 * index,
            peak_memory_kb: 100 * index,
            signal: None,
        }
    }

    #[test]
    fn all_accepted_is_accepted() {
        let results = vec![
            case(1, Outcome::Accepted),
            case(2, Outcome::Accepted),
            case(3, Outcome::Accepted),
        ];
        let verdict = aggregate(&results);
        assert_eq!(verdict.overall, Outcome::Accepted);
        assert_eq!(verdict.passed_count, 3);
        assert_eq!(verdict.total_count, 3);
    }

    #[test]
    fn accepted_iff_all_passed() {
        let results = vec![case(1, Outcome::Accepted), case(2, Outcome::WrongAnswer)];
        let verdict = aggregate(&results);
        assert_ne!(verdict.overall, Outcome::Accepted);
        assert_eq!(verdict.passed_count, 1);
    }

    #[test]
    fn runtime_error_beats_everything() {
        let results = vec![
            case(1, Outcome::Timeout),
            case(2, Outcome::RuntimeError),
            case(3, Outcome::MemoryLimitExceeded),
            case(4, Outcome::WrongAnswer),
        ];
        assert_eq!(aggregate(&results).overall, Outcome::RuntimeError);
    }

    #[test]
    fn priority_chain_descends() {
        let chain = [
            Outcome::RuntimeError,
            Outcome::Timeout,
            Outcome::MemoryLimitExceeded,
            Outcome::TimeLimitExceeded,
            Outcome::WrongAnswer,
        ];
        // Drop the head one kind at a time; the next one down must win.
        for start in 0..chain.len() {
            let mut results = vec![case(1, Outcome::Accepted)];
            for (i, &kind) in chain[start..].iter().enumerate() {
                results.push(case(i as u32 + 2, kind));
            }
            assert_eq!(aggregate(&results).overall, chain[start]);
        }
    }

    #[test]
    fn tle_outranks_wrong_answer() {
        // Correct on test 1, wrong on test 2, CPU-killed on test 3.
        let results = vec![
            case(1, Outcome::Accepted),
            case(2, Outcome::WrongAnswer),
            case(3, Outcome::TimeLimitExceeded),
        ];
        let verdict = aggregate(&results);
        assert_eq!(verdict.overall, Outcome::TimeLimitExceeded);
        assert_eq!(verdict.passed_count, 1);
    }

    #[test]
    fn metrics_maxima_cover_failing_cases() {
        let mut slow = case(2, Outcome::WrongAnswer);
        slow.wall_time_ms = 900;
        slow.peak_memory_kb = 65536;
        let results = vec![case(1, Outcome::Accepted), slow];
        let verdict = aggregate(&results);
        assert_eq!(verdict.max_wall_time_ms, 900);
        assert_eq!(verdict.max_memory_kb, 65536);
    }

    #[test]
    fn compile_error_verdict_has_zero_counts() {
        let verdict = FinalVerdict::compile_error();
        assert_eq!(verdict.overall, Outcome::CompileError);
        assert_eq!(verdict.total_count, 0);
        assert_eq!(verdict.passed_count, 0);
    }

    #[test]
    fn outcome_serializes_snake_case() {
        let s = toml::to_string(&CaseResult {
            index: 1,
            outcome: Outcome::TimeLimitExceeded,
            wall_time_ms: 0,
            cpu_time_ms: 0,
            peak_memory_kb: 0,
            signal: None,
        })
        .unwrap();
        assert!(s.contains("time_limit_exceeded"));
    }
}
