//! Resource usage accounting
//!
//! Each sandbox unit wraps the graded program in GNU time, which writes a
//! single metrics line (`%e %U %S %M`: wall seconds, user CPU seconds,
//! system CPU seconds, peak RSS in KB) to a file inside the workspace.
//! This module parses that file back into structured usage numbers.

/// GNU time format string producing one parseable metrics line
pub const TIME_FORMAT: &str = "%e %U %S %M";

/// Resource usage of one sandboxed execution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunMetrics {
    /// Wall clock time in milliseconds
    pub wall_time_ms: u32,
    /// CPU time (user + system) in milliseconds
    pub cpu_time_ms: u32,
    /// Peak resident set size in KB
    pub peak_memory_kb: u32,
}

/// Parse the metrics file written by GNU time.
///
/// When the program is killed by a signal, time prepends a diagnostic line
/// before the metrics line; only the last well-formed line counts. A
/// missing or unparseable file yields zeroed metrics rather than an error,
/// since the interesting facts (watchdog, kill signal) are known by then.
pub fn parse_metrics(content: &str) -> RunMetrics {
    for line in content.lines().rev() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 4 {
            continue;
        }

        let wall_secs: f64 = match fields[0].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        let user_secs: f64 = match fields[1].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        let sys_secs: f64 = match fields[2].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        let peak_memory_kb: u32 = match fields[3].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };

        return RunMetrics {
            wall_time_ms: (wall_secs * 1000.0) as u32,
            cpu_time_ms: ((user_secs + sys_secs) * 1000.0) as u32,
            peak_memory_kb,
        };
    }

    RunMetrics::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_run() {
        let metrics = parse_metrics("0.02 0.01 0.00 1864\n");
        assert_eq!(metrics.wall_time_ms, 20);
        assert_eq!(metrics.cpu_time_ms, 10);
        assert_eq!(metrics.peak_memory_kb, 1864);
    }

    #[test]
    fn skips_signal_diagnostic_line() {
        let content = "Command terminated by signal 9\n5.21 5.10 0.08 262144\n";
        let metrics = parse_metrics(content);
        assert_eq!(metrics.cpu_time_ms, 5180);
        assert_eq!(metrics.peak_memory_kb, 262144);
    }

    #[test]
    fn missing_file_yields_zeroes() {
        assert_eq!(parse_metrics(""), RunMetrics::default());
        assert_eq!(parse_metrics("garbage\n"), RunMetrics::default());
    }

    #[test]
    fn sums_user_and_system_time() {
        let metrics = parse_metrics("1.50 0.90 0.40 512\n");
        assert_eq!(metrics.cpu_time_ms, 1300);
        assert_eq!(metrics.wall_time_ms, 1500);
    }
}
