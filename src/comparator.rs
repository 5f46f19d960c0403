//! Output comparison
//!
//! Exact textual comparison. The only normalization applied is a trailing
//! newline on the expected output, so a program that does or does not end
//! its output with `\n` is treated consistently. No whitespace trimming,
//! no floating-point tolerance.

/// Compare actual program output against the expected output.
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    let expected_normalized: std::borrow::Cow<'_, str> = if expected.ends_with('\n') {
        expected.into()
    } else {
        format!("{}\n", expected).into()
    };

    let actual_normalized: std::borrow::Cow<'_, str> = if actual.ends_with('\n') {
        actual.into()
    } else {
        format!("{}\n", actual).into()
    };

    actual_normalized == expected_normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        assert!(outputs_match("hello\nworld\n", "hello\nworld\n"));
    }

    #[test]
    fn missing_final_newline_is_tolerated() {
        assert!(outputs_match("hello\nworld", "hello\nworld\n"));
        assert!(outputs_match("hello\nworld\n", "hello\nworld"));
    }

    #[test]
    fn interior_whitespace_is_significant() {
        assert!(!outputs_match("hello  \nworld\n", "hello\nworld\n"));
        assert!(!outputs_match("hello\n\nworld\n", "hello\nworld\n"));
    }

    #[test]
    fn different_content_fails() {
        assert!(!outputs_match("hello\nworld\n", "hello\nearth\n"));
    }

    #[test]
    fn extra_trailing_lines_fail() {
        assert!(!outputs_match("hello\n\n\n", "hello\n"));
    }

    #[test]
    fn empty_outputs() {
        assert!(outputs_match("", ""));
        assert!(!outputs_match("", "42\n"));
    }
}
