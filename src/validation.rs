//! Structural validation of raw access-log lines

use regex::Regex;

/// Validates that a line matches the combined-log shape the models were
/// trained on: three tokens, a bracketed timestamp, a quoted request line
/// and a numeric status code, anchored at the start of the line.
#[derive(Debug, Clone)]
pub struct LogValidator {
    pattern: Regex,
}

impl LogValidator {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r#"^\S+ \S+ \S+ \[[^\]]+\] "\w+ .+ HTTP/\d\.\d" \d+"#)
                .expect("log pattern is a valid regex"),
        }
    }

    /// Returns true iff the line has the expected structure. Never panics,
    /// empty input is simply invalid.
    pub fn is_valid(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}

impl Default for LogValidator {
    fn default() -> Self {
        Self::new()
    }
}
