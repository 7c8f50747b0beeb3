//! Content zones: start/stop headline pairs bounding one scan region.

use crate::error::{Result, ScanError};
use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone)]
pub struct ContentPattern {
    start: Regex,
    stop: Regex,
}

impl ContentPattern {
    /// Build a zone from two case-insensitive patterns.
    pub fn new(start: &str, stop: &str) -> Result<Self> {
        Ok(Self {
            start: compile(start)?,
            stop: compile(stop)?,
        })
    }

    pub fn is_start(&self, line: &str) -> bool {
        self.start.is_match(line)
    }

    pub fn is_stop(&self, line: &str) -> bool {
        self.stop.is_match(line)
    }

    pub fn start_pattern(&self) -> &str {
        self.start.as_str()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ScanError::Pattern {
            pattern: pattern.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_numbered_and_plain_headlines() {
        let zone = ContentPattern::new(r"^(\d+\.\s+)?Callbacks$", r"^(\d+\.\s+)?Variables$").unwrap();
        assert!(zone.is_start("1. Callbacks"));
        assert!(zone.is_start("CALLBACKS"));
        assert!(!zone.is_start("1. Callbacks ........ 5"));
        assert!(zone.is_stop("2. Variables"));
        assert!(!zone.is_stop("User Variables"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = ContentPattern::new("(", "x").unwrap_err();
        assert!(matches!(err, ScanError::Pattern { .. }));
    }
}
