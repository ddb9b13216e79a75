//! Whitespace normalization before display and speech
//!
//! Makes text easier to follow on screen and keeps word offsets from the
//! segmenter close to the displayed text: after this pass every word is
//! separated by exactly one space or one line break (blank lines aside).

use once_cell::sync::Lazy;
use regex::Regex;

/// Any run of whitespace that is not a line break
static INLINE_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\S\n]+").expect("valid inline space pattern"));

/// Spaces hugging a line break
static EDGE_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^ | $").expect("valid edge space pattern"));

/// Three or more line breaks
static BLANK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank run pattern"));

/// Normalize raw text for reading
pub fn preprocess(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let single = INLINE_SPACE.replace_all(&unified, " ");
    let trimmed = EDGE_SPACE.replace_all(&single, "");
    let paragraphs = BLANK_RUN.replace_all(&trimmed, "\n\n");
    paragraphs.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_spaces() {
        assert_eq!(preprocess("a   b\t\tc"), "a b c");
    }

    #[test]
    fn test_line_endings() {
        assert_eq!(preprocess("one\r\ntwo\rthree"), "one\ntwo\nthree");
    }

    #[test]
    fn test_trim_lines() {
        assert_eq!(preprocess("  one  \n   two "), "one\ntwo");
    }

    #[test]
    fn test_blank_runs() {
        assert_eq!(preprocess("one\n\n\n\n\ntwo"), "one\n\ntwo");
        assert_eq!(preprocess("one\n \n \n two"), "one\n\ntwo");
    }

    #[test]
    fn test_whitespace_only() {
        assert_eq!(preprocess(" \t\r\n "), "");
    }

    #[test]
    fn test_keeps_punctuation_and_case() {
        assert_eq!(preprocess("Hello, World!"), "Hello, World!");
    }
}
