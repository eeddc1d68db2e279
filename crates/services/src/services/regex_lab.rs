//! Server-side regex evaluation for the pattern lab.
//!
//! Patterns run on the native `regex` engine. Invalid patterns are
//! reported back with the engine's error text rather than failing the
//! request.

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Flags the lab exposes. `global` off means first match only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct RegexFlags {
    #[serde(default)]
    pub ignore_case: bool,
    #[serde(default)]
    pub multiline: bool,
    #[serde(default)]
    pub global: bool,
}

/// One match, with byte offsets into the tested text and the text captured
/// by each numbered group (None for groups that did not participate).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct RegexMatch {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub groups: Vec<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct RegexTestReport {
    pub valid: bool,
    pub error: Option<String>,
    pub matches: Vec<RegexMatch>,
}

/// Evaluate a pattern against the given text.
pub fn test_pattern(pattern: &str, text: &str, flags: &RegexFlags) -> RegexTestReport {
    let regex = match RegexBuilder::new(pattern)
        .case_insensitive(flags.ignore_case)
        .multi_line(flags.multiline)
        .build()
    {
        Ok(regex) => regex,
        Err(e) => {
            return RegexTestReport {
                valid: false,
                error: Some(e.to_string()),
                matches: Vec::new(),
            };
        }
    };

    let mut matches = Vec::new();
    for captures in regex.captures_iter(text) {
        let overall = captures.get(0).expect("group 0 always participates");
        matches.push(RegexMatch {
            text: overall.as_str().to_string(),
            start: overall.start(),
            end: overall.end(),
            groups: captures
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect(),
        });
        if !flags.global {
            break;
        }
    }

    RegexTestReport {
        valid: true,
        error: None,
        matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(ignore_case: bool, multiline: bool, global: bool) -> RegexFlags {
        RegexFlags {
            ignore_case,
            multiline,
            global,
        }
    }

    #[test]
    fn finds_all_matches_when_global() {
        let report = test_pattern(r"\d+", "a1 b22 c333", &flags(false, false, true));
        assert!(report.valid);
        let texts: Vec<_> = report.matches.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["1", "22", "333"]);
        assert_eq!(report.matches[1].start, 4);
        assert_eq!(report.matches[1].end, 6);
    }

    #[test]
    fn first_match_only_when_global_off() {
        let report = test_pattern(r"\d+", "a1 b22 c333", &flags(false, false, false));
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].text, "1");
    }

    #[test]
    fn ignore_case_flag() {
        let report = test_pattern("rust", "Rust RUST rust", &flags(true, false, true));
        assert_eq!(report.matches.len(), 3);

        let report = test_pattern("rust", "Rust RUST rust", &flags(false, false, true));
        assert_eq!(report.matches.len(), 1);
    }

    #[test]
    fn multiline_flag_anchors_per_line() {
        let report = test_pattern("^b$", "a\nb\nc", &flags(false, true, true));
        assert_eq!(report.matches.len(), 1);

        let report = test_pattern("^b$", "a\nb\nc", &flags(false, false, true));
        assert!(report.matches.is_empty());
    }

    #[test]
    fn capture_groups_returned_per_match() {
        let report = test_pattern(
            r"(\w+)@(\w+)\.com",
            "dev@example.com ops@acme.com",
            &flags(false, false, true),
        );
        assert_eq!(report.matches.len(), 2);
        assert_eq!(
            report.matches[0].groups,
            vec![Some("dev".to_string()), Some("example".to_string())]
        );
    }

    #[test]
    fn optional_group_reports_none() {
        let report = test_pattern(r"a(b)?c", "ac", &flags(false, false, true));
        assert_eq!(report.matches[0].groups, vec![None]);
    }

    #[test]
    fn invalid_pattern_reports_error() {
        let report = test_pattern("(unclosed", "whatever", &flags(false, false, true));
        assert!(!report.valid);
        assert!(report.error.is_some());
        assert!(report.matches.is_empty());
    }
}
