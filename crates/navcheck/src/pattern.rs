//! Expected-location patterns
//!
//! Patterns are written the way they appear in browser test suites, either as
//! a JavaScript regex literal (`/.*settings/`, `/.*Library/i`) or as a bare
//! regular expression (`.*settings`). Matching searches anywhere in the
//! location, so `/.*settings/` matches `http://localhost:1420/settings`.

use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{NavError, NavResult};

#[derive(Debug, Clone)]
pub struct UrlPattern {
    source: String,
    regex: Regex,
}

impl UrlPattern {
    /// Parse a pattern from its source text
    pub fn parse(source: &str) -> NavResult<Self> {
        let source = source.trim();
        let (body, flags) = split_literal(source).unwrap_or((source, ""));

        let regex = RegexBuilder::new(body)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .build()
            .map_err(|e| NavError::InvalidPattern {
                pattern: source.to_string(),
                source: e,
            })?;

        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, location: &str) -> bool {
        self.regex.is_match(location)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Split `/body/flags` into its parts when `source` is a regex literal
fn split_literal(source: &str) -> Option<(&str, &str)> {
    let rest = source.strip_prefix('/')?;
    let close = rest.rfind('/')?;
    let (body, flags) = (&rest[..close], &rest[close + 1..]);
    if body.is_empty() || !flags.chars().all(|c| "gimsuy".contains(c)) {
        return None;
    }
    Some((body, flags))
}

impl PartialEq for UrlPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for UrlPattern {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for UrlPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for UrlPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::parse(&source).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("/.*settings/", "http://127.0.0.1:1420/settings", true ; "literal matches route")]
    #[test_case("/.*settings/", "http://127.0.0.1:1420/library", false ; "literal rejects other route")]
    #[test_case(".*playlists", "http://127.0.0.1:1420/playlists", true ; "bare regex")]
    #[test_case("/.*GENERATOR/i", "http://127.0.0.1:1420/generator", true ; "case insensitive flag")]
    #[test_case("/settings", "http://127.0.0.1:1420/settings", true ; "plain path is a bare regex")]
    #[test_case("/library$/", "http://127.0.0.1:1420/library?tab=2", false ; "anchors are honored")]
    fn test_matching(pattern: &str, location: &str, expected: bool) {
        let pattern = UrlPattern::parse(pattern).unwrap();
        assert_eq!(pattern.is_match(location), expected);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = UrlPattern::parse("/(unclosed/").unwrap_err();
        assert!(matches!(err, NavError::InvalidPattern { .. }));
    }

    #[test]
    fn test_serde_keeps_source() {
        let pattern: UrlPattern = serde_yaml::from_str("/.*library/").unwrap();
        assert_eq!(pattern.as_str(), "/.*library/");
        assert_eq!(serde_json::to_string(&pattern).unwrap(), r#""/.*library/""#);
    }
}
