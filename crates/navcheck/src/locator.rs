//! Anchor locators

use std::fmt;

use serde::{Deserialize, Serialize};

/// Locates an anchor whose `href` attribute equals a path exactly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator {
    href: String,
}

impl Locator {
    pub fn href(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }

    pub fn href_value(&self) -> &str {
        &self.href
    }

    /// CSS selector for the anchor, e.g. `a[href="/settings"]`
    pub fn selector(&self) -> String {
        let mut escaped = String::with_capacity(self.href.len());
        for c in self.href.chars() {
            if c == '"' || c == '\\' {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        format!(r#"a[href="{}"]"#, escaped)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.selector())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_exact_href() {
        assert_eq!(Locator::href("/settings").selector(), r#"a[href="/settings"]"#);
    }

    #[test]
    fn test_selector_escapes_quotes() {
        let locator = Locator::href(r#"/search?q="x""#);
        assert_eq!(locator.selector(), r#"a[href="/search?q=\"x\""]"#);
    }
}
