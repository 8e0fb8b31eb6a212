//! Wildcard pattern compilation.
//!
//! Config patterns are plain strings where `*` stands for one or more
//! non-separator characters; everything else matches literally. A compiled
//! rule is anchored against the whole path relative to the scan root, so
//! `modules/*.adoc` matches `modules/intro.adoc` but neither
//! `modules/sub/intro.adoc` nor `other/modules/intro.adoc`.

use regex::Regex;
use tracing::debug;

use crate::error::ConfigError;

/// One compiled pattern for a single category, evaluated in configured order.
#[derive(Debug, Clone)]
pub struct GlobRule {
    pattern: String,
    matcher: Regex,
}

impl GlobRule {
    /// Compiles a configured wildcard string into an anchored matching rule.
    pub fn compile(pattern: &str) -> Result<Self, ConfigError> {
        let mut translated = String::with_capacity(pattern.len() + 8);
        translated.push('^');
        for ch in pattern.chars() {
            if ch == '*' {
                translated.push_str("[^/]+");
            } else {
                translated.push_str(&regex::escape(ch.encode_utf8(&mut [0; 4])));
            }
        }
        translated.push('$');

        let matcher = Regex::new(&translated).map_err(|source| ConfigError::BadPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        debug!(pattern, regex = %translated, "compiled wildcard pattern");
        Ok(GlobRule {
            pattern: pattern.to_string(),
            matcher,
        })
    }

    /// Tests a `/`-separated path relative to the scan root.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Compiles a category's pattern list, preserving configured order.
pub fn compile_all(patterns: &[String]) -> Result<Vec<GlobRule>, ConfigError> {
    patterns.iter().map(|p| GlobRule::compile(p)).collect()
}
