//! Path template matching.
//!
//! # Responsibilities
//! - Compile a path template (`/pets/{id}`) into an anchored pattern
//! - Match a concrete request path and return the captured values
//! - Record placeholder names in the order they occur in the template
//!
//! # Design Decisions
//! - Matching is pure: captures are returned by value, never stored
//! - Anchored at both ends, no trailing-slash normalization
//! - Placeholder values are limited to `[A-Za-z0-9_-]`
//! - Literal segments are escaped and matched exactly (case-sensitive)

use regex::Regex;
use std::sync::LazyLock;

use crate::routing::RouteError;

/// Recognizes `{name}` placeholders inside a raw template.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z0-9_-]+)\}").expect("placeholder pattern is valid")
});

/// Capture expression substituted for every placeholder.
const CAPTURE: &str = "([A-Za-z0-9_-]+)";

/// Compiled form of a path template.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    template: String,
    pattern: Regex,
    placeholders: Vec<String>,
}

impl PathMatcher {
    /// Compile a template into an anchored matcher.
    ///
    /// Braces that do not enclose a valid placeholder name are kept as
    /// literal text.
    pub fn compile(template: &str) -> Result<Self, RouteError> {
        let mut pattern = String::with_capacity(template.len() + 16);
        let mut placeholders: Vec<String> = Vec::new();
        let mut last = 0;

        pattern.push('^');
        for caps in PLACEHOLDER.captures_iter(template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = name.as_str();

            if placeholders.iter().any(|p| p == name) {
                return Err(RouteError::DuplicatePlaceholder {
                    template: template.to_string(),
                    name: name.to_string(),
                });
            }

            pattern.push_str(&regex::escape(&template[last..whole.start()]));
            pattern.push_str(CAPTURE);
            placeholders.push(name.to_string());
            last = whole.end();
        }
        pattern.push_str(&regex::escape(&template[last..]));
        pattern.push('$');

        let pattern = Regex::new(&pattern).map_err(|e| RouteError::Pattern {
            template: template.to_string(),
            source: e,
        })?;

        Ok(Self {
            template: template.to_string(),
            pattern,
            placeholders,
        })
    }

    /// Match a request path, returning the captures in template order.
    pub fn match_path(&self, path: &str) -> Option<MatchContext> {
        let caps = self.pattern.captures(path)?;
        let captures = caps
            .iter()
            .skip(1)
            .map(|c| c.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect();

        Some(MatchContext { captures })
    }

    /// Placeholder names in template occurrence order.
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Position of a placeholder within the template.
    pub fn placeholder_index(&self, name: &str) -> Option<usize> {
        self.placeholders.iter().position(|p| p == name)
    }

    /// The original template string.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Number of capture groups in the compiled pattern.
    pub fn capture_count(&self) -> usize {
        self.pattern.captures_len() - 1
    }
}

/// Per-request captures produced by a successful match.
///
/// Values are keyed by placeholder position, not by parameter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchContext {
    captures: Vec<String>,
}

impl MatchContext {
    /// Captured value at the given placeholder position.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.captures.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    pub fn captures(&self) -> &[String] {
        &self.captures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_placeholder() {
        let matcher = PathMatcher::compile("/pets/{id}").unwrap();

        let ctx = matcher.match_path("/pets/42").unwrap();
        assert_eq!(ctx.captures(), &["42".to_string()]);

        assert!(matcher.match_path("/pets/42/extra").is_none());
        assert!(matcher.match_path("/pets/").is_none());
        assert!(matcher.match_path("/pets/42/").is_none());
        assert!(matcher.match_path("/api/pets/42").is_none());
    }

    #[test]
    fn test_placeholder_order() {
        let matcher = PathMatcher::compile("/a/{x}/{y}").unwrap();
        assert_eq!(matcher.placeholders(), &["x".to_string(), "y".to_string()]);
        assert_eq!(matcher.placeholder_index("y"), Some(1));
        assert_eq!(matcher.capture_count(), matcher.placeholders().len());

        let ctx = matcher.match_path("/a/1/2").unwrap();
        assert_eq!(ctx.get(0), Some("1"));
        assert_eq!(ctx.get(1), Some("2"));
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_restricted_character_class() {
        let matcher = PathMatcher::compile("/files/{name}").unwrap();
        assert!(matcher.match_path("/files/report_2024-v2").is_some());
        assert!(matcher.match_path("/files/report.pdf").is_none());
        assert!(matcher.match_path("/files/a%20b").is_none());
    }

    #[test]
    fn test_literals_are_escaped() {
        let matcher = PathMatcher::compile("/v1.0/items/{id}").unwrap();
        assert!(matcher.match_path("/v1.0/items/7").is_some());
        assert!(matcher.match_path("/v1x0/items/7").is_none());
    }

    #[test]
    fn test_static_template() {
        let matcher = PathMatcher::compile("/health").unwrap();
        let ctx = matcher.match_path("/health").unwrap();
        assert!(ctx.is_empty());
        assert_eq!(matcher.capture_count(), 0);
        assert!(matcher.match_path("/healthz").is_none());
    }

    #[test]
    fn test_stray_braces_are_literal() {
        let matcher = PathMatcher::compile("/odd/{not valid}").unwrap();
        assert!(matcher.placeholders().is_empty());
        assert!(matcher.match_path("/odd/{not valid}").is_some());
    }

    #[test]
    fn test_duplicate_placeholder_rejected() {
        let err = PathMatcher::compile("/a/{id}/b/{id}").unwrap_err();
        assert!(matches!(err, RouteError::DuplicatePlaceholder { .. }));
    }
}
