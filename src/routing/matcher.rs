//! Path pattern matching.
//!
//! # Design Decisions
//! - A pattern ending in `/*` or `/**` matches its literal prefix and everything below it
//! - Any other pattern matches exactly
//! - Matching is case-sensitive and segment-aligned: `/reviews/*` never matches `/reviewsx`
//! - Specificity is the literal prefix length; exact patterns beat wildcards of equal length

/// A compiled route path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    literal: String,
    wildcard: bool,
}

impl PathPattern {
    /// Compile a pattern such as `/reservations/*`.
    pub fn parse(pattern: &str) -> Self {
        let (literal, wildcard) = match pattern
            .strip_suffix("/**")
            .or_else(|| pattern.strip_suffix("/*"))
        {
            Some(prefix) => (prefix, true),
            None => (pattern, false),
        };
        Self {
            literal: normalize_path(literal).to_string(),
            wildcard,
        }
    }

    /// The literal (non-wildcard) part of the pattern.
    pub fn literal(&self) -> &str {
        &self.literal
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Returns true if `path` (already normalized) is covered by this pattern.
    pub fn matches(&self, path: &str) -> bool {
        if path == self.literal {
            return true;
        }
        if !self.wildcard {
            return false;
        }
        // A root wildcard ("/*") covers every path.
        if self.literal.is_empty() {
            return path.starts_with('/');
        }
        path.strip_prefix(self.literal.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Ordering key: longer literal first, exact before wildcard.
    pub fn specificity(&self) -> (usize, bool) {
        (self.literal.len(), !self.wildcard)
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.wildcard {
            write!(f, "{}/*", self.literal)
        } else {
            write!(f, "{}", self.literal)
        }
    }
}

/// Strip a single trailing slash (except for the root path).
pub fn normalize_path(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    }
}

/// Encoded forms a backend may decode into `.`, `/` or a backslash.
const AMBIGUOUS_ENCODINGS: &[&str] = &["%2e", "%2f", "%5c"];

/// Returns true if `path` means the same resource to the gateway and to a backend.
///
/// Rejects dot segments, empty segments (`//`), backslashes and percent-encoded
/// dots, slashes or backslashes. A single trailing slash is allowed.
pub fn is_canonical_path(path: &str) -> bool {
    if !path.starts_with('/') || path.contains('\\') {
        return false;
    }
    let lower = path.to_ascii_lowercase();
    if AMBIGUOUS_ENCODINGS.iter().any(|enc| lower.contains(enc)) {
        return false;
    }
    let trimmed = normalize_path(path);
    trimmed == "/"
        || trimmed[1..]
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}
