//! Path pattern matching.
//!
//! # Responsibilities
//! - Split patterns and request paths on `/`
//! - Compare literal segments exactly
//! - Bind `:name` segments to the request's segment value
//!
//! # Design Decisions
//! - Segment counts must be equal; no wildcards, no optional segments
//! - Splitting is on the literal `/` only, never on escape sequences
//! - No percent-decoding; both sides are compared as received
//! - Patterns are parsed once at registration, matching is allocation-free
//!   until a match is confirmed

use std::collections::HashMap;
use std::fmt;

use crate::routing::error::RouteError;

/// Bound path parameters, name to value.
pub type Params = HashMap<String, String>;

/// Segment separator.
pub const SEPARATOR: char = '/';

/// Prefix marking a named-parameter segment.
pub const PARAM_PREFIX: char = ':';

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed route pattern such as `/player/:id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a pattern.
    ///
    /// The pattern must start with `/`. Parameter names must be non-empty
    /// and unique within the pattern.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        if !raw.starts_with(SEPARATOR) {
            return Err(RouteError::invalid(raw, "pattern must start with '/'"));
        }

        let mut segments = Vec::new();
        for part in raw.split(SEPARATOR) {
            match part.strip_prefix(PARAM_PREFIX) {
                Some("") => {
                    return Err(RouteError::invalid(raw, "parameter segment without a name"));
                }
                Some(name) => {
                    let duplicate = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Param(existing) if existing == name));
                    if duplicate {
                        return Err(RouteError::invalid(
                            raw,
                            format!("parameter '{}' appears more than once", name),
                        ));
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(part.to_string())),
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// A pattern whose segments all compare literally, `:` included.
    ///
    /// Used for routes derived from file names.
    pub fn literal(raw: &str) -> Result<Self, RouteError> {
        if !raw.starts_with(SEPARATOR) {
            return Err(RouteError::invalid(raw, "pattern must start with '/'"));
        }
        Ok(Self {
            raw: raw.to_string(),
            segments: raw.split(SEPARATOR).map(|s| Segment::Literal(s.to_string())).collect(),
        })
    }

    /// The pattern as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of `/`-separated segments, including the leading empty one.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Names of the parameters this pattern binds, in path order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a request path, returning bound parameters on success.
    pub fn matches(&self, path: &str) -> Option<Params> {
        if path.split(SEPARATOR).count() != self.segments.len() {
            return None;
        }

        let literal_ok = self
            .segments
            .iter()
            .zip(path.split(SEPARATOR))
            .all(|(segment, actual)| match segment {
                Segment::Literal(expected) => expected == actual,
                Segment::Param(_) => true,
            });
        if !literal_ok {
            return None;
        }

        let params = self
            .segments
            .iter()
            .zip(path.split(SEPARATOR))
            .filter_map(|(segment, actual)| match segment {
                Segment::Param(name) => Some((name.clone(), actual.to_string())),
                Segment::Literal(_) => None,
            })
            .collect();
        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Match `path` against the pattern string `pattern` without registering it.
///
/// Returns `None` for a non-matching path or an invalid pattern.
pub fn match_path(pattern: &str, path: &str) -> Option<Params> {
    PathPattern::parse(pattern).ok()?.matches(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_match() {
        let params = match_path("/hello", "/hello").unwrap();
        assert!(params.is_empty());
        assert!(match_path("/hello", "/hell").is_none());
        assert!(match_path("/hello", "/Hello").is_none());
    }

    #[test]
    fn binds_named_parameters() {
        let params = match_path("/player/:id", "/player/54").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("54"));

        let params = match_path("/team/:team/player/:id", "/team/red/player/7").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["team"], "red");
        assert_eq!(params["id"], "7");
    }

    #[test]
    fn segment_count_must_be_equal() {
        assert!(match_path("/player/:id", "/player").is_none());
        assert!(match_path("/player/:id", "/player/54/stats").is_none());
        assert!(match_path("/hello", "/hello/").is_none());
        assert!(match_path("/", "/").is_some());
    }

    #[test]
    fn no_percent_decoding() {
        assert!(match_path("/a b", "/a%20b").is_none());
        let params = match_path("/file/:name", "/file/a%20b").unwrap();
        assert_eq!(params["name"], "a%20b");
    }

    #[test]
    fn backslash_is_not_a_separator() {
        assert!(match_path("/a/b", "/a\\b").is_none());
        let params = match_path("/:rest", "/a\\b").unwrap();
        assert_eq!(params["rest"], "a\\b");
    }

    #[test]
    fn rejects_invalid_patterns() {
        assert!(matches!(PathPattern::parse("hello"), Err(RouteError::InvalidPattern { .. })));
        assert!(matches!(PathPattern::parse("/a/:"), Err(RouteError::InvalidPattern { .. })));
        assert!(matches!(PathPattern::parse("/:id/:id"), Err(RouteError::InvalidPattern { .. })));
    }

    #[test]
    fn pattern_introspection() {
        let pattern = PathPattern::parse("/team/:team/player/:id").unwrap();
        assert_eq!(pattern.segment_count(), 5);
        assert_eq!(pattern.param_names().collect::<Vec<_>>(), vec!["team", "id"]);
        assert_eq!(pattern.to_string(), "/team/:team/player/:id");
    }

    #[test]
    fn literal_pattern_does_not_bind() {
        let pattern = PathPattern::literal("/:id/:id").unwrap();
        assert_eq!(pattern.param_names().count(), 0);
        assert!(pattern.matches("/:id/:id").unwrap().is_empty());
        assert_eq!(pattern.matches("/54/55"), None);
        assert!(PathPattern::literal("relative").is_err());
    }
}
