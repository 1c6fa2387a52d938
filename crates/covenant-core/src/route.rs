//! # Route Patterns
//!
//! A route pattern is a slash-separated path in which segments starting
//! with `:` are named wildcards, e.g. `/users/:user_id/projects`.
//!
//! ## Matching Rules
//!
//! - Matching is segment-by-segment and exact: the path must have the same
//!   number of segments as the pattern. There is no prefix matching.
//! - Literal segments compare byte-for-byte (case-sensitive).
//! - A named segment matches any non-empty segment and captures its value.
//! - A trailing slash is a segment of its own, so `/users` and `/users/`
//!   are different paths.
//!
//! ```
//! use covenant_core::RoutePattern;
//!
//! let route = RoutePattern::parse("/users/:user_id/projects").unwrap();
//! let params = route.matches("/users/42/projects").unwrap();
//! assert_eq!(params.get("user_id").map(String::as_str), Some("42"));
//! assert!(route.matches("/users/42").is_none());
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::ConfigurationError;

/// Values captured by the named segments of a matched route.
pub type PathParams = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled route pattern.
///
/// The only constructor is [`RoutePattern::parse`]; the segment list is
/// private so a pattern can never disagree with its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Compile a route pattern.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidRoute` if the pattern does not
    /// start with `/`, contains an unnamed `:` segment, or names the same
    /// parameter twice.
    pub fn parse(route: &str) -> Result<Self, ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidRoute {
            route: route.to_string(),
            reason: reason.to_string(),
        };

        let rest = route
            .strip_prefix('/')
            .ok_or_else(|| invalid("route must start with '/'"))?;

        let mut seen = BTreeSet::new();
        let mut segments = Vec::new();
        for raw in split_segments(rest) {
            match raw.strip_prefix(':') {
                Some("") => return Err(invalid("named segment ':' has no name")),
                Some(name) => {
                    if !seen.insert(name) {
                        return Err(invalid(&format!("parameter ':{name}' appears more than once")));
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(raw.to_string())),
            }
        }

        Ok(Self {
            raw: route.to_string(),
            segments,
        })
    }

    /// The pattern as written in the definition.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Names of the wildcard segments, in path order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a concrete request path, returning the captured parameters.
    ///
    /// Returns `None` when the path does not match.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let rest = path.strip_prefix('/')?;
        let mut params = PathParams::new();
        let mut parts = split_segments(rest);

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(_) if part.is_empty() => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }

    /// Whether some concrete path could be matched by both patterns.
    ///
    /// Two patterns overlap when they have the same number of segments and
    /// every segment pair is compatible (equal literals, or at least one
    /// wildcard facing a non-empty literal).
    pub fn overlaps(&self, other: &RoutePattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Param(_), Segment::Literal(lit))
                    | (Segment::Literal(lit), Segment::Param(_)) => !lit.is_empty(),
                    (Segment::Param(_), Segment::Param(_)) => true,
                })
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split the part of a path after its leading `/`. The root path has no
/// segments at all.
fn split_segments(rest: &str) -> impl Iterator<Item = &str> {
    let mut iter = rest.split('/');
    if rest.is_empty() {
        iter.next();
    }
    iter
}
