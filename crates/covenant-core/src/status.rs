//! # Status Code Matchers
//!
//! Response definitions may be restricted to particular HTTP status codes.
//! Patterns are either exact codes (`"404"`) or classes (`"2xx"`). A
//! definition without a status code list governs every status.

use std::fmt;

use crate::error::ConfigurationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusPattern {
    Exact(u16),
    Class(u16),
}

impl StatusPattern {
    fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        let invalid = || ConfigurationError::InvalidStatusCode(raw.to_string());
        let bytes = raw.as_bytes();
        if bytes.len() != 3 || !(b'1'..=b'5').contains(&bytes[0]) {
            return Err(invalid());
        }
        let class = u16::from(bytes[0] - b'0');
        if raw[1..].eq_ignore_ascii_case("xx") {
            return Ok(StatusPattern::Class(class));
        }
        raw.parse::<u16>()
            .map(StatusPattern::Exact)
            .map_err(|_| invalid())
    }

    fn matches(&self, code: u16) -> bool {
        match *self {
            StatusPattern::Exact(c) => c == code,
            StatusPattern::Class(class) => code / 100 == class,
        }
    }

    fn intersects(&self, other: &StatusPattern) -> bool {
        match (*self, *other) {
            (StatusPattern::Exact(a), StatusPattern::Exact(b)) => a == b,
            (StatusPattern::Class(a), StatusPattern::Class(b)) => a == b,
            (StatusPattern::Class(class), StatusPattern::Exact(code))
            | (StatusPattern::Exact(code), StatusPattern::Class(class)) => code / 100 == class,
        }
    }
}

impl fmt::Display for StatusPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusPattern::Exact(code) => write!(f, "{code}"),
            StatusPattern::Class(class) => write!(f, "{class}xx"),
        }
    }
}

/// The set of response status codes a definition applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusCodes {
    /// `None` means "every status code".
    patterns: Option<Vec<StatusPattern>>,
}

impl StatusCodes {
    /// A matcher that accepts every status code.
    pub fn any() -> Self {
        Self::default()
    }

    /// Compile a list of status code patterns.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidStatusCode` for anything other
    /// than a three-digit code or an `Nxx` class in the 1xx–5xx range.
    pub fn parse<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigurationError> {
        let patterns = patterns
            .iter()
            .map(|p| StatusPattern::parse(p.as_ref().trim()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns: Some(patterns),
        })
    }

    /// Whether this matcher accepts every code.
    pub fn is_any(&self) -> bool {
        self.patterns.is_none()
    }

    /// Whether a message with the given status is governed by this matcher.
    ///
    /// Requests carry no status (`None`) and are accepted by every matcher.
    pub fn matches(&self, status: Option<u16>) -> bool {
        match (&self.patterns, status) {
            (None, _) | (_, None) => true,
            (Some(patterns), Some(code)) => patterns.iter().any(|p| p.matches(code)),
        }
    }

    /// Whether some status code is accepted by both matchers.
    pub fn intersects(&self, other: &StatusCodes) -> bool {
        match (&self.patterns, &other.patterns) {
            (None, _) | (_, None) => true,
            (Some(a), Some(b)) => a.iter().any(|p| b.iter().any(|q| p.intersects(q))),
        }
    }
}

impl fmt::Display for StatusCodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.patterns {
            None => f.write_str("any"),
            Some(patterns) => {
                for (i, p) in patterns.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{p}")?;
                }
                Ok(())
            }
        }
    }
}
