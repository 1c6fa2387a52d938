//! # Message Direction
//!
//! Whether a payload is sent by the client (`request`) or returned by the
//! service (`response`). Definition documents spell this as `message_type`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Direction of the message a versioned definition describes.
///
/// Definition documents default to `response` when `message_type` is
/// omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Payload sent by the client.
    Request,
    /// Payload returned by the service.
    #[default]
    Response,
}

impl Direction {
    /// The canonical lowercase name used in definition documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Request => "request",
            Direction::Response => "response",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "request" => Ok(Direction::Request),
            "response" => Ok(Direction::Response),
            _ => Err(ConfigurationError::InvalidDirection(s.to_string())),
        }
    }
}
