//! # Contract Errors
//!
//! Request-time failures raised by the default pluggable handlers. Each
//! variant maps to a distinct transport response in an adapter (406-style
//! for an unavailable version, 422-style for invalid parameters). A
//! request no contract governs is not an error at all.

use std::collections::BTreeSet;

use thiserror::Error;

use covenant_schema::ValidationError;

/// A request violated its contract.
#[derive(Error, Debug, Clone)]
pub enum ContractError {
    /// The endpoint is known but does not offer the requested version.
    #[error(
        "API version {} is unavailable; available versions: {}",
        .requested.as_deref().unwrap_or("(none)"),
        join(.available)
    )]
    VersionUnavailable {
        /// The version the request asked for, if one was determined.
        requested: Option<String>,
        /// Every version the endpoint declares for the direction.
        available: BTreeSet<String>,
    },

    /// The parameters do not satisfy the resolved schema.
    #[error("invalid request parameters: {0}")]
    InvalidParams(#[from] ValidationError),
}

fn join(versions: &BTreeSet<String>) -> String {
    if versions.is_empty() {
        return "(none)".to_string();
    }
    versions
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
