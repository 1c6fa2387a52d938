//! # Error Types — Setup-Time Failures
//!
//! `ConfigurationError` covers everything that can go wrong while a
//! configuration is being assembled: unparseable route patterns, unknown
//! verbs, malformed schema documents, and (under the strict ambiguity
//! policy) overlapping registrations.
//!
//! ## Design
//!
//! - Configuration errors are fatal. They surface from
//!   `ConfigurationBuilder::build()` and never at request time.
//! - Request-time outcomes (no definition, version unavailable, invalid
//!   parameters) are not configuration errors and live in
//!   `covenant-endpoint`.

use thiserror::Error;

/// Error raised while building a configuration or loading definitions.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// A route pattern could not be compiled.
    #[error("invalid route '{route}': {reason}")]
    InvalidRoute {
        /// The route pattern as written.
        route: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An HTTP method name is not one of the supported verbs.
    #[error("unsupported HTTP method '{0}'")]
    InvalidMethod(String),

    /// A message direction is neither `request` nor `response`.
    #[error("unsupported message direction '{0}'")]
    InvalidDirection(String),

    /// A status code pattern is neither a code (`404`) nor a class (`4xx`).
    #[error("invalid status code pattern '{0}'")]
    InvalidStatusCode(String),

    /// An endpoint declares no versioned definitions.
    #[error("endpoint '{endpoint}' declares no definitions")]
    EmptyDefinitions {
        /// Endpoint name.
        endpoint: String,
    },

    /// A versioned definition declares no versions.
    #[error("endpoint '{endpoint}' has a {direction} definition with no versions")]
    EmptyVersions {
        /// Endpoint name.
        endpoint: String,
        /// Direction of the offending definition.
        direction: String,
    },

    /// A schema document could not be compiled into a validator.
    #[error("malformed schema in endpoint '{endpoint}' (versions {versions}): {reason}")]
    MalformedSchema {
        /// Endpoint name.
        endpoint: String,
        /// Comma-separated versions of the offending definition.
        versions: String,
        /// Reason reported by the schema compiler.
        reason: String,
    },

    /// A request schema closed to undeclared properties does not declare a
    /// named route segment, so every matching request would fail.
    #[error(
        "endpoint '{endpoint}' (versions {versions}) has a closed request schema \
         that does not declare route parameter '{param}'"
    )]
    UndeclaredPathParam {
        /// Endpoint name.
        endpoint: String,
        /// Comma-separated versions of the offending definition.
        versions: String,
        /// The route parameter missing from `properties`.
        param: String,
    },

    /// Two definitions of one endpoint claim the same version.
    #[error("endpoint '{endpoint}' declares {direction} version '{version}' more than once")]
    AmbiguousVersion {
        /// Endpoint name.
        endpoint: String,
        /// Direction both definitions describe.
        direction: String,
        /// The version claimed twice.
        version: String,
    },

    /// Two endpoints can match the same concrete request.
    #[error("routes '{first}' and '{second}' overlap for {method} {direction}")]
    OverlappingRoutes {
        /// Route registered first (the one that wins).
        first: String,
        /// Route registered later (never reached for overlapping paths).
        second: String,
        /// Shared method.
        method: String,
        /// Shared direction.
        direction: String,
    },

    /// A definition document could not be read or parsed.
    #[error("definition load error for '{source_name}': {reason}")]
    DocumentLoad {
        /// File path or other identifier of the document source.
        source_name: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// IO error reading a definition file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
