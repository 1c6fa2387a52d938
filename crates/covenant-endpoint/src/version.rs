//! # Version Resolution
//!
//! Which API version a request asks for is a transport concern: a header,
//! a query parameter, or some negotiation only the embedding application
//! understands. The finder never looks at the transport. It receives a
//! callback, and [`VersionSource`] is the configurable strategy that
//! callback delegates to.
//!
//! [`RequestContext`] is the transport-neutral view of a request that a
//! framework adapter builds once per request.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use covenant_core::Method;

use crate::endpoint::Endpoint;

/// Transport-neutral description of an inbound request.
///
/// Header names are case-insensitive. Query parameters and the parameter
/// map are kept exactly as the adapter supplies them.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    method: Method,
    path: String,
    headers: BTreeMap<String, String>,
    query: BTreeMap<String, String>,
    params: Map<String, Value>,
}

impl RequestContext {
    /// A request with no headers, query or parameters.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            params: Map::new(),
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Add a query parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Add a request parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Replace the parameter map.
    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// Request method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Request path, without query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Header value, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Query parameter value.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// The raw parameter map, as supplied by the adapter.
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }
}

/// Custom version negotiation callback.
pub type VersionFn = dyn Fn(&RequestContext, &Endpoint) -> Option<String> + Send + Sync;

/// Strategy for extracting the requested API version from a request.
#[derive(Clone, Default)]
pub enum VersionSource {
    /// No strategy configured; every request resolves to no version.
    #[default]
    Unconfigured,
    /// Every request uses this version.
    Fixed(String),
    /// Read the version from the named header.
    Header(String),
    /// Read the version from the named query parameter.
    Query(String),
    /// Caller-supplied negotiation.
    Custom(Arc<VersionFn>),
}

impl VersionSource {
    /// Wrap a closure as a custom strategy.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&RequestContext, &Endpoint) -> Option<String> + Send + Sync + 'static,
    {
        VersionSource::Custom(Arc::new(f))
    }

    /// The version `context` asks for when addressed to `endpoint`.
    pub fn resolve(&self, context: &RequestContext, endpoint: &Endpoint) -> Option<String> {
        match self {
            VersionSource::Unconfigured => {
                tracing::debug!(
                    endpoint = endpoint.name(),
                    "no API version source configured"
                );
                None
            }
            VersionSource::Fixed(version) => Some(version.clone()),
            VersionSource::Header(name) => context.header(name).map(str::to_string),
            VersionSource::Query(name) => context.query(name).map(str::to_string),
            VersionSource::Custom(f) => f(context, endpoint),
        }
    }
}

impl fmt::Debug for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSource::Unconfigured => f.write_str("Unconfigured"),
            VersionSource::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            VersionSource::Header(h) => f.debug_tuple("Header").field(h).finish(),
            VersionSource::Query(q) => f.debug_tuple("Query").field(q).finish(),
            VersionSource::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
