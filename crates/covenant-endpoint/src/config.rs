//! # Configuration
//!
//! The process-wide contract registry: every endpoint definition plus the
//! pluggable strategies that decide how versions are extracted and how
//! failures are answered.
//!
//! ## Immutability
//!
//! A [`Configuration`] has no setters. It is produced by
//! [`ConfigurationBuilder::build`], and customizing one means
//! [`Configuration::customized_duplicate`]: the configuration is copied
//! into a builder, the setup closure mutates the builder, and a new
//! configuration is built. The original, and every earlier duplicate, is
//! untouched. Concurrent requests therefore share a configuration without
//! locking.
//!
//! ```
//! use covenant_core::Method;
//! use covenant_endpoint::{Configuration, EndpointDocument, Outcome, RequestContext, VersionSource};
//!
//! let doc = EndpointDocument::from_yaml_str(r#"
//! name: ping
//! route: /ping
//! method: GET
//! definitions:
//!   - versions: ["1.0"]
//!     message_type: request
//!     schema: { type: object }
//! "#, "inline").unwrap();
//!
//! let config = Configuration::default()
//!     .customized_duplicate(|c| {
//!         c.endpoint(doc).api_version(VersionSource::Fixed("1.0".into()));
//!     })
//!     .unwrap();
//!
//! let ctx = RequestContext::new(Method::Get, "/ping");
//! assert!(matches!(config.evaluate_request(&ctx), Outcome::Valid(_)));
//! ```

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use covenant_core::{ConfigurationError, Direction, Method};
use covenant_schema::params::{coerce_params, strip_meta_params};
use covenant_schema::{SchemaCompiler, ValidationError};

use crate::document::EndpointDocument;
use crate::endpoint::Endpoint;
use crate::error::ContractError;
use crate::finder::{DefinitionMatch, EndpointSet, Resolution};
use crate::version::{RequestContext, VersionSource};

/// Decides the response to parameters that failed validation.
///
/// `Ok(())` lets the request proceed with its unvalidated parameters.
pub type InvalidParamsHandler =
    Arc<dyn Fn(&RequestContext, &ValidationError) -> Result<(), ContractError> + Send + Sync>;

/// Decides the response to a request for a version the endpoint lacks.
///
/// `Ok(())` lets the request proceed without a contract.
pub type VersionUnavailableHandler = Arc<
    dyn Fn(&RequestContext, Option<&str>, &BTreeSet<String>) -> Result<(), ContractError>
        + Send
        + Sync,
>;

/// Whether a request should be validated.
pub type RequestPredicate = Arc<dyn Fn(&RequestContext) -> bool + Send + Sync>;

/// Whether a response with the given status should be validated.
pub type ResponsePredicate = Arc<dyn Fn(&RequestContext, u16) -> bool + Send + Sync>;

/// What to do when registrations overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbiguityPolicy {
    /// Keep the registrations; the earliest one wins. Each overlap is
    /// logged as a warning when the configuration is built.
    #[default]
    FirstMatchWins,
    /// Refuse to build a configuration with overlapping registrations.
    Reject,
}

/// Terminal state of a message's trip through the contract layer.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The validation predicate excluded the message.
    Skipped,
    /// No endpoint governs the message.
    NotFound,
    /// The endpoint does not offer the requested version.
    VersionUnavailable {
        /// The version the request asked for, if one was determined.
        requested: Option<String>,
        /// Every version the endpoint declares for the direction.
        available: BTreeSet<String>,
    },
    /// The message satisfied its schema. Carries the payload as validated
    /// (for requests: after meta stripping, path parameter merging and
    /// coercion).
    Valid(Value),
    /// The message violated its schema.
    Invalid(ValidationError),
}

fn default_invalid_params(
    _context: &RequestContext,
    error: &ValidationError,
) -> Result<(), ContractError> {
    Err(ContractError::InvalidParams(error.clone()))
}

fn default_version_unavailable(
    _context: &RequestContext,
    requested: Option<&str>,
    available: &BTreeSet<String>,
) -> Result<(), ContractError> {
    Err(ContractError::VersionUnavailable {
        requested: requested.map(str::to_string),
        available: available.clone(),
    })
}

/// Everything but the endpoints; shared verbatim between a configuration
/// and the builders duplicated from it.
#[derive(Clone)]
struct Settings {
    compiler: SchemaCompiler,
    version_source: VersionSource,
    invalid_params: InvalidParamsHandler,
    version_unavailable: VersionUnavailableHandler,
    validate_request_if: RequestPredicate,
    validate_response_if: ResponsePredicate,
    meta_params: Vec<String>,
    coerce_params: bool,
    ambiguity: AmbiguityPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            compiler: SchemaCompiler::new(),
            version_source: VersionSource::default(),
            invalid_params: Arc::new(default_invalid_params),
            version_unavailable: Arc::new(default_version_unavailable),
            validate_request_if: Arc::new(|_| true),
            validate_response_if: Arc::new(|_, status| (200..300).contains(&status)),
            meta_params: vec!["splat".to_string(), "captures".to_string()],
            coerce_params: true,
            ambiguity: AmbiguityPolicy::default(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("compiler", &self.compiler)
            .field("version_source", &self.version_source)
            .field("meta_params", &self.meta_params)
            .field("coerce_params", &self.coerce_params)
            .field("ambiguity", &self.ambiguity)
            .finish_non_exhaustive()
    }
}

/// Immutable, shareable contract configuration.
///
/// Cloning is cheap: endpoints and settings are reference-counted.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    endpoints: Arc<EndpointSet>,
    settings: Arc<Settings>,
}

impl Configuration {
    /// A builder starting from the default settings and no endpoints.
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// Build a new configuration from a copy of this one, modified by
    /// `setup`. `self` is not changed.
    ///
    /// # Errors
    ///
    /// Any `ConfigurationError` raised while building the duplicate.
    pub fn customized_duplicate<F>(&self, setup: F) -> Result<Configuration, ConfigurationError>
    where
        F: FnOnce(&mut ConfigurationBuilder),
    {
        let mut builder = ConfigurationBuilder {
            settings: (*self.settings).clone(),
            endpoints: self.endpoints.iter().cloned().collect(),
            ..ConfigurationBuilder::default()
        };
        setup(&mut builder);
        builder.build()
    }

    /// The registered endpoints, in registration order.
    pub fn endpoints(&self) -> &EndpointSet {
        &self.endpoints
    }

    /// Meta-parameter names stripped before request validation.
    pub fn meta_params(&self) -> &[String] {
        &self.settings.meta_params
    }

    /// Resolve a message to a versioned definition.
    pub fn find_definition<F>(
        &self,
        method: Method,
        path: &str,
        direction: Direction,
        status: Option<u16>,
        resolve_version: F,
    ) -> Resolution<'_>
    where
        F: FnOnce(&Endpoint) -> Option<String>,
    {
        self.endpoints
            .find_definition(method, path, direction, status, resolve_version)
    }

    /// The version `context` requests from `endpoint`, per the configured
    /// [`VersionSource`].
    pub fn api_version_for(&self, context: &RequestContext, endpoint: &Endpoint) -> Option<String> {
        self.settings.version_source.resolve(context, endpoint)
    }

    /// Resolve the request-direction definition for `context`.
    pub fn resolve_request(&self, context: &RequestContext) -> Resolution<'_> {
        self.find_definition(
            context.method(),
            context.path(),
            Direction::Request,
            None,
            |endpoint| self.api_version_for(context, endpoint),
        )
    }

    /// Invoke the version-unavailable handler.
    pub fn request_version_unavailable(
        &self,
        context: &RequestContext,
        requested: Option<&str>,
        available: &BTreeSet<String>,
    ) -> Result<(), ContractError> {
        (self.settings.version_unavailable)(context, requested, available)
    }

    /// Invoke the invalid-parameters handler.
    pub fn request_params_invalid(
        &self,
        context: &RequestContext,
        error: &ValidationError,
    ) -> Result<(), ContractError> {
        (self.settings.invalid_params)(context, error)
    }

    /// Whether the request-validation predicate admits `context`.
    pub fn should_validate_request(&self, context: &RequestContext) -> bool {
        (self.settings.validate_request_if)(context)
    }

    /// Whether the response-validation predicate admits `status`.
    pub fn should_validate_response(&self, context: &RequestContext, status: u16) -> bool {
        (self.settings.validate_response_if)(context, status)
    }

    /// The parameter map to validate for a matched request: the raw
    /// parameters, plus path parameters the map does not already define,
    /// minus undeclared meta-parameters, with string values coerced when
    /// coercion is enabled.
    pub fn prepare_params(
        &self,
        context: &RequestContext,
        matched: &DefinitionMatch<'_>,
    ) -> Map<String, Value> {
        let schema = matched.definition.schema();
        let mut params = context.params().clone();
        for (name, value) in &matched.path_params {
            params
                .entry(name.clone())
                .or_insert_with(|| Value::String(value.clone()));
        }

        let removed = strip_meta_params(&mut params, schema, &self.settings.meta_params);
        if !removed.is_empty() {
            tracing::debug!(?removed, "stripped transport meta-parameters");
        }
        if self.settings.coerce_params {
            coerce_params(&mut params, schema);
        }
        params
    }

    /// Run a request through resolution and validation, without invoking
    /// the pluggable handlers.
    pub fn evaluate_request(&self, context: &RequestContext) -> Outcome {
        if !self.should_validate_request(context) {
            return Outcome::Skipped;
        }
        match self.resolve_request(context) {
            Resolution::NotFound => Outcome::NotFound,
            Resolution::VersionUnavailable {
                requested,
                available,
                ..
            } => Outcome::VersionUnavailable {
                requested,
                available,
            },
            Resolution::Found(matched) => {
                let params = self.prepare_params(context, &matched);
                match matched.definition.validate_params(&params) {
                    Ok(()) => Outcome::Valid(Value::Object(params)),
                    Err(e) => Outcome::Invalid(e),
                }
            }
        }
    }

    /// Validate a response body against the response definition that
    /// governs `status`.
    pub fn validate_response(&self, context: &RequestContext, status: u16, body: &Value) -> Outcome {
        if !self.should_validate_response(context, status) {
            return Outcome::Skipped;
        }
        let resolution = self.find_definition(
            context.method(),
            context.path(),
            Direction::Response,
            Some(status),
            |endpoint| self.api_version_for(context, endpoint),
        );
        match resolution {
            Resolution::NotFound => Outcome::NotFound,
            Resolution::VersionUnavailable {
                requested,
                available,
                ..
            } => Outcome::VersionUnavailable {
                requested,
                available,
            },
            Resolution::Found(matched) => match matched.definition.validate(body) {
                Ok(()) => Outcome::Valid(body.clone()),
                Err(e) => Outcome::Invalid(e),
            },
        }
    }
}

/// Mutable staging area for a [`Configuration`].
///
/// Setters return `&mut Self` for chaining. Documents are compiled, and
/// file load errors reported, when [`build`](Self::build) runs.
#[derive(Debug, Default)]
pub struct ConfigurationBuilder {
    settings: Settings,
    endpoints: Vec<Endpoint>,
    pending: Vec<EndpointDocument>,
    load_errors: Vec<(String, String)>,
}

impl ConfigurationBuilder {
    /// Register an endpoint document after those already registered.
    pub fn endpoint(&mut self, document: EndpointDocument) -> &mut Self {
        self.pending.push(document);
        self
    }

    /// Register several endpoint documents, in order.
    pub fn endpoints<I>(&mut self, documents: I) -> &mut Self
    where
        I: IntoIterator<Item = EndpointDocument>,
    {
        self.pending.extend(documents);
        self
    }

    /// Register the endpoint document stored at `path`.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> &mut Self {
        match EndpointDocument::load_file(path.as_ref()) {
            Ok(document) => self.pending.push(document),
            Err(ConfigurationError::DocumentLoad {
                source_name,
                reason,
            }) => self.load_errors.push((source_name, reason)),
            Err(other) => self
                .load_errors
                .push((path.as_ref().display().to_string(), other.to_string())),
        }
        self
    }

    /// Forget every registered endpoint, including those inherited from
    /// the configuration being duplicated, along with any errors recorded
    /// while loading documents.
    pub fn clear_endpoints(&mut self) -> &mut Self {
        self.endpoints.clear();
        self.pending.clear();
        self.load_errors.clear();
        self
    }

    /// Set the version extraction strategy.
    pub fn api_version(&mut self, source: VersionSource) -> &mut Self {
        self.settings.version_source = source;
        self
    }

    /// Replace the invalid-parameters handler.
    pub fn on_invalid_params<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&RequestContext, &ValidationError) -> Result<(), ContractError> + Send + Sync + 'static,
    {
        self.settings.invalid_params = Arc::new(handler);
        self
    }

    /// Replace the version-unavailable handler.
    pub fn on_unavailable_version<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&RequestContext, Option<&str>, &BTreeSet<String>) -> Result<(), ContractError>
            + Send
            + Sync
            + 'static,
    {
        self.settings.version_unavailable = Arc::new(handler);
        self
    }

    /// Restrict request validation to requests the predicate admits.
    pub fn validate_request_if<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&RequestContext) -> bool + Send + Sync + 'static,
    {
        self.settings.validate_request_if = Arc::new(predicate);
        self
    }

    /// Restrict response validation to responses the predicate admits.
    /// Defaults to 2xx statuses.
    pub fn validate_response_if<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&RequestContext, u16) -> bool + Send + Sync + 'static,
    {
        self.settings.validate_response_if = Arc::new(predicate);
        self
    }

    /// Set the meta-parameter names stripped before request validation.
    pub fn meta_params<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.meta_params = names.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable string-to-scalar parameter coercion.
    pub fn coerce_params(&mut self, enabled: bool) -> &mut Self {
        self.settings.coerce_params = enabled;
        self
    }

    /// Enable or disable strict schemas for documents compiled by this
    /// builder. Endpoints inherited from a duplicated configuration keep
    /// the schemas they were compiled with.
    pub fn strict_schemas(&mut self, strict: bool) -> &mut Self {
        self.settings.compiler.set_strict(strict);
        self
    }

    /// Register a schema that definition schemas may `$ref` by `uri`.
    pub fn shared_schema(&mut self, uri: impl Into<String>, schema: Value) -> &mut Self {
        self.settings.compiler.add_shared_schema(uri, schema);
        self
    }

    /// Set the policy for overlapping registrations.
    pub fn ambiguity(&mut self, policy: AmbiguityPolicy) -> &mut Self {
        self.settings.ambiguity = policy;
        self
    }

    /// Compile pending documents and publish an immutable configuration.
    ///
    /// # Errors
    ///
    /// The first file load error, the first document that fails to
    /// compile, or (under [`AmbiguityPolicy::Reject`]) the first overlap.
    pub fn build(&self) -> Result<Configuration, ConfigurationError> {
        if let Some((source_name, reason)) = self.load_errors.first() {
            return Err(ConfigurationError::DocumentLoad {
                source_name: source_name.clone(),
                reason: reason.clone(),
            });
        }

        let mut endpoints = self.endpoints.clone();
        for document in &self.pending {
            endpoints.push(Endpoint::from_document(document, &self.settings.compiler)?);
        }
        let endpoints = EndpointSet::new(endpoints);

        let mut names = HashSet::new();
        for endpoint in &endpoints {
            if !names.insert(endpoint.name()) {
                tracing::warn!(endpoint = endpoint.name(), "duplicate endpoint name");
            }
        }

        let ambiguities = endpoints.ambiguities();
        match self.settings.ambiguity {
            AmbiguityPolicy::Reject => {
                if let Some(first) = ambiguities.into_iter().next() {
                    return Err(first);
                }
            }
            AmbiguityPolicy::FirstMatchWins => {
                for ambiguity in &ambiguities {
                    tracing::warn!(%ambiguity, "ambiguous registration; earlier registration wins");
                }
            }
        }

        tracing::info!(endpoints = endpoints.len(), "contract configuration built");
        Ok(Configuration {
            endpoints: Arc::new(endpoints),
            settings: Arc::new(self.settings.clone()),
        })
    }
}
