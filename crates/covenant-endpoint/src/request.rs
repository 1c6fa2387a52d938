//! # Request Scope
//!
//! Per-request state: the resolved definition and the validated
//! parameters, each computed at most once per request.
//!
//! A [`RequestScope`] borrows the shared [`Configuration`] and owns
//! everything else. It is created when a request arrives and dropped when
//! the request completes, so nothing memoized for one request can be
//! observed by another. Adapters that pool their own request objects must
//! create a fresh scope per request rather than pooling scopes.
//!
//! Unlike [`Configuration::evaluate_request`], the scope invokes the
//! configured failure handlers. A handler returning `Ok(())` lets the
//! request proceed without a contract; its raw parameters are then used.

use std::cell::OnceCell;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::Configuration;
use crate::error::ContractError;
use crate::finder::{DefinitionMatch, Resolution};
use crate::version::RequestContext;

/// Request-scoped contract state.
#[derive(Debug)]
pub struct RequestScope<'c> {
    config: &'c Configuration,
    context: RequestContext,
    request_id: Uuid,
    span: tracing::Span,
    definition: OnceCell<Result<Option<DefinitionMatch<'c>>, ContractError>>,
    params: OnceCell<Result<Option<Map<String, Value>>, ContractError>>,
}

impl<'c> RequestScope<'c> {
    /// Open a scope for one request.
    pub fn new(config: &'c Configuration, context: RequestContext) -> Self {
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!(
            "request",
            %request_id,
            method = %context.method(),
            path = context.path(),
        );
        Self {
            config,
            context,
            request_id,
            span,
            definition: OnceCell::new(),
            params: OnceCell::new(),
        }
    }

    /// Identifier recorded on this scope's tracing span.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// The request this scope belongs to.
    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// The request-direction definition governing this request.
    ///
    /// `Ok(None)` when no endpoint governs the request, or when the
    /// version-unavailable handler let the request proceed. Resolution and
    /// the handler run on the first call only; later calls return the same
    /// result.
    pub fn endpoint_definition(&self) -> Result<Option<&DefinitionMatch<'c>>, ContractError> {
        self.definition
            .get_or_init(|| self.resolve_definition())
            .as_ref()
            .map(Option::as_ref)
            .map_err(Clone::clone)
    }

    /// The prepared, validated parameters.
    ///
    /// `Ok(None)` when the request is not validated: the predicate
    /// excluded it, no definition governs it, or a handler let it proceed.
    /// Computed on the first call only.
    pub fn validated_params(&self) -> Result<Option<&Map<String, Value>>, ContractError> {
        self.params
            .get_or_init(|| self.validate_params())
            .as_ref()
            .map(Option::as_ref)
            .map_err(Clone::clone)
    }

    /// The parameters the application should use: the validated map when
    /// validation ran, otherwise the raw request parameters.
    pub fn params(&self) -> Result<&Map<String, Value>, ContractError> {
        Ok(self
            .validated_params()?
            .unwrap_or_else(|| self.context.params()))
    }

    fn resolve_definition(&self) -> Result<Option<DefinitionMatch<'c>>, ContractError> {
        let _entered = self.span.enter();
        let config: &'c Configuration = self.config;
        match config.resolve_request(&self.context) {
            Resolution::Found(matched) => Ok(Some(matched)),
            Resolution::NotFound => Ok(None),
            Resolution::VersionUnavailable {
                endpoint,
                requested,
                available,
            } => {
                tracing::debug!(
                    endpoint = endpoint.name(),
                    requested = requested.as_deref(),
                    "invoking version-unavailable handler"
                );
                config.request_version_unavailable(
                    &self.context,
                    requested.as_deref(),
                    &available,
                )?;
                Ok(None)
            }
        }
    }

    fn validate_params(&self) -> Result<Option<Map<String, Value>>, ContractError> {
        if !self.config.should_validate_request(&self.context) {
            return Ok(None);
        }
        let Some(matched) = self.endpoint_definition()? else {
            return Ok(None);
        };

        let _entered = self.span.enter();
        let params = self.config.prepare_params(&self.context, matched);
        match matched.definition.validate_params(&params) {
            Ok(()) => Ok(Some(params)),
            Err(error) => {
                tracing::debug!(
                    endpoint = matched.definition.endpoint_name(),
                    version = %matched.version,
                    violations = error.violations().len(),
                    "invoking invalid-params handler"
                );
                self.config.request_params_invalid(&self.context, &error)?;
                Ok(None)
            }
        }
    }
}
