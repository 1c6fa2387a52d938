//! # Endpoint Definitions
//!
//! An [`Endpoint`] is the compiled, immutable form of an
//! [`EndpointDocument`]: a route pattern, an HTTP method and an ordered
//! list of [`VersionedDefinition`]s, each owning a compiled schema and its
//! examples.
//!
//! ## Invariants
//!
//! - An endpoint has at least one versioned definition.
//! - Every versioned definition names at least one version.
//! - Every schema compiled successfully; a malformed schema never reaches
//!   request time.
//! - A request schema closed to additional properties declares every
//!   named route segment.
//! - Nothing is mutable after construction. Endpoints are shared
//!   read-only by every concurrent request.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use covenant_core::{ConfigurationError, Direction, Method, RoutePattern, StatusCodes};
use covenant_schema::{CompiledSchema, SchemaCompiler, SchemaError, ValidationError};

use crate::document::{DefinitionDocument, EndpointDocument};

/// A compiled endpoint definition.
#[derive(Debug, Clone)]
pub struct Endpoint {
    name: String,
    route: RoutePattern,
    method: Method,
    definitions: Vec<VersionedDefinition>,
}

impl Endpoint {
    /// Compile an endpoint document.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` for an invalid route, an empty
    /// definition list, a definition without versions, an invalid status
    /// code pattern, a malformed schema, or a closed request schema that
    /// omits a route parameter.
    pub fn from_document(
        document: &EndpointDocument,
        compiler: &SchemaCompiler,
    ) -> Result<Self, ConfigurationError> {
        let route = RoutePattern::parse(&document.route)?;

        if document.definitions.is_empty() {
            return Err(ConfigurationError::EmptyDefinitions {
                endpoint: document.name.clone(),
            });
        }

        let definitions = document
            .definitions
            .iter()
            .map(|d| VersionedDefinition::compile(&document.name, d, compiler))
            .collect::<Result<Vec<_>, _>>()?;

        for definition in definitions.iter().filter(|d| d.direction == Direction::Request) {
            if let Some(param) = route
                .param_names()
                .find(|name| !admits_property(definition.schema(), name))
            {
                return Err(ConfigurationError::UndeclaredPathParam {
                    endpoint: document.name.clone(),
                    versions: definition.versions.iter().cloned().collect::<Vec<_>>().join(", "),
                    param: param.to_string(),
                });
            }
        }

        Ok(Self {
            name: document.name.clone(),
            route,
            method: document.method,
            definitions,
        })
    }

    /// Endpoint name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compiled route pattern.
    pub fn route(&self) -> &RoutePattern {
        &self.route
    }

    /// HTTP method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// All versioned definitions, in declaration order.
    pub fn definitions(&self) -> &[VersionedDefinition] {
        &self.definitions
    }

    /// Definitions describing messages in `direction`, in declaration order.
    pub fn definitions_for(
        &self,
        direction: Direction,
    ) -> impl Iterator<Item = &VersionedDefinition> {
        self.definitions
            .iter()
            .filter(move |d| d.direction == direction)
    }

    /// Whether the endpoint declares any definition for `direction`.
    pub fn handles(&self, direction: Direction) -> bool {
        self.definitions_for(direction).next().is_some()
    }

    /// Union of the versions declared for `direction`.
    pub fn available_versions(&self, direction: Direction) -> BTreeSet<String> {
        self.definitions_for(direction)
            .flat_map(|d| d.versions.iter().cloned())
            .collect()
    }

    /// The first definition for `direction` that declares `version` and
    /// governs `status`.
    pub fn find_definition(
        &self,
        version: &str,
        direction: Direction,
        status: Option<u16>,
    ) -> Option<&VersionedDefinition> {
        self.definitions_for(direction)
            .filter(|d| d.supports(version))
            .find(|d| d.status_codes.matches(status))
    }
}

/// Whether an object schema lets a property named `name` through. Path
/// parameters are merged into request params, so a closed schema must
/// declare each of them.
fn admits_property(schema: &Value, name: &str) -> bool {
    let declared = schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|props| props.contains_key(name));
    declared
        || schema.get("patternProperties").is_some()
        || schema.get("additionalProperties") != Some(&Value::Bool(false))
}

/// One versioned schema of an endpoint.
#[derive(Debug, Clone)]
pub struct VersionedDefinition {
    endpoint_name: String,
    versions: BTreeSet<String>,
    direction: Direction,
    status_codes: StatusCodes,
    schema: CompiledSchema,
    examples: Vec<Value>,
}

impl VersionedDefinition {
    fn compile(
        endpoint_name: &str,
        document: &DefinitionDocument,
        compiler: &SchemaCompiler,
    ) -> Result<Self, ConfigurationError> {
        if document.versions.is_empty() {
            return Err(ConfigurationError::EmptyVersions {
                endpoint: endpoint_name.to_string(),
                direction: document.message_type.to_string(),
            });
        }

        let status_codes = match &document.status_codes {
            Some(codes) => StatusCodes::parse(codes.as_slice())?,
            None => StatusCodes::any(),
        };

        let schema = compiler.compile(&document.schema).map_err(|e| {
            let reason = match e {
                SchemaError::Malformed { reason } => reason,
                SchemaError::Invalid(err) => err.to_string(),
            };
            ConfigurationError::MalformedSchema {
                endpoint: endpoint_name.to_string(),
                versions: document.versions.join(", "),
                reason,
            }
        })?;

        Ok(Self {
            endpoint_name: endpoint_name.to_string(),
            versions: document.versions.iter().cloned().collect(),
            direction: document.message_type,
            status_codes,
            schema,
            examples: document.examples.clone(),
        })
    }

    /// Name of the endpoint this definition belongs to.
    pub fn endpoint_name(&self) -> &str {
        &self.endpoint_name
    }

    /// Versions this definition describes.
    pub fn versions(&self) -> &BTreeSet<String> {
        &self.versions
    }

    /// Whether `version` is one of this definition's versions.
    pub fn supports(&self, version: &str) -> bool {
        self.versions.contains(version)
    }

    /// Message direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Status codes this definition governs.
    pub fn status_codes(&self) -> &StatusCodes {
        &self.status_codes
    }

    /// The schema document, as compiled.
    pub fn schema(&self) -> &Value {
        self.schema.schema()
    }

    /// Example payloads.
    pub fn examples(&self) -> &[Value] {
        &self.examples
    }

    /// Validate a message body.
    pub fn validate(&self, instance: &Value) -> Result<(), ValidationError> {
        self.schema.validate(instance)
    }

    /// Validate a parameter map.
    pub fn validate_params(&self, params: &Map<String, Value>) -> Result<(), ValidationError> {
        self.schema.validate_params(params)
    }

    /// Validate every example, returning the index and error of each one
    /// that fails.
    pub fn validate_examples(&self) -> Vec<(usize, ValidationError)> {
        self.examples
            .iter()
            .enumerate()
            .filter_map(|(i, example)| self.validate(example).err().map(|e| (i, e)))
            .collect()
    }
}
