//! # Schema Validation
//!
//! Runtime validation of parameter maps and message bodies against JSON
//! Schema documents (Draft 2020-12).
//!
//! ## Translation Boundary
//!
//! `jsonschema` reports violations as its own error objects. This module
//! converts each one into a [`Violation`] (instance path, schema path,
//! keyword, message, expected constraint) without dropping or inventing
//! any: the violation list is exactly the evaluator's error iterator.
//!
//! ## Schema Resolution
//!
//! Internal `$ref`s (`#/$defs/<name>`) are resolved by the jsonschema crate
//! natively. Any other reference must name a schema registered with
//! [`SchemaCompiler::add_shared_schema`]; unknown URIs fail compilation
//! instead of triggering a network fetch.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::strict::make_strict;

/// Retriever that resolves `$ref` URIs against registered shared schemas.
///
/// Keeps the jsonschema crate from making network requests. Unknown URIs
/// are an error, which turns into a malformed-schema failure at compile
/// time rather than a permissive schema at request time.
struct SharedSchemaRetriever {
    schemas_by_uri: Arc<HashMap<String, Value>>,
}

impl Retrieve for SharedSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        self.schemas_by_uri
            .get(uri_str)
            .cloned()
            .ok_or_else(|| format!("schema reference '{uri_str}' is not registered").into())
    }
}

/// Error produced by schema compilation or validation.
#[derive(Error, Debug, Clone)]
pub enum SchemaError {
    /// The schema document itself is invalid. This is a configuration
    /// problem, not a property of any payload.
    #[error("malformed schema: {reason}")]
    Malformed {
        /// Reason reported by the schema compiler.
        reason: String,
    },

    /// The payload did not conform to the schema.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A single violation with structured context.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// JSON Pointer to the violating value inside the payload.
    pub instance_path: String,
    /// JSON Pointer to the schema keyword that was violated.
    pub schema_path: String,
    /// The violated keyword (`type`, `required`, `minLength`, ...).
    pub keyword: String,
    /// Human-readable description of the violation.
    pub message: String,
    /// The keyword's value in the schema, when it can be located.
    pub expected: Option<Value>,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of violations reported in one validation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Iterate over the violations in evaluator order.
    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ValidationViolations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

/// A payload failed validation against a schema.
///
/// Carries the offending payload, the schema it violated, and every
/// violation found.
#[derive(Error, Debug, Clone)]
#[error("payload failed schema validation with {} violation(s):\n{violations}", .violations.len())]
pub struct ValidationError {
    data: Value,
    schema: Arc<Value>,
    violations: ValidationViolations,
}

impl ValidationError {
    /// The payload that was validated.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// The schema the payload violated.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// All violations, in the order the evaluator reported them.
    pub fn violations(&self) -> &ValidationViolations {
        &self.violations
    }
}

/// Compiles schema documents into validators.
///
/// Holds the compile-time options shared by every schema of a
/// configuration: strict rewriting and the shared schemas available to
/// `$ref`.
#[derive(Debug, Clone, Default)]
pub struct SchemaCompiler {
    strict: bool,
    shared: Arc<HashMap<String, Value>>,
}

impl SchemaCompiler {
    /// A compiler with strict mode off and no shared schemas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the strict-schema rewrite.
    pub fn set_strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    /// Whether schemas are rewritten by [`make_strict`] before compiling.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Register a schema document that other schemas may `$ref` by URI.
    pub fn add_shared_schema(&mut self, uri: impl Into<String>, schema: Value) -> &mut Self {
        Arc::make_mut(&mut self.shared).insert(uri.into(), schema);
        self
    }

    /// Build `ValidationOptions` with shared schemas resolvable by the
    /// retriever. Shared schemas get the same strict rewrite as the root.
    fn build_options(&self) -> ValidationOptions {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);

        let schemas_by_uri = if self.strict {
            Arc::new(
                self.shared
                    .iter()
                    .map(|(uri, schema)| (uri.clone(), make_strict(schema)))
                    .collect(),
            )
        } else {
            Arc::clone(&self.shared)
        };
        opts.with_retriever(SharedSchemaRetriever { schemas_by_uri });

        opts
    }

    /// Compile a schema document.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Malformed` if the document is not a valid
    /// schema or references an unregistered URI.
    pub fn compile(&self, schema: &Value) -> Result<CompiledSchema, SchemaError> {
        let schema = if self.strict {
            make_strict(schema)
        } else {
            schema.clone()
        };

        let validator = self
            .build_options()
            .build(&schema)
            .map_err(|e| SchemaError::Malformed {
                reason: e.to_string(),
            })?;

        Ok(CompiledSchema {
            schema: Arc::new(schema),
            validator: Arc::new(validator),
        })
    }
}

/// A schema document together with its compiled validator.
///
/// Cheap to clone; the validator is shared. `Send + Sync`, so one compiled
/// schema serves every concurrent request.
#[derive(Clone)]
pub struct CompiledSchema {
    schema: Arc<Value>,
    validator: Arc<Validator>,
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl CompiledSchema {
    /// The schema document as compiled (after any strict rewrite).
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Whether the instance conforms, without collecting violations.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Validate an instance, reporting every violation.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] carrying the instance, the schema and
    /// the complete violation list when the instance does not conform.
    pub fn validate(&self, instance: &Value) -> Result<(), ValidationError> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(instance)
            .map(|e| {
                let schema_path = e.schema_path.to_string();
                Violation {
                    instance_path: e.instance_path.to_string(),
                    keyword: keyword_of(&schema_path),
                    expected: self.schema.pointer(&schema_path).cloned(),
                    message: e.to_string(),
                    schema_path,
                }
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            tracing::debug!(count = violations.len(), "payload failed schema validation");
            Err(ValidationError {
                data: instance.clone(),
                schema: Arc::clone(&self.schema),
                violations: ValidationViolations { violations },
            })
        }
    }

    /// Validate a parameter map.
    pub fn validate_params(&self, params: &Map<String, Value>) -> Result<(), ValidationError> {
        self.validate(&Value::Object(params.clone()))
    }
}

/// Validate an instance against a schema document in one call.
///
/// Compiles the schema with default options on every call; prefer
/// [`SchemaCompiler::compile`] once and [`CompiledSchema::validate`] per
/// request.
///
/// # Errors
///
/// `SchemaError::Malformed` for an invalid schema, `SchemaError::Invalid`
/// when the instance does not conform.
pub fn validate(instance: &Value, schema: &Value) -> Result<(), SchemaError> {
    SchemaCompiler::new().compile(schema)?.validate(instance)?;
    Ok(())
}

/// Last segment of a JSON Pointer, unescaped.
fn keyword_of(schema_path: &str) -> String {
    schema_path
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .replace("~1", "/")
        .replace("~0", "~")
}
