//! # covenant-schema — Schema Validation
//!
//! Compiles JSON Schema documents into reusable validators and translates
//! the evaluator's native errors into covenant's structured
//! [`ValidationError`].
//!
//! ## Runtime Validation (`validate`)
//!
//! [`SchemaCompiler`] turns a schema document into a [`CompiledSchema`]
//! once, at configuration time. A malformed schema is a
//! [`SchemaError::Malformed`], which callers surface as a fatal setup
//! error. [`CompiledSchema::validate`] runs in a single pass and reports
//! every violation the evaluator finds, never just the first.
//!
//! ## Strict Schemas (`strict`)
//!
//! An optional rewrite that makes declared properties required (unless
//! marked `optional: true`) and closes objects to undeclared properties.
//!
//! ## Parameter Preparation (`params`)
//!
//! Request parameters arrive as strings and carry transport artifacts.
//! [`params::strip_meta_params`] removes undeclared routing artifacts and
//! [`params::coerce_params`] converts strings to the scalar types the
//! schema declares, so the evaluator judges values rather than encodings.
//!
//! ## Crate Policy
//!
//! - Schema evaluation semantics belong to the `jsonschema` crate; this
//!   crate never re-implements a keyword.
//! - No network access: remote `$ref`s resolve only against schemas
//!   registered on the compiler.

pub mod params;
pub mod strict;
pub mod validate;

pub use strict::make_strict;
pub use validate::{
    validate, CompiledSchema, SchemaCompiler, SchemaError, ValidationError, ValidationViolations,
    Violation,
};
