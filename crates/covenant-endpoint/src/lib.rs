//! # covenant-endpoint — Versioned Endpoint Contracts
//!
//! Registers versioned endpoint definitions and resolves each inbound
//! request (method, path, requested version) to the one schema that
//! governs it.
//!
//! ## Components
//!
//! - **Documents** (`document.rs`): the YAML/JSON form of an endpoint
//!   definition.
//!
//! - **Endpoints** (`endpoint.rs`): compiled, immutable definitions. Route
//!   patterns, status codes and schemas are checked here, once.
//!
//! - **Finder** (`finder.rs`): first-structural-match resolution with a
//!   tagged [`Resolution`] result: found, not found, or version
//!   unavailable with the advertised versions.
//!
//! - **Versions** (`version.rs`): the transport-neutral [`RequestContext`]
//!   and the configurable [`VersionSource`] strategy.
//!
//! - **Configuration** (`config.rs`): the immutable registry plus
//!   pluggable handlers, built through [`ConfigurationBuilder`] and
//!   customized only by duplication.
//!
//! - **Request scope** (`request.rs`): per-request memoization of the
//!   resolved definition and validated parameters.
//!
//! ## Request Lifecycle
//!
//! ```text
//! received → resolving ─┬─ no structural match ──────────→ passed through
//!                       ├─ version unavailable ──→ handler
//!                       └─ definition found → validating ─┬─ valid ──→ proceed
//!                                                         └─ invalid → handler
//! ```
//!
//! ## Crate Policy
//!
//! - A [`Configuration`] is never mutated after it is built.
//! - Per-request state lives only in a [`RequestScope`].
//! - No `.unwrap()` outside tests.

pub mod config;
pub mod document;
pub mod endpoint;
pub mod error;
pub mod finder;
pub mod request;
pub mod version;

pub use config::{
    AmbiguityPolicy, Configuration, ConfigurationBuilder, InvalidParamsHandler, Outcome,
    RequestPredicate, ResponsePredicate, VersionUnavailableHandler,
};
pub use document::{DefinitionDocument, EndpointDocument};
pub use endpoint::{Endpoint, VersionedDefinition};
pub use error::ContractError;
pub use finder::{DefinitionMatch, EndpointSet, Resolution};
pub use request::RequestScope;
pub use version::{RequestContext, VersionFn, VersionSource};
