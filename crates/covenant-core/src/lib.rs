//! # covenant-core — Foundational Types for covenant
//!
//! The leaf of the workspace dependency graph. Defines the small, strongly
//! typed vocabulary the rest of covenant speaks: which HTTP verb a contract
//! applies to, which direction a payload travels, how a route pattern is
//! matched against a concrete path, and which response status codes a
//! definition governs.
//!
//! ## Key Design Principles
//!
//! 1. **Closed vocabularies are enums.** `Method` and `Direction` are
//!    exhaustive enums. A typo in a definition document fails at load time,
//!    never as a silent non-match at request time.
//!
//! 2. **Route patterns are compiled once.** `RoutePattern::parse()` is the
//!    only constructor; matching walks pre-split segments and never
//!    re-parses the pattern.
//!
//! 3. **Setup errors are fatal and typed.** Every problem detectable while
//!    building a configuration is a `ConfigurationError` variant carrying
//!    the offending endpoint or route.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `covenant-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod direction;
pub mod error;
pub mod method;
pub mod route;
pub mod status;

pub use direction::Direction;
pub use error::ConfigurationError;
pub use method::Method;
pub use route::{PathParams, RoutePattern};
pub use status::StatusCodes;
