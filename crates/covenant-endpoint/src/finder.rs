//! # Definition Finder
//!
//! Resolves a request's method, path and direction to one versioned
//! definition of one registered endpoint.
//!
//! ## Algorithm
//!
//! 1. Scan endpoints in registration order. The first endpoint whose
//!    method equals the request method, whose route matches the path, and
//!    which declares a definition for the direction is the structural
//!    match. Later endpoints are never consulted, even when the structural
//!    match has no usable version.
//! 2. No structural match: [`Resolution::NotFound`]. The version callback
//!    is not invoked.
//! 3. Invoke the version callback once with the matched endpoint.
//! 4. Scan the endpoint's definitions for that direction, in declaration
//!    order, for the first one declaring the version and governing the
//!    status code.
//! 5. No definition declares the version (or no version was determined):
//!    [`Resolution::VersionUnavailable`] with the endpoint's advertised
//!    versions. Version found but no status code matches:
//!    [`Resolution::NotFound`].
//!
//! ## Ambiguity
//!
//! Overlapping route patterns and overlapping version sets are resolved by
//! declaration order. [`EndpointSet::ambiguities`] lists them so a
//! configuration can warn or refuse to build.

use std::collections::BTreeSet;

use covenant_core::{ConfigurationError, Direction, Method, PathParams};

use crate::endpoint::{Endpoint, VersionedDefinition};

/// A versioned definition selected for a request.
#[derive(Debug, Clone)]
pub struct DefinitionMatch<'a> {
    /// The structurally matching endpoint.
    pub endpoint: &'a Endpoint,
    /// The selected definition.
    pub definition: &'a VersionedDefinition,
    /// The version the callback resolved.
    pub version: String,
    /// Values of the route's named segments.
    pub path_params: PathParams,
}

/// Result of [`EndpointSet::find_definition`].
#[derive(Debug, Clone)]
pub enum Resolution<'a> {
    /// A definition governs the message.
    Found(DefinitionMatch<'a>),
    /// No endpoint governs the message.
    NotFound,
    /// An endpoint matched, but none of its definitions declares the
    /// requested version.
    VersionUnavailable {
        /// The structurally matching endpoint.
        endpoint: &'a Endpoint,
        /// The version the callback resolved, if any.
        requested: Option<String>,
        /// Every version the endpoint declares for the direction.
        available: BTreeSet<String>,
    },
}

impl<'a> Resolution<'a> {
    /// The match, if a definition was found.
    pub fn found(&self) -> Option<&DefinitionMatch<'a>> {
        match self {
            Resolution::Found(m) => Some(m),
            _ => None,
        }
    }

    /// Consume into the match, if a definition was found.
    pub fn into_found(self) -> Option<DefinitionMatch<'a>> {
        match self {
            Resolution::Found(m) => Some(m),
            _ => None,
        }
    }

    /// The advertised versions when the version was unavailable.
    pub fn available_versions(&self) -> Option<&BTreeSet<String>> {
        match self {
            Resolution::VersionUnavailable { available, .. } => Some(available),
            _ => None,
        }
    }

    /// Whether no endpoint governs the message.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Resolution::NotFound)
    }
}

/// Registered endpoints, in registration order.
#[derive(Debug, Clone, Default)]
pub struct EndpointSet {
    endpoints: Vec<Endpoint>,
}

impl EndpointSet {
    /// Wrap endpoints, keeping their order.
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self { endpoints }
    }

    /// Number of endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns true if no endpoint is registered.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Iterate in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Endpoint> {
        self.endpoints.iter()
    }

    /// First endpoint registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name() == name)
    }

    /// Resolve a message to a versioned definition.
    ///
    /// `resolve_version` is called at most once, with the structurally
    /// matching endpoint, and never when no endpoint matches.
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
        let candidate = self.endpoints.iter().find_map(|endpoint| {
            if endpoint.method() != method || !endpoint.handles(direction) {
                return None;
            }
            endpoint.route().matches(path).map(|params| (endpoint, params))
        });

        let Some((endpoint, path_params)) = candidate else {
            tracing::debug!(%method, path, %direction, "no endpoint definition matches");
            return Resolution::NotFound;
        };

        let requested = resolve_version(endpoint);
        let Some(version) = requested else {
            tracing::debug!(endpoint = endpoint.name(), "no API version determined");
            return Resolution::VersionUnavailable {
                endpoint,
                requested: None,
                available: endpoint.available_versions(direction),
            };
        };

        if let Some(definition) = endpoint.find_definition(&version, direction, status) {
            tracing::debug!(endpoint = endpoint.name(), %version, "endpoint definition resolved");
            return Resolution::Found(DefinitionMatch {
                endpoint,
                definition,
                version,
                path_params,
            });
        }

        let available = endpoint.available_versions(direction);
        if available.contains(&version) {
            tracing::debug!(
                endpoint = endpoint.name(),
                %version,
                ?status,
                "no definition governs this status code"
            );
            Resolution::NotFound
        } else {
            tracing::debug!(endpoint = endpoint.name(), %version, "requested version unavailable");
            Resolution::VersionUnavailable {
                endpoint,
                requested: Some(version),
                available,
            }
        }
    }

    /// Registrations whose resolution depends on declaration order.
    ///
    /// Reports versions declared by two definitions of one endpoint for the
    /// same direction and intersecting status codes, and pairs of endpoints
    /// with the same method and direction whose routes can match the same
    /// path. In each case the earlier registration wins.
    pub fn ambiguities(&self) -> Vec<ConfigurationError> {
        let mut found = Vec::new();

        for endpoint in &self.endpoints {
            let defs = endpoint.definitions();
            for (i, a) in defs.iter().enumerate() {
                for b in &defs[i + 1..] {
                    if a.direction() != b.direction() || !a.status_codes().intersects(b.status_codes()) {
                        continue;
                    }
                    for version in a.versions().intersection(b.versions()) {
                        found.push(ConfigurationError::AmbiguousVersion {
                            endpoint: endpoint.name().to_string(),
                            direction: a.direction().to_string(),
                            version: version.clone(),
                        });
                    }
                }
            }
        }

        for (i, first) in self.endpoints.iter().enumerate() {
            for second in &self.endpoints[i + 1..] {
                if first.method() != second.method() || !first.route().overlaps(second.route()) {
                    continue;
                }
                for direction in [Direction::Request, Direction::Response] {
                    if first.handles(direction) && second.handles(direction) {
                        found.push(ConfigurationError::OverlappingRoutes {
                            first: first.route().to_string(),
                            second: second.route().to_string(),
                            method: first.method().to_string(),
                            direction: direction.to_string(),
                        });
                    }
                }
            }
        }

        found
    }
}

impl<'a> IntoIterator for &'a EndpointSet {
    type Item = &'a Endpoint;
    type IntoIter = std::slice::Iter<'a, Endpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.endpoints.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DefinitionDocument, EndpointDocument};
    use covenant_schema::SchemaCompiler;
    use serde_json::{json, Value};
    use std::cell::Cell;

    fn def(versions: &[&str], direction: Direction, schema: Value) -> DefinitionDocument {
        DefinitionDocument {
            versions: versions.iter().map(|v| v.to_string()).collect(),
            message_type: direction,
            status_codes: None,
            schema,
            examples: vec![],
        }
    }

    fn endpoint(name: &str, method: Method, route: &str, defs: Vec<DefinitionDocument>) -> Endpoint {
        Endpoint::from_document(
            &EndpointDocument {
                name: name.to_string(),
                route: route.to_string(),
                method,
                definitions: defs,
            },
            &SchemaCompiler::new(),
        )
        .unwrap()
    }

    fn projects() -> EndpointSet {
        EndpointSet::new(vec![endpoint(
            "project_list",
            Method::Get,
            "/users/:user_id/projects",
            vec![
                def(
                    &["1.0"],
                    Direction::Request,
                    json!({ "type": "object", "required": ["name"] }),
                ),
                def(
                    &["2.0"],
                    Direction::Request,
                    json!({ "type": "object", "required": ["name", "description"] }),
                ),
            ],
        )])
    }

    #[test]
    fn test_resolves_version_entry_and_path_params() {
        let set = projects();
        let resolution = set.find_definition(
            Method::Get,
            "/users/7/projects",
            Direction::Request,
            None,
            |_| Some("2.0".to_string()),
        );
        let m = resolution.found().unwrap();
        assert_eq!(m.endpoint.name(), "project_list");
        assert_eq!(m.version, "2.0");
        assert!(m.definition.supports("2.0"));
        assert_eq!(m.path_params["user_id"], "7");
    }

    #[test]
    fn test_unknown_path_never_invokes_resolver() {
        let set = projects();
        let calls = Cell::new(0);
        let resolution = set.find_definition(
            Method::Get,
            "/unknown",
            Direction::Request,
            None,
            |_| {
                calls.set(calls.get() + 1);
                Some("1.0".to_string())
            },
        );
        assert!(resolution.is_not_found());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_method_and_direction_are_part_of_the_structural_match() {
        let set = projects();
        assert!(set
            .find_definition(Method::Post, "/users/7/projects", Direction::Request, None, |_| {
                Some("1.0".to_string())
            })
            .is_not_found());
        assert!(set
            .find_definition(Method::Get, "/users/7/projects", Direction::Response, None, |_| {
                Some("1.0".to_string())
            })
            .is_not_found());
    }

    #[test]
    fn test_unsupported_version_reports_available_versions() {
        let set = projects();
        let resolution = set.find_definition(
            Method::Get,
            "/users/7/projects",
            Direction::Request,
            None,
            |_| Some("3.0".to_string()),
        );
        match resolution {
            Resolution::VersionUnavailable { requested, available, .. } => {
                assert_eq!(requested.as_deref(), Some("3.0"));
                assert_eq!(
                    available,
                    BTreeSet::from(["1.0".to_string(), "2.0".to_string()])
                );
            }
            other => panic!("expected VersionUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_undetermined_version_is_unavailable() {
        let set = projects();
        let resolution =
            set.find_definition(Method::Get, "/users/7/projects", Direction::Request, None, |_| None);
        assert!(matches!(
            resolution,
            Resolution::VersionUnavailable { requested: None, .. }
        ));
    }

    #[test]
    fn test_first_structural_match_wins_without_fallthrough() {
        let set = EndpointSet::new(vec![
            endpoint(
                "by_id",
                Method::Get,
                "/users/:id",
                vec![def(&["1.0"], Direction::Request, json!({}))],
            ),
            endpoint(
                "me",
                Method::Get,
                "/users/me",
                vec![def(&["2.0"], Direction::Request, json!({}))],
            ),
        ]);

        let found = set.find_definition(Method::Get, "/users/me", Direction::Request, None, |_| {
            Some("1.0".to_string())
        });
        assert_eq!(found.found().unwrap().endpoint.name(), "by_id");

        let unavailable =
            set.find_definition(Method::Get, "/users/me", Direction::Request, None, |e| {
                assert_eq!(e.name(), "by_id");
                Some("2.0".to_string())
            });
        assert!(unavailable.available_versions().is_some());
    }

    #[test]
    fn test_status_code_mismatch_is_not_found() {
        let mut created = def(&["1.0"], Direction::Response, json!({}));
        created.status_codes = Some(vec!["201".to_string()]);
        let set = EndpointSet::new(vec![endpoint("create", Method::Post, "/things", vec![created])]);

        let ok = set.find_definition(Method::Post, "/things", Direction::Response, Some(201), |_| {
            Some("1.0".to_string())
        });
        assert!(ok.found().is_some());

        let other = set.find_definition(Method::Post, "/things", Direction::Response, Some(500), |_| {
            Some("1.0".to_string())
        });
        assert!(other.is_not_found());
    }

    #[test]
    fn test_reports_ambiguities() {
        let set = EndpointSet::new(vec![
            endpoint(
                "by_id",
                Method::Get,
                "/users/:id",
                vec![
                    def(&["1.0", "1.1"], Direction::Request, json!({})),
                    def(&["1.1"], Direction::Request, json!({})),
                    def(&["1.1"], Direction::Response, json!({})),
                ],
            ),
            endpoint(
                "me",
                Method::Get,
                "/users/me",
                vec![def(&["1.0"], Direction::Request, json!({}))],
            ),
            endpoint(
                "delete_me",
                Method::Delete,
                "/users/me",
                vec![def(&["1.0"], Direction::Request, json!({}))],
            ),
        ]);

        let found = set.ambiguities();
        assert_eq!(found.len(), 2, "{found:?}");
        assert!(matches!(
            &found[0],
            ConfigurationError::AmbiguousVersion { version, .. } if version == "1.1"
        ));
        assert!(matches!(
            &found[1],
            ConfigurationError::OverlappingRoutes { first, second, .. }
                if first == "/users/:id" && second == "/users/me"
        ));
    }

    #[test]
    fn test_disjoint_registrations_are_unambiguous() {
        assert!(projects().ambiguities().is_empty());
    }
}
