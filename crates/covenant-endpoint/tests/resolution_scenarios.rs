//! Integration test: end-to-end resolution and validation through a
//! published `Configuration`.
//!
//! Covers the project-list scenario (two request versions with different
//! required fields), unknown paths, call counting on the version callback,
//! idempotence, and isolation of customized duplicates.

use std::cell::Cell;
use std::collections::BTreeSet;

use covenant_core::{Direction, Method};
use covenant_endpoint::{
    Configuration, ContractError, EndpointDocument, Outcome, RequestContext, RequestScope,
    Resolution, VersionSource,
};
use proptest::prelude::*;
use serde_json::json;

const PROJECT_LIST: &str = r#"
name: project_list
route: /users/:user_id/projects
method: GET
definitions:
  - versions: ["1.0"]
    message_type: request
    schema:
      type: object
      properties:
        name: { type: string }
      required: [name]
  - versions: ["2.0"]
    message_type: request
    schema:
      type: object
      properties:
        name: { type: string }
        description: { type: string }
      required: [name, description]
"#;

fn project_list() -> EndpointDocument {
    EndpointDocument::from_yaml_str(PROJECT_LIST, "project_list.yml").unwrap()
}

fn configuration() -> Configuration {
    Configuration::default()
        .customized_duplicate(|c| {
            c.endpoint(project_list())
                .api_version(VersionSource::Header("Accept-Version".to_string()));
        })
        .unwrap()
}

fn request(version: &str, name: &str) -> RequestContext {
    RequestContext::new(Method::Get, "/users/42/projects")
        .with_header("Accept-Version", version)
        .with_param("name", name)
}

fn versions(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|v| v.to_string()).collect()
}

#[test]
fn test_version_one_accepts_name_only() {
    assert!(matches!(
        configuration().evaluate_request(&request("1.0", "x")),
        Outcome::Valid(_)
    ));
}

#[test]
fn test_version_two_requires_description() {
    match configuration().evaluate_request(&request("2.0", "x")) {
        Outcome::Invalid(err) => {
            assert_eq!(err.violations().len(), 1);
            assert!(err.to_string().contains("description"), "{err}");
        }
        other => panic!("expected Invalid, got {other:?}"),
    }
}

#[test]
fn test_version_three_is_unavailable_with_advertised_versions() {
    match configuration().evaluate_request(&request("3.0", "x")) {
        Outcome::VersionUnavailable {
            requested,
            available,
        } => {
            assert_eq!(requested.as_deref(), Some("3.0"));
            assert_eq!(available, versions(&["1.0", "2.0"]));
        }
        other => panic!("expected VersionUnavailable, got {other:?}"),
    }
}

#[test]
fn test_version_three_through_request_scope_uses_default_handler() {
    let config = configuration();
    let scope = RequestScope::new(&config, request("3.0", "x"));
    match scope.endpoint_definition() {
        Err(ContractError::VersionUnavailable {
            requested,
            available,
        }) => {
            assert_eq!(requested.as_deref(), Some("3.0"));
            assert_eq!(available, versions(&["1.0", "2.0"]));
        }
        other => panic!("expected VersionUnavailable, got {other:?}"),
    }
}

#[test]
fn test_unknown_path_never_calls_the_version_callback() {
    let config = configuration();
    let calls = Cell::new(0);
    let resolution = config.find_definition(
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
fn test_structural_match_calls_the_version_callback_once() {
    let config = configuration();
    let calls = Cell::new(0);
    let resolution = config.find_definition(
        Method::Get,
        "/users/1/projects",
        Direction::Request,
        None,
        |endpoint| {
            calls.set(calls.get() + 1);
            assert_eq!(endpoint.name(), "project_list");
            Some("2.0".to_string())
        },
    );
    assert!(resolution.found().is_some());
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_custom_version_source_negotiates_latest() {
    let config = configuration()
        .customized_duplicate(|c| {
            c.api_version(VersionSource::custom(|_, endpoint| {
                endpoint
                    .available_versions(Direction::Request)
                    .into_iter()
                    .next_back()
            }));
        })
        .unwrap();
    let ctx = RequestContext::new(Method::Get, "/users/42/projects").with_param("name", "x");
    assert!(matches!(config.evaluate_request(&ctx), Outcome::Invalid(_)));
}

#[test]
fn test_repeated_evaluation_is_idempotent() {
    let config = configuration();
    let ctx = request("2.0", "x");
    let first = format!("{:?}", config.evaluate_request(&ctx));
    let second = format!("{:?}", config.evaluate_request(&ctx));
    assert_eq!(first, second);
}

#[test]
fn test_duplicates_do_not_affect_each_other() {
    let base = configuration();
    let fixed = base
        .customized_duplicate(|c| {
            c.api_version(VersionSource::Fixed("1.0".to_string()));
        })
        .unwrap();
    let empty = fixed
        .customized_duplicate(|c| {
            c.clear_endpoints();
        })
        .unwrap();

    let no_header = RequestContext::new(Method::Get, "/users/42/projects").with_param("name", "x");
    assert!(matches!(
        base.evaluate_request(&no_header),
        Outcome::VersionUnavailable { requested: None, .. }
    ));
    assert!(matches!(fixed.evaluate_request(&no_header), Outcome::Valid(_)));
    assert!(matches!(empty.evaluate_request(&no_header), Outcome::NotFound));
    assert_eq!(base.endpoints().len(), 1);
}

#[test]
fn test_configuration_is_shared_across_threads() {
    let config = configuration();
    std::thread::scope(|s| {
        for i in 0..4 {
            let config = &config;
            s.spawn(move || {
                let version = if i % 2 == 0 { "1.0" } else { "2.0" };
                let scope = RequestScope::new(config, request(version, "x"));
                let outcome = scope.validated_params();
                assert_eq!(outcome.is_ok(), version == "1.0");
            });
        }
    });
}

proptest! {
    /// Every declared version of a registered endpoint resolves to the
    /// entry declaring it, for any path matching the route.
    #[test]
    fn test_declared_versions_resolve_to_their_entry(
        user_id in "[1-9][0-9]{0,6}",
        pick_second in any::<bool>(),
    ) {
        let config = configuration();
        let version = if pick_second { "2.0" } else { "1.0" };
        let path = format!("/users/{user_id}/projects");
        let resolution = config.find_definition(
            Method::Get,
            &path,
            Direction::Request,
            None,
            |_| Some(version.to_string()),
        );
        let Resolution::Found(matched) = resolution else {
            return Err(TestCaseError::fail("expected a definition"));
        };
        prop_assert!(matched.definition.supports(version));
        prop_assert_eq!(matched.path_params.get("user_id"), Some(&user_id));
    }

    /// Undeclared versions report exactly the union of declared versions.
    #[test]
    fn test_undeclared_versions_report_the_union(version in "[3-9]\\.[0-9]") {
        let config = configuration();
        let expected = versions(&["1.0", "2.0"]);
        let resolution = config.find_definition(
            Method::Get,
            "/users/1/projects",
            Direction::Request,
            None,
            |_| Some(version.clone()),
        );
        prop_assert_eq!(resolution.available_versions(), Some(&expected));
    }
}

#[test]
fn test_response_definitions_follow_status_codes() {
    let doc = EndpointDocument::from_json_str(
        &json!({
            "name": "project_create",
            "route": "/projects",
            "method": "POST",
            "definitions": [
                { "versions": ["1.0"], "status_codes": ["201"], "schema": { "type": "object", "required": ["id"] } },
                { "versions": ["1.0"], "status_codes": ["4xx"], "schema": { "type": "object", "required": ["error"] } }
            ]
        })
        .to_string(),
        "project_create.json",
    )
    .unwrap();
    let config = Configuration::builder()
        .endpoint(doc)
        .api_version(VersionSource::Fixed("1.0".to_string()))
        .validate_response_if(|_, _| true)
        .build()
        .unwrap();

    let ctx = RequestContext::new(Method::Post, "/projects");
    assert!(matches!(
        config.validate_response(&ctx, 201, &json!({ "id": 1 })),
        Outcome::Valid(_)
    ));
    assert!(matches!(
        config.validate_response(&ctx, 422, &json!({ "error": "taken" })),
        Outcome::Valid(_)
    ));
    assert!(matches!(
        config.validate_response(&ctx, 422, &json!({ "id": 1 })),
        Outcome::Invalid(_)
    ));
    assert!(matches!(
        config.validate_response(&ctx, 500, &json!({})),
        Outcome::NotFound
    ));
}
