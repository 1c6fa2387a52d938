//! Integration test: load every endpoint document under `contracts/` and
//! check it the way `covenant check` does.
//!
//! Every schema must compile, every example must satisfy its schema, and
//! the set must build under `AmbiguityPolicy::Reject`.

use std::path::{Path, PathBuf};

use covenant_core::{Direction, Method};
use covenant_endpoint::{
    AmbiguityPolicy, Configuration, EndpointDocument, Outcome, RequestContext, VersionSource,
};
use serde_json::json;

fn repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.pop(); // repo root
    dir
}

fn find_documents(dir: &Path) -> Vec<PathBuf> {
    let mut documents = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                documents.extend(find_documents(&path));
            } else if path
                .extension()
                .is_some_and(|ext| ext == "yml" || ext == "yaml" || ext == "json")
            {
                documents.push(path);
            }
        }
    }
    documents.sort();
    documents
}

fn load_all() -> Configuration {
    let mut builder = Configuration::builder();
    for path in find_documents(&repo_root().join("contracts")) {
        builder.load_file(&path);
    }
    builder
        .ambiguity(AmbiguityPolicy::Reject)
        .api_version(VersionSource::Header("Accept-Version".to_string()))
        .build()
        .unwrap()
}

#[test]
fn test_discover_contract_documents() {
    let documents = find_documents(&repo_root().join("contracts"));
    assert!(documents.len() >= 3, "found {documents:?}");
    for path in &documents {
        EndpointDocument::load_file(path)
            .unwrap_or_else(|e| panic!("{} failed to load: {e}", path.display()));
    }
}

#[test]
fn test_all_examples_satisfy_their_schemas() {
    let config = load_all();
    let mut failures = Vec::new();
    for endpoint in config.endpoints() {
        for definition in endpoint.definitions() {
            for (index, error) in definition.validate_examples() {
                failures.push(format!(
                    "{} {:?} example {index}: {error}",
                    endpoint.name(),
                    definition.versions()
                ));
            }
        }
    }
    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

#[test]
fn test_contracts_have_no_ambiguities() {
    let config = load_all();
    assert!(config.endpoints().ambiguities().is_empty());
    assert!(config.endpoints().get("project_list").is_some());
    assert!(config.endpoints().get("user_show").is_some());
}

#[test]
fn test_method_distinguishes_shared_routes() {
    let config = load_all();
    let list = config
        .find_definition(Method::Get, "/users/3/projects", Direction::Request, None, |_| {
            Some("1.0".to_string())
        })
        .into_found()
        .unwrap();
    let create = config
        .find_definition(Method::Post, "/users/3/projects", Direction::Request, None, |_| {
            Some("1.0".to_string())
        })
        .into_found()
        .unwrap();
    assert_eq!(list.endpoint.name(), "project_list");
    assert_eq!(create.endpoint.name(), "project_create");
}

#[test]
fn test_string_params_are_coerced_before_validation() {
    let config = load_all();
    let ctx = RequestContext::new(Method::Post, "/users/3/projects")
        .with_header("Accept-Version", "2.0")
        .with_param("name", "mercury")
        .with_param("public", "false");
    match config.evaluate_request(&ctx) {
        Outcome::Valid(params) => {
            assert_eq!(params, json!({ "user_id": 3, "name": "mercury", "public": false }));
        }
        other => panic!("expected Valid, got {other:?}"),
    }

    let bad = RequestContext::new(Method::Get, "/users/0/projects")
        .with_header("Accept-Version", "1.0")
        .with_param("name", "mercury");
    assert!(matches!(config.evaluate_request(&bad), Outcome::Invalid(_)));
}
