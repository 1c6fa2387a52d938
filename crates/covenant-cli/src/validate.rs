//! # Validate Subcommand
//!
//! Validates request parameters (or, with `--status`, a response body)
//! against the definition that governs them, and prints every violation.
//!
//! Request parameters go through the same preparation as at runtime: path
//! parameters are merged in, meta-parameters stripped and strings coerced.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use covenant_core::Method;
use covenant_endpoint::{Outcome, RequestContext, VersionSource};

use crate::load_configuration;

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Definition documents, or directories to search for them.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// HTTP method of the request.
    #[arg(long)]
    pub method: Method,

    /// Concrete request path, e.g. /users/42/projects.
    #[arg(long)]
    pub path: String,

    /// API version to validate against.
    #[arg(long)]
    pub version: String,

    /// JSON payload: the parameter object, or the response body with
    /// --status.
    #[arg(long)]
    pub params: String,

    /// Validate as a response with this status code.
    #[arg(long)]
    pub status: Option<u16>,

    /// Compile schemas in strict mode.
    #[arg(long)]
    pub strict: bool,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let payload: Value =
        serde_json::from_str(&args.params).context("--params is not valid JSON")?;

    let config = load_configuration(&args.files, |c| {
        c.api_version(VersionSource::Fixed(args.version.clone()))
            .strict_schemas(args.strict)
            .validate_response_if(|_, _| true);
    })?;

    let outcome = match args.status {
        Some(status) => {
            let ctx = RequestContext::new(args.method, args.path.as_str());
            config.validate_response(&ctx, status, &payload)
        }
        None => {
            let Value::Object(params) = payload else {
                anyhow::bail!("--params must be a JSON object for request validation");
            };
            let ctx = RequestContext::new(args.method, args.path.as_str()).with_params(params);
            config.evaluate_request(&ctx)
        }
    };

    println!("{}", report(&outcome));
    Ok(if matches!(outcome, Outcome::Valid(_)) { 0 } else { 1 })
}

/// Human-readable report of an outcome.
pub fn report(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Valid(payload) => {
            let pretty =
                serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
            format!("valid\n{pretty}")
        }
        Outcome::Invalid(error) => format!(
            "invalid: {} violation(s)\n{}",
            error.violations().len(),
            error.violations()
        ),
        Outcome::NotFound => "no definition governs this message".to_string(),
        Outcome::VersionUnavailable {
            requested,
            available,
        } => format!(
            "version {} is unavailable; available versions: {}",
            requested.as_deref().unwrap_or("(none)"),
            available.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
        ),
        Outcome::Skipped => "skipped".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::contracts_dir;

    fn args(version: &str, params: &str) -> ValidateArgs {
        ValidateArgs {
            files: vec![contracts_dir()],
            method: Method::Get,
            path: "/users/42/projects".to_string(),
            version: version.to_string(),
            params: params.to_string(),
            status: None,
            strict: false,
        }
    }

    #[test]
    fn test_valid_request_exits_zero() {
        assert_eq!(run_validate(&args("1.0", r#"{"name": "x"}"#)).unwrap(), 0);
    }

    #[test]
    fn test_invalid_request_exits_one() {
        assert_eq!(run_validate(&args("2.0", r#"{"name": "x"}"#)).unwrap(), 1);
        assert_eq!(run_validate(&args("3.0", r#"{"name": "x"}"#)).unwrap(), 1);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(run_validate(&args("1.0", "{name")).is_err());
        assert!(run_validate(&args("1.0", "[1, 2]")).is_err());
    }

    #[test]
    fn test_response_bodies_are_validated_by_status() {
        let mut response = args("1.0", r#"[{"id": 1, "name": "apollo"}]"#);
        response.status = Some(200);
        assert_eq!(run_validate(&response).unwrap(), 0);

        response.params = r#"[{"id": "one"}]"#.to_string();
        assert_eq!(run_validate(&response).unwrap(), 1);
    }

    #[test]
    fn test_report_lists_violations() {
        let config = load_configuration(&[contracts_dir()], |c| {
            c.api_version(VersionSource::Fixed("2.0".to_string()));
        })
        .unwrap();
        let ctx = RequestContext::new(Method::Get, "/users/42/projects");
        let text = report(&config.evaluate_request(&ctx));
        assert!(text.starts_with("invalid: 2 violation(s)"), "{text}");
    }
}
