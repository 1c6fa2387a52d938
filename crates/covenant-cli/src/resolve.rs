//! # Resolve Subcommand
//!
//! Shows which versioned definition governs a request, or why none does.
//!
//! ```bash
//! covenant resolve contracts/ --method GET --path /users/42/projects --version 1.0
//! covenant resolve contracts/ --method POST --path /users/42/projects \
//!     --version 1.0 --direction response --status 201
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use covenant_core::{Direction, Method};
use covenant_endpoint::Resolution;

use crate::load_configuration;

/// Arguments for the resolve subcommand.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Definition documents, or directories to search for them.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// HTTP method of the request.
    #[arg(long)]
    pub method: Method,

    /// Concrete request path, e.g. /users/42/projects.
    #[arg(long)]
    pub path: String,

    /// Requested API version. Omit to see the advertised versions.
    #[arg(long)]
    pub version: Option<String>,

    /// Message direction.
    #[arg(long, default_value = "request")]
    pub direction: Direction,

    /// Response status code (response direction only).
    #[arg(long)]
    pub status: Option<u16>,
}

/// Execute the resolve subcommand.
pub fn run_resolve(args: &ResolveArgs) -> Result<u8> {
    let config = load_configuration(&args.files, |_| {})?;
    let resolution = config.find_definition(
        args.method,
        &args.path,
        args.direction,
        args.status,
        |_| args.version.clone(),
    );
    println!("{}", describe(&resolution));
    Ok(if resolution.found().is_some() { 0 } else { 1 })
}

/// Human-readable report of a resolution.
pub fn describe(resolution: &Resolution<'_>) -> String {
    match resolution {
        Resolution::Found(matched) => {
            let definition = matched.definition;
            let mut lines = vec![
                format!("endpoint:     {}", matched.endpoint.name()),
                format!("route:        {}", matched.endpoint.route()),
                format!("version:      {}", matched.version),
                format!("direction:    {}", definition.direction()),
                format!("status codes: {}", definition.status_codes()),
            ];
            for (name, value) in &matched.path_params {
                lines.push(format!("path param:   {name} = {value}"));
            }
            let schema = serde_json::to_string_pretty(definition.schema())
                .unwrap_or_else(|_| definition.schema().to_string());
            lines.push(format!("schema:\n{schema}"));
            lines.join("\n")
        }
        Resolution::NotFound => "no definition governs this request".to_string(),
        Resolution::VersionUnavailable {
            endpoint,
            requested,
            available,
        } => {
            let available = available
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            match requested {
                Some(version) => format!(
                    "endpoint {} does not offer version {version}; available versions: {available}",
                    endpoint.name()
                ),
                None => format!(
                    "endpoint {} requires a version; available versions: {available}",
                    endpoint.name()
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::contracts_dir;

    fn args(version: Option<&str>) -> ResolveArgs {
        ResolveArgs {
            files: vec![contracts_dir()],
            method: Method::Get,
            path: "/users/42/projects".to_string(),
            version: version.map(str::to_string),
            direction: Direction::Request,
            status: None,
        }
    }

    #[test]
    fn test_known_version_resolves() {
        assert_eq!(run_resolve(&args(Some("2.0"))).unwrap(), 0);
    }

    #[test]
    fn test_unknown_version_fails() {
        assert_eq!(run_resolve(&args(Some("9.0"))).unwrap(), 1);
        assert_eq!(run_resolve(&args(None)).unwrap(), 1);
    }

    #[test]
    fn test_describes_each_outcome() {
        let config = load_configuration(&[contracts_dir()], |_| {}).unwrap();

        let found = config.find_definition(
            Method::Get,
            "/users/42/projects",
            Direction::Request,
            None,
            |_| Some("1.0".to_string()),
        );
        let text = describe(&found);
        assert!(text.contains("endpoint:     project_list"), "{text}");
        assert!(text.contains("path param:   user_id = 42"), "{text}");

        let unavailable = config.find_definition(
            Method::Get,
            "/users/42/projects",
            Direction::Request,
            None,
            |_| Some("9.0".to_string()),
        );
        assert_eq!(
            describe(&unavailable),
            "endpoint project_list does not offer version 9.0; available versions: 1.0, 2.0"
        );

        let missing =
            config.find_definition(Method::Get, "/nowhere", Direction::Request, None, |_| None);
        assert_eq!(describe(&missing), "no definition governs this request");
    }
}
