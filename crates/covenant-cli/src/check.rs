//! # Check Subcommand
//!
//! Loads endpoint definition documents, compiles every schema, and
//! validates every example against the schema it belongs to.
//!
//! ```bash
//! covenant check contracts/
//! covenant check contracts/ --strict --reject-ambiguous
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use covenant_endpoint::AmbiguityPolicy;

use crate::load_configuration;

/// Arguments for the check subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Definition documents, or directories to search for them.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Compile schemas in strict mode: declared properties are required
    /// unless marked optional, and undeclared properties are rejected.
    #[arg(long)]
    pub strict: bool,

    /// Fail when registrations overlap instead of warning.
    #[arg(long)]
    pub reject_ambiguous: bool,
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let config = load_configuration(&args.files, |c| {
        c.strict_schemas(args.strict);
        if args.reject_ambiguous {
            c.ambiguity(AmbiguityPolicy::Reject);
        }
    })?;

    let mut examples = 0usize;
    let mut failures = 0usize;
    for endpoint in config.endpoints() {
        for definition in endpoint.definitions() {
            examples += definition.examples().len();
            let versions = definition
                .versions()
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            for (index, error) in definition.validate_examples() {
                failures += 1;
                println!(
                    "  FAIL  {} {} [{}] {} example #{index}",
                    endpoint.method(),
                    endpoint.route(),
                    versions,
                    definition.direction(),
                );
                println!("{}", error.violations());
            }
        }
    }

    for ambiguity in config.endpoints().ambiguities() {
        println!("  WARN  {ambiguity}");
    }

    println!();
    println!(
        "{} endpoint(s), {examples} example(s), {failures} failure(s)",
        config.endpoints().len()
    );
    Ok(if failures == 0 { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::contracts_dir;

    fn args(files: Vec<PathBuf>) -> CheckArgs {
        CheckArgs {
            files,
            strict: false,
            reject_ambiguous: true,
        }
    }

    #[test]
    fn test_repository_contracts_pass() {
        assert_eq!(run_check(&args(vec![contracts_dir()])).unwrap(), 0);
    }

    #[test]
    fn test_failing_example_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ping.yml");
        std::fs::write(
            &path,
            r#"
name: ping
route: /ping
method: GET
definitions:
  - versions: ["1.0"]
    schema: { type: object, required: [pong] }
    examples:
      - { pong: true }
      - {}
"#,
        )
        .unwrap();
        assert_eq!(run_check(&args(vec![path])).unwrap(), 1);
    }

    #[test]
    fn test_malformed_schema_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yml");
        std::fs::write(
            &path,
            "name: bad\nroute: /bad\nmethod: GET\ndefinitions:\n  - versions: [1]\n    schema: { type: 12 }\n",
        )
        .unwrap();
        assert!(run_check(&args(vec![path])).is_err());
    }
}
