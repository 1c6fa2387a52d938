//! # covenant-cli — Command-Line Interface for covenant
//!
//! Provides the `covenant` binary for working with endpoint definition
//! documents outside a running service.
//!
//! ## Subcommands
//!
//! - `covenant check` — compile every schema and validate every example.
//! - `covenant resolve` — show which versioned definition governs a request.
//! - `covenant validate` — validate a parameter map or response body.
//!
//! ```bash
//! covenant check contracts/ --strict
//! covenant resolve contracts/ --method GET --path /users/42/projects --version 2.0
//! covenant validate contracts/ --method GET --path /users/42/projects \
//!     --version 2.0 --params '{"name": "apollo"}'
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from business logic.
//! - Handlers delegate to `covenant-endpoint`; no contract logic here.
//! - Handlers return the process exit code: 0 on success, 1 on a contract
//!   failure. Operational errors propagate as `anyhow::Error`.

pub mod check;
pub mod resolve;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use covenant_endpoint::{Configuration, ConfigurationBuilder};

/// Expand the command-line inputs into document paths.
///
/// Files are taken as given. Directories are walked recursively for
/// `.yml`, `.yaml` and `.json` files, in sorted order.
pub fn collect_documents(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    for input in inputs {
        if input.is_dir() {
            walk(input, &mut documents)?;
        } else {
            documents.push(input.clone());
        }
    }
    Ok(documents)
}

fn walk(dir: &Path, documents: &mut Vec<PathBuf>) -> Result<()> {
    let mut found = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read {}", dir.display()))?
            .path();
        if path.is_dir() {
            walk(&path, &mut found)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext, "yml" | "yaml" | "json"))
        {
            found.push(path);
        }
    }
    found.sort();
    documents.extend(found);
    Ok(())
}

/// Load every document under `inputs` into a configuration, applying
/// `customize` to the builder first.
pub fn load_configuration<F>(inputs: &[PathBuf], customize: F) -> Result<Configuration>
where
    F: FnOnce(&mut ConfigurationBuilder),
{
    let documents = collect_documents(inputs)?;
    if documents.is_empty() {
        anyhow::bail!("no endpoint definition documents found");
    }

    let mut builder = Configuration::builder();
    customize(&mut builder);
    for path in &documents {
        tracing::debug!(path = %path.display(), "loading endpoint document");
        builder.load_file(path);
    }
    builder
        .build()
        .context("failed to build contract configuration")
}
