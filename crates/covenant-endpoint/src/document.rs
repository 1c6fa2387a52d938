//! # Definition Documents
//!
//! The serialized form of an endpoint definition, as authored in YAML or
//! JSON:
//!
//! ```yaml
//! name: project_list
//! route: /users/:user_id/projects
//! method: GET
//! definitions:
//!   - versions: ["1.0"]
//!     message_type: request
//!     schema:
//!       type: object
//!       properties:
//!         name: { type: string }
//!     examples:
//!       - name: "some project"
//! ```
//!
//! Documents are plain data. Compiling one into an [`Endpoint`] is where
//! routes, status codes and schemas are checked.
//!
//! [`Endpoint`]: crate::endpoint::Endpoint

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use covenant_core::{ConfigurationError, Direction, Method};

/// A complete endpoint definition document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDocument {
    /// Identifier, unique within a configuration by convention.
    pub name: String,
    /// Route pattern with `:named` segments.
    pub route: String,
    /// HTTP verb.
    pub method: Method,
    /// Versioned definitions, in precedence order.
    pub definitions: Vec<DefinitionDocument>,
}

/// One versioned entry of an endpoint document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionDocument {
    /// Versions this entry describes. Bare integers (`2`) are accepted;
    /// other bare numbers must be quoted, since `1.10` and `1.1` parse to
    /// the same float.
    #[serde(deserialize_with = "version_names")]
    pub versions: Vec<String>,
    /// Direction of the message; `response` when omitted.
    #[serde(default)]
    pub message_type: Direction,
    /// Status codes a response entry governs; every code when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_codes: Option<Vec<String>>,
    /// JSON Schema for the message.
    pub schema: Value,
    /// Example payloads, expected to satisfy `schema`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
}

fn version_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|v| match v {
            Value::String(s) => Ok(s),
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
            Value::Number(n) => Err(serde::de::Error::custom(format!(
                "version {n} must be quoted (e.g. \"{n}\"); bare decimals lose their written form"
            ))),
            other => Err(serde::de::Error::custom(format!(
                "version must be a string or number, got {other}"
            ))),
        })
        .collect()
}

impl EndpointDocument {
    /// Parse a document from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::DocumentLoad` naming `source_name`.
    pub fn from_yaml_str(yaml: &str, source_name: &str) -> Result<Self, ConfigurationError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigurationError::DocumentLoad {
            source_name: source_name.to_string(),
            reason: format!("invalid YAML: {e}"),
        })
    }

    /// Parse a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::DocumentLoad` naming `source_name`.
    pub fn from_json_str(json: &str, source_name: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(json).map_err(|e| ConfigurationError::DocumentLoad {
            source_name: source_name.to_string(),
            reason: format!("invalid JSON: {e}"),
        })
    }

    /// Load a document from disk.
    ///
    /// Files ending in `.json` are parsed as JSON; anything else as YAML.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::DocumentLoad` if the file cannot be read
    /// or parsed.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let source_name = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigurationError::DocumentLoad {
                source_name: source_name.clone(),
                reason: format!("cannot read file: {e}"),
            })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content, &source_name),
            _ => Self::from_yaml_str(&content, &source_name),
        }
    }
}
