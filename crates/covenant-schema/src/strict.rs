//! # Strict Schemas
//!
//! Definition authors usually mean "exactly these fields". The strict
//! rewrite encodes that without repeating every property name:
//!
//! - every object schema with `properties` requires each listed property,
//!   unless the property schema carries `optional: true`;
//! - such an object rejects undeclared properties, unless the schema sets
//!   `additionalProperties` itself.
//!
//! The rewrite recurses only through keywords whose values are
//! subschemas, so data-valued keywords (`enum`, `const`, `default`,
//! `examples`) are never touched.

use serde_json::{Map, Value};

/// Keywords whose value is a single subschema (or, for `items`, possibly a
/// list of subschemas).
const SUBSCHEMA_KEYWORDS: &[&str] = &[
    "items",
    "additionalItems",
    "additionalProperties",
    "contains",
    "not",
    "if",
    "then",
    "else",
    "propertyNames",
    "unevaluatedItems",
    "unevaluatedProperties",
];

/// Keywords whose value is a list of subschemas.
const SUBSCHEMA_LIST_KEYWORDS: &[&str] = &["allOf", "anyOf", "oneOf", "prefixItems"];

/// Keywords whose value maps names to subschemas.
const SUBSCHEMA_MAP_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "definitions",
    "$defs",
    "dependentSchemas",
];

/// Return a strict copy of `schema`.
///
/// ```
/// use serde_json::json;
///
/// let strict = covenant_schema::make_strict(&json!({
///     "type": "object",
///     "properties": {
///         "name": { "type": "string" },
///         "nickname": { "type": "string", "optional": true }
///     }
/// }));
/// assert_eq!(strict["required"], json!(["name"]));
/// assert_eq!(strict["additionalProperties"], json!(false));
/// ```
pub fn make_strict(schema: &Value) -> Value {
    let mut schema = schema.clone();
    strictify(&mut schema);
    schema
}

fn strictify(node: &mut Value) {
    match node {
        Value::Array(items) => items.iter_mut().for_each(strictify),
        Value::Object(obj) => {
            close_object(obj);

            for key in SUBSCHEMA_MAP_KEYWORDS {
                if let Some(Value::Object(map)) = obj.get_mut(*key) {
                    map.values_mut().for_each(strictify);
                }
            }
            for key in SUBSCHEMA_KEYWORDS.iter().chain(SUBSCHEMA_LIST_KEYWORDS) {
                if let Some(sub) = obj.get_mut(*key) {
                    strictify(sub);
                }
            }
        }
        _ => {}
    }
}

fn close_object(obj: &mut Map<String, Value>) {
    let Some(props) = obj.get("properties").and_then(Value::as_object) else {
        return;
    };
    let mandatory: Vec<String> = props
        .iter()
        .filter(|(_, sub)| !is_optional(sub))
        .map(|(name, _)| name.clone())
        .collect();

    let mut required = obj
        .get("required")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    for name in mandatory {
        if !required.iter().any(|r| r.as_str() == Some(name.as_str())) {
            required.push(Value::String(name));
        }
    }
    if !required.is_empty() {
        obj.insert("required".to_string(), Value::Array(required));
    }

    obj.entry("additionalProperties")
        .or_insert(Value::Bool(false));
}

fn is_optional(property: &Value) -> bool {
    property
        .get("optional")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_objects_are_closed() {
        let strict = make_strict(&json!({
            "type": "object",
            "properties": {
                "owner": {
                    "type": "object",
                    "properties": { "id": { "type": "integer" } }
                },
                "tags": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": { "label": { "type": "string" } }
                    }
                }
            }
        }));
        assert_eq!(strict["required"], json!(["owner", "tags"]));
        assert_eq!(strict["properties"]["owner"]["required"], json!(["id"]));
        assert_eq!(
            strict["properties"]["tags"]["items"]["additionalProperties"],
            json!(false)
        );
    }

    #[test]
    fn test_explicit_additional_properties_is_kept() {
        let strict = make_strict(&json!({
            "properties": { "a": {} },
            "additionalProperties": { "type": "string" }
        }));
        assert_eq!(strict["additionalProperties"], json!({ "type": "string" }));
    }

    #[test]
    fn test_existing_required_entries_are_preserved_once() {
        let strict = make_strict(&json!({
            "properties": { "a": {}, "b": { "optional": true } },
            "required": ["b", "a"]
        }));
        assert_eq!(strict["required"], json!(["b", "a"]));
    }

    #[test]
    fn test_data_keywords_are_untouched() {
        let schema = json!({
            "enum": [{ "properties": { "x": {} } }],
            "default": { "properties": {} }
        });
        assert_eq!(make_strict(&schema), schema);
    }

    #[test]
    fn test_combinators_are_rewritten() {
        let strict = make_strict(&json!({
            "anyOf": [
                { "properties": { "a": {} } },
                { "properties": { "b": {} } }
            ]
        }));
        assert_eq!(strict["anyOf"][0]["required"], json!(["a"]));
        assert_eq!(strict["anyOf"][1]["required"], json!(["b"]));
    }
}
