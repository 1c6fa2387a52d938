//! # Parameter Preparation
//!
//! Web frameworks hand over parameters as strings, mixed with routing
//! artifacts the client never sent. Two steps prepare such a map for
//! schema evaluation:
//!
//! 1. [`strip_meta_params`] removes transport meta-parameters (e.g. `splat`,
//!    `captures`) that the schema does not declare. A schema that does
//!    declare one keeps it and validates it like any other field.
//! 2. [`coerce_params`] converts string values to the scalar type the
//!    schema declares for them. A string that does not parse is left as it
//!    is, so the evaluator reports the type violation with the original
//!    value.

use serde_json::{Map, Number, Value};

/// Remove meta-parameters not declared under the schema's `properties`.
///
/// Returns the names that were removed.
pub fn strip_meta_params<S: AsRef<str>>(
    params: &mut Map<String, Value>,
    schema: &Value,
    meta_params: &[S],
) -> Vec<String> {
    let declared = schema.get("properties").and_then(Value::as_object);
    meta_params
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !declared.is_some_and(|props| props.contains_key(*name)))
        .filter(|name| params.remove(*name).is_some())
        .map(str::to_string)
        .collect()
}

/// Convert string parameters to the scalar types their schema declares.
///
/// Recurses into nested objects (`properties`) and arrays (`items`). Only
/// `integer`, `number`, `boolean` and `null` are coerced; a property whose
/// type list includes `string` keeps its string value.
pub fn coerce_params(params: &mut Map<String, Value>, schema: &Value) {
    coerce_object(params, schema);
}

fn coerce_object(object: &mut Map<String, Value>, schema: &Value) {
    let Some(props) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };
    for (name, value) in object.iter_mut() {
        if let Some(prop_schema) = props.get(name) {
            coerce_value(value, prop_schema);
        }
    }
}

fn coerce_value(value: &mut Value, schema: &Value) {
    match value {
        Value::String(s) => {
            if let Some(coerced) = coerce_string(s, &declared_types(schema)) {
                *value = coerced;
            }
        }
        Value::Array(items) => {
            if let Some(item_schema) = schema.get("items").filter(|i| i.is_object()) {
                items.iter_mut().for_each(|item| coerce_value(item, item_schema));
            }
        }
        Value::Object(object) => coerce_object(object, schema),
        _ => {}
    }
}

fn declared_types(schema: &Value) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn coerce_string(raw: &str, types: &[&str]) -> Option<Value> {
    if types.contains(&"string") {
        return None;
    }
    types.iter().find_map(|t| match *t {
        "integer" => raw.parse::<i64>().ok().map(Value::from),
        "number" => raw
            .parse::<i64>()
            .ok()
            .map(Value::from)
            .or_else(|| {
                raw.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
            }),
        "boolean" => match raw {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        "null" if raw.is_empty() => Some(Value::Null),
        _ => None,
    })
}
