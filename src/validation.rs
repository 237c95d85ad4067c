//! Schema validation helpers.
//!
//! Validates a `serde_json::Value` against a [`Schema`] and reports problems
//! as attribute-scoped [`Diagnostic`]s.
//!
//! # Example
//!
//! ```
//! use custom_provider::schema::{Attribute, AttributeType, Schema};
//! use custom_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::new()
//!     .with_attribute("name", Attribute::required(AttributeType::String))
//!     .with_attribute("enabled", Attribute::optional(AttributeType::Bool));
//!
//! let diagnostics = validate(&schema, &json!({"name": "svc-a", "enabled": true}));
//! assert!(diagnostics.is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "svc-a", "enabled": "yes"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("enabled".to_string()));
//! ```

use crate::schema::{Attribute, AttributeType, Diagnostic, Presence, Schema};
use serde_json::Value;

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - The value must be an object (or null, which validates nothing)
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed attributes are skipped (the backend sets these)
/// - Attribute types must match the schema; map values must be strings
/// - Attributes not declared in the schema are rejected
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return Vec::new(),
        _ => {
            return vec![Diagnostic::error("Expected object")
                .with_detail(format!("Got {}", value_type_name(value)))];
        }
    };

    let mut diagnostics: Vec<Diagnostic> = schema
        .attributes
        .iter()
        .filter(|(_, attr)| attr.is_configurable())
        .flat_map(|(name, attr)| check_attribute(name, attr, obj.get(name)))
        .collect();

    diagnostics.extend(
        obj.keys()
            .filter(|key| !schema.attributes.contains_key(key.as_str()))
            .map(|key| {
                Diagnostic::attribute_error(
                    key,
                    format!("Unsupported attribute '{}'", key),
                    "This attribute is not defined in the schema",
                )
            }),
    );

    diagnostics
}

/// Validate a JSON value against a schema, returning Ok if valid or Err with diagnostics.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn check_attribute(path: &str, attr: &Attribute, value: Option<&Value>) -> Vec<Diagnostic> {
    match value {
        None | Some(Value::Null) if attr.presence == Presence::Required => {
            vec![Diagnostic::attribute_error(
                path,
                format!("Missing required attribute '{}'", path),
                "This attribute is required and must be provided",
            )]
        }
        None | Some(Value::Null) => Vec::new(),
        Some(v) => check_type(path, attr.kind, v),
    }
}

fn check_type(path: &str, kind: AttributeType, value: &Value) -> Vec<Diagnostic> {
    let matches = match kind {
        AttributeType::String => value.is_string(),
        AttributeType::Bool => value.is_boolean(),
        AttributeType::StringMap => {
            let Some(entries) = value.as_object() else {
                return vec![type_error(path, kind, value)];
            };
            return entries
                .iter()
                .filter(|(_, v)| !v.is_string())
                .map(|(key, v)| type_error(&format!("{}.{}", path, key), AttributeType::String, v))
                .collect();
        }
    };

    if matches {
        Vec::new()
    } else {
        vec![type_error(path, kind, value)]
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_error(path: &str, expected: AttributeType, got: &Value) -> Diagnostic {
    Diagnostic::attribute_error(
        path,
        format!("Invalid type for attribute '{}'", path),
        format!("Expected {}, got {}", expected.name(), value_type_name(got)),
    )
}
