//! Schema validation helpers.
//!
//! This module validates a configuration document (`serde_json::Value`)
//! against a [`Schema`]: presence of required attributes, attribute types,
//! and the value constraints attached through [`Validator`]s.
//!
//! # Example
//!
//! ```
//! use pingdirectory_provider::schema::{Attribute, Schema, Validator};
//! use pingdirectory_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute(
//!         "type",
//!         Attribute::required_string().with_validator(Validator::one_of(&["access", "default"])),
//!     );
//!
//! let diagnostics = validate(&schema, &json!({"name": "m", "type": "access"}));
//! assert!(diagnostics.is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "m", "type": "audit"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("type".to_string()));
//! ```

use crate::schema::{Attribute, AttributeType, Diagnostic, Schema, Validator};
use serde_json::Value;

/// Validate a configuration document against a schema.
///
/// Returns a list of diagnostics; an empty list means the value is valid.
///
/// # Validation Rules
///
/// - Required attributes must be present and non-null
/// - Computed-only attributes must not be configured
/// - Attribute types must match the schema
/// - Validators are checked for known values
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return diagnostics,
        _ => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(value))),
            );
            return diagnostics;
        },
    };

    for (name, attr) in &schema.attributes {
        validate_attribute(attr, obj.get(name), name, &mut diagnostics);
    }

    for name in obj.keys() {
        if !schema.attributes.contains_key(name) {
            diagnostics.push(
                Diagnostic::error(format!("Unsupported argument '{}'", name))
                    .with_detail("An argument with this name is not expected here")
                    .with_attribute(name.as_str()),
            );
        }
    }

    diagnostics
}

/// Validate a document, returning Ok if valid or Err with the diagnostics.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a document is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let configurable = attr.flags.optional || attr.flags.required;

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        },
        Some(_) if !configurable => {
            diagnostics.push(
                Diagnostic::error(format!("Invalid configuration for '{}'", path))
                    .with_detail("This attribute is computed by the provider and cannot be set")
                    .with_attribute(path),
            );
        },
        Some(v) => {
            if validate_attribute_type(&attr.attr_type, v, path, diagnostics) {
                for validator in &attr.validators {
                    validate_value(validator, v, path, diagnostics);
                }
            }
        },
    }
}

/// Returns whether the value had the expected type.
fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> bool {
    let before = diagnostics.len();
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        },
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        AttributeType::Set(element_type) => {
            // Sets are represented as arrays in JSON
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
                if has_duplicates(arr) {
                    diagnostics.push(
                        Diagnostic::error(format!("Duplicate set element in '{}'", path))
                            .with_attribute(path),
                    );
                }
            } else {
                diagnostics.push(type_error(path, "set", value));
            }
        },
    }
    diagnostics.len() == before
}

fn validate_value(
    validator: &Validator,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // Set validators apply to each element
    if let Some(arr) = value.as_array() {
        for elem in arr {
            validate_value(validator, elem, path, diagnostics);
        }
        return;
    }

    match validator {
        Validator::OneOf(allowed) => {
            if let Some(s) = value.as_str() {
                if !allowed.iter().any(|a| a == s) {
                    diagnostics.push(
                        Diagnostic::error(format!("Invalid attribute value for '{}'", path))
                            .with_detail(format!(
                                "Value must be one of: {}, got: \"{}\"",
                                allowed
                                    .iter()
                                    .map(|a| format!("\"{}\"", a))
                                    .collect::<Vec<_>>()
                                    .join(", "),
                                s
                            ))
                            .with_attribute(path),
                    );
                }
            }
        },
        Validator::AtLeast(min) => {
            if let Some(n) = value.as_i64() {
                if n < *min {
                    diagnostics.push(
                        Diagnostic::error(format!("Invalid attribute value for '{}'", path))
                            .with_detail(format!("Value must be at least {}, got: {}", min, n))
                            .with_attribute(path),
                    );
                }
            }
        },
        Validator::Between(min, max) => {
            if let Some(n) = value.as_i64() {
                if n < *min || n > *max {
                    diagnostics.push(
                        Diagnostic::error(format!("Invalid attribute value for '{}'", path))
                            .with_detail(format!(
                                "Value must be between {} and {}, got: {}",
                                min, max, n
                            ))
                            .with_attribute(path),
                    );
                }
            }
        },
    }
}

fn has_duplicates(values: &[Value]) -> bool {
    values
        .iter()
        .enumerate()
        .any(|(i, v)| values[..i].contains(v))
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

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.as_u64().is_some_and(|u| u <= i64::MAX as u64),
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for '{}'", path))
        .with_detail(format!(
            "Expected {}, got {}",
            expected,
            value_type_name(got)
        ))
        .with_attribute(path)
}
