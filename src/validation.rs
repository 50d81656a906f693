//! Schema validation helpers.
//!
//! Resource and data source configuration arrives as `serde_json::Value`.
//! [`validate`] checks it against a [`Schema`] before any remote call is made
//! and reports every problem as a [`Diagnostic`].
//!
//! # Example
//!
//! ```
//! use apptrust_provider::schema::{Attribute, Schema};
//! use apptrust_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("application_name", Attribute::required_string().with_length(1, 255))
//!     .with_attribute(
//!         "criticality",
//!         Attribute::optional_computed_string().with_one_of(&["unspecified", "high"]),
//!     );
//!
//! let diagnostics = validate(&schema, &json!({"application_name": "Payments"}));
//! assert!(diagnostics.is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"application_name": "", "criticality": "extreme"}));
//! assert_eq!(diagnostics.len(), 2);
//! ```

use crate::error::ProviderError;
use crate::schema::{summarize_errors, Attribute, AttributeType, Diagnostic, DiagnosticSeverity, Schema};
use serde_json::Value;
use std::collections::BTreeMap;

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed-only attributes are skipped (the provider sets these)
/// - Attribute types must match the schema
/// - Enumerated strings must be one of the allowed values
/// - String lengths must fall within the declared bounds
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

/// Validate configuration and fold any errors into [`ProviderError::Validation`].
pub fn ensure_valid(schema: &Schema, value: &Value) -> Result<(), ProviderError> {
    match summarize_errors(&validate(schema, value)) {
        Some(message) => Err(ProviderError::Validation(message)),
        None => Ok(()),
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // Skip computed-only attributes (provider sets these)
    if attr.flags.computed && !attr.flags.optional && !attr.flags.required {
        return;
    }

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
        Some(v) => {
            let before = diagnostics.len();
            validate_attribute_type(&attr.attr_type, v, path, diagnostics);
            if diagnostics.len() == before {
                if let Some(s) = v.as_str() {
                    validate_string_constraints(attr, s, path, diagnostics);
                }
            }
        },
    }
}

fn validate_string_constraints(
    attr: &Attribute,
    value: &str,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if !attr.one_of.is_empty() && !attr.one_of.iter().any(|allowed| allowed == value) {
        diagnostics.push(
            Diagnostic::error(format!("Invalid value for attribute '{}'", path))
                .with_detail(format!(
                    "Expected one of [{}], got \"{}\"",
                    attr.one_of.join(", "),
                    value
                ))
                .with_attribute(path),
        );
    }

    if let Some((min, max)) = attr.length {
        let len = value.chars().count();
        if len < min || len > max {
            diagnostics.push(
                Diagnostic::error(format!("Invalid length for attribute '{}'", path))
                    .with_detail(format!(
                        "Expected between {} and {} characters, got {}",
                        min, max, len
                    ))
                    .with_attribute(path),
            );
        }
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
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
        AttributeType::List(element_type) => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "list", value));
            }
        },
        AttributeType::Map(value_type) => {
            if let Some(obj) = value.as_object() {
                for (key, val) in obj {
                    let key_path = format!("{}.{}", path, key);
                    validate_attribute_type(value_type, val, &key_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "map", value));
            }
        },
        AttributeType::Object(attrs) => {
            if let Some(obj) = value.as_object() {
                validate_object_type(attrs, obj, path, diagnostics);
            } else {
                diagnostics.push(type_error(path, "object", value));
            }
        },
    }
}

fn validate_object_type(
    attrs: &BTreeMap<String, AttributeType>,
    obj: &serde_json::Map<String, Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (name, attr_type) in attrs {
        let attr_path = format!("{}.{}", path, name);
        match obj.get(name) {
            None | Some(Value::Null) => {},
            Some(value) => validate_attribute_type(attr_type, value, &attr_path, diagnostics),
        }
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

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            if n.is_i64() {
                true
            } else if let Some(f) = n.as_f64() {
                f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64
            } else {
                false
            }
        },
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic {
        severity: DiagnosticSeverity::Error,
        summary: format!("Invalid type for attribute '{}'", path),
        detail: Some(format!(
            "Expected {}, got {}",
            expected,
            value_type_name(got)
        )),
        attribute: Some(path.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeFlags, Schema};
    use serde_json::json;

    #[test]
    fn test_validate_required_string() {
        let schema = Schema::v0().with_attribute("application_name", Attribute::required_string());

        let diagnostics = validate(&schema, &json!({"application_name": "App One"}));
        assert!(diagnostics.is_empty());

        // Missing required
        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("application_name".to_string()));

        // Null value
        let diagnostics = validate(&schema, &json!({"application_name": null}));
        assert_eq!(diagnostics.len(), 1);

        // Wrong type
        let diagnostics = validate(&schema, &json!({"application_name": 123}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_optional_attribute() {
        let schema = Schema::v0().with_attribute("limit", Attribute::optional_int64());

        assert!(validate(&schema, &json!({"limit": 42})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"limit": null})).is_empty());
        assert!(validate(&schema, &json!({"limit": 42.0})).is_empty());
        assert_eq!(validate(&schema, &json!({"limit": 42.5})).len(), 1);
        assert_eq!(validate(&schema, &json!({"limit": "42"})).len(), 1);
    }

    #[test]
    fn test_validate_computed_attribute_skipped() {
        let schema = Schema::v0().with_attribute("id", Attribute::computed_string());

        assert!(validate(&schema, &json!({})).is_empty());
        // Even with wrong type, we don't validate computed-only attrs
        assert!(validate(&schema, &json!({"id": 123})).is_empty());
    }

    #[test]
    fn test_validate_list_and_map() {
        let schema = Schema::v0()
            .with_attribute("user_owners", Attribute::optional_string_list())
            .with_attribute("labels", Attribute::optional_string_map());

        assert!(validate(&schema, &json!({"user_owners": [], "labels": {}})).is_empty());

        let diagnostics = validate(&schema, &json!({"user_owners": ["a", 1]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("user_owners.1".to_string()));

        let diagnostics = validate(&schema, &json!({"labels": {"env": "prod", "tier": 2}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("labels.tier".to_string()));

        assert_eq!(validate(&schema, &json!({"labels": ["env"]})).len(), 1);
    }

    #[test]
    fn test_validate_list_of_objects() {
        let schema = Schema::v0().with_attribute(
            "source_builds",
            Attribute::new(
                AttributeType::list(AttributeType::object([
                    ("name", AttributeType::String),
                    ("number", AttributeType::String),
                    ("include_dependencies", AttributeType::Bool),
                ])),
                AttributeFlags::optional(),
            ),
        );

        let ok = json!({"source_builds": [{"name": "ci", "number": "7", "include_dependencies": null}]});
        assert!(validate(&schema, &ok).is_empty());

        let bad = json!({"source_builds": [{"name": "ci", "number": 7}]});
        let diagnostics = validate(&schema, &bad);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some("source_builds.0.number".to_string())
        );
    }

    #[test]
    fn test_validate_one_of() {
        let schema = Schema::v0().with_attribute(
            "maturity_level",
            Attribute::optional_computed_string().with_one_of(&[
                "unspecified",
                "experimental",
                "production",
                "end_of_life",
            ]),
        );

        assert!(validate(&schema, &json!({"maturity_level": "production"})).is_empty());
        let diagnostics = validate(&schema, &json!({"maturity_level": "beta"}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid value"));
        assert!(diagnostics[0]
            .detail
            .as_deref()
            .unwrap_or_default()
            .contains("\"beta\""));
    }

    #[test]
    fn test_validate_length() {
        let schema = Schema::v0()
            .with_attribute("application_key", Attribute::required_string().with_length(2, 64));

        assert!(validate(&schema, &json!({"application_key": "ab"})).is_empty());
        assert_eq!(validate(&schema, &json!({"application_key": "a"})).len(), 1);
        let long = "a".repeat(65);
        assert_eq!(validate(&schema, &json!({"application_key": long})).len(), 1);
        // type errors suppress constraint checks
        assert_eq!(validate(&schema, &json!({"application_key": 1})).len(), 1);
    }

    #[test]
    fn test_validate_multiple_errors() {
        let schema = Schema::v0()
            .with_attribute("application_key", Attribute::required_string())
            .with_attribute("limit", Attribute::optional_int64())
            .with_attribute("include_dependencies", Attribute::optional_bool());

        let diagnostics = validate(
            &schema,
            &json!({"application_key": 123, "limit": "ten", "include_dependencies": "yes"}),
        );
        assert_eq!(diagnostics.len(), 3);
    }

    #[test]
    fn test_result_helpers() {
        let schema = Schema::v0().with_attribute("application_key", Attribute::required_string());

        assert!(is_valid(&schema, &json!({"application_key": "app"})));
        assert!(!is_valid(&schema, &json!({})));
        assert!(validate_result(&schema, &json!({"application_key": "app"})).is_ok());
        assert_eq!(validate_result(&schema, &json!({})).unwrap_err().len(), 1);

        let err = ensure_valid(&schema, &json!({})).unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
        assert!(err.message().contains("Missing required attribute 'application_key'"));
    }

    #[test]
    fn test_validate_root_not_object() {
        let schema = Schema::v0().with_attribute("application_key", Attribute::required_string());

        let diagnostics = validate(&schema, &json!("not an object"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected object"));
    }
}
