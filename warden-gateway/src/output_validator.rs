// warden-gateway/src/output_validator.rs
// ============================================================================
// Module: Output Validator
// Description: Validates LLM responses against a technique-ID allowlist and
//              an optional lightweight JSON schema.
// Purpose: Quarantine hallucinated ATT&CK/ATLAS technique IDs and catch
//          malformed structured responses before they reach an analyst.
// Dependencies: regex, serde_json
// ============================================================================

//! ## Overview
//! Two independent checks, both optional: [`validate_output`] flags any
//! `T####`/`T####.###`/`AML.T####`-shaped technique ID not present in a
//! caller-supplied allowlist (returned for quarantine, not rejection — an
//! unknown technique ID degrades the response, it doesn't fail the call),
//! and validates parsed JSON against a minimal required-fields/type-checked
//! schema. Schema validation is intentionally shallow; it checks object and
//! array shape, required fields and top-level property types; it does not
//! implement the full JSON Schema specification.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static TECHNIQUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used, reason = "Pattern is a fixed string literal verified by tests.")]
    Regex::new(r"\b(T\d{4}(?:\.\d{3})?|AML\.T\d{4})\b").expect("technique id pattern is valid regex")
});

/// Result of validating an LLM response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// True when no errors were found.
    pub valid: bool,
    /// Human-readable validation failures.
    pub errors: Vec<String>,
    /// Technique IDs found in the response that are not in the allowlist.
    pub quarantined_ids: Vec<String>,
}

/// Validates an LLM response against an optional technique-ID allowlist and
/// an optional lightweight JSON schema.
#[must_use]
pub fn validate_output(content: &str, known_technique_ids: Option<&HashSet<String>>, output_schema: Option<&Value>) -> ValidationOutcome {
    let mut errors = Vec::new();
    let mut quarantined = Vec::new();

    if let Some(known) = known_technique_ids {
        let mut found_ids: Vec<&str> = TECHNIQUE_RE.find_iter(content).map(|m| m.as_str()).collect::<HashSet<_>>().into_iter().collect();
        found_ids.sort_unstable();
        for tid in found_ids {
            if !known.contains(tid) {
                quarantined.push(tid.to_string());
                errors.push(format!("Unknown technique ID: {tid}"));
            }
        }
    }

    if let Some(schema) = output_schema {
        match serde_json::from_str::<Value>(content) {
            Ok(parsed) => errors.extend(validate_schema(&parsed, schema)),
            Err(err) => errors.push(format!("Response is not valid JSON: {err}")),
        }
    }

    let valid = errors.is_empty();
    ValidationOutcome { valid, errors, quarantined_ids: quarantined }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Lightweight JSON schema validation: required fields and top-level
/// property types only.
fn validate_schema(data: &Value, schema: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    let expected_type = schema.get("type").and_then(Value::as_str);

    if expected_type == Some("object") && !data.is_object() {
        errors.push(format!("Expected object, got {}", type_name(data)));
        return errors;
    }
    if expected_type == Some("array") && !data.is_array() {
        errors.push(format!("Expected array, got {}", type_name(data)));
        return errors;
    }

    if expected_type == Some("object") {
        if let Some(object) = data.as_object() {
            if let Some(required) = schema.get("required").and_then(Value::as_array) {
                for field in required {
                    if let Some(name) = field.as_str() {
                        if !object.contains_key(name) {
                            errors.push(format!("Missing required field: {name}"));
                        }
                    }
                }
            }

            if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
                for (key, prop_schema) in properties {
                    let Some(actual) = object.get(key) else { continue };
                    let Some(prop_type) = prop_schema.get("type").and_then(Value::as_str) else { continue };
                    let matches = match prop_type {
                        "string" => actual.is_string(),
                        "number" => actual.is_number(),
                        "array" => actual.is_array(),
                        "boolean" => actual.is_boolean(),
                        _ => true,
                    };
                    if !matches {
                        errors.push(format!("Field '{key}' expected {prop_type}, got {}", type_name(actual)));
                    }
                }
            }
        }
    }

    errors
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn known_technique_id_passes() {
        let known: HashSet<String> = ["T1059".to_string()].into_iter().collect();
        let outcome = validate_output("uses T1059 for execution", Some(&known), None);
        assert!(outcome.valid);
        assert!(outcome.quarantined_ids.is_empty());
    }

    #[test]
    fn unknown_technique_id_is_quarantined() {
        let known: HashSet<String> = ["T1059".to_string()].into_iter().collect();
        let outcome = validate_output("uses T9999 for execution", Some(&known), None);
        assert!(!outcome.valid);
        assert_eq!(outcome.quarantined_ids, vec!["T9999".to_string()]);
    }

    #[test]
    fn atlas_prefixed_id_is_recognised() {
        let known: HashSet<String> = ["AML.T0010".to_string()].into_iter().collect();
        let outcome = validate_output("observed AML.T0010 behavior", Some(&known), None);
        assert!(outcome.valid);
    }

    #[test]
    fn malformed_json_fails_schema_validation() {
        let schema = json!({"type": "object"});
        let outcome = validate_output("not json", None, Some(&schema));
        assert!(!outcome.valid);
    }

    #[test]
    fn missing_required_field_is_reported() {
        let schema = json!({"type": "object", "required": ["classification"]});
        let outcome = validate_output("{\"other\": 1}", None, Some(&schema));
        assert!(!outcome.valid);
        assert!(outcome.errors.iter().any(|e| e.contains("classification")));
    }

    #[test]
    fn matching_schema_passes() {
        let schema = json!({"type": "object", "required": ["classification"], "properties": {"classification": {"type": "string"}}});
        let outcome = validate_output("{\"classification\": \"malicious\"}", None, Some(&schema));
        assert!(outcome.valid);
    }
}
