//! Field-addressed validation errors
//!
//! A [`FieldError`] ties one failed invariant to the location of the offending
//! field, the value that was rejected, and a message an operator can act on.
//! Errors are accumulated into [`FieldErrors`] so every failure is reported,
//! not just the first.

use std::fmt;

use serde_json::Value;

/// Ordered list of field errors collected during validation
pub type FieldErrors = Vec<FieldError>;

/// Structured locator for a field within a resource (e.g. `spec.replicas`)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Start a path at a top-level field
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            segments: vec![root.into()],
        }
    }

    /// Descend into a named child field
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Category of a field error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldErrorType {
    /// The value is syntactically or semantically wrong
    Invalid,
    /// The value has the wrong type or could not be decoded
    TypeInvalid,
}

impl FieldErrorType {
    /// Machine readable reason, as used in Kubernetes status causes
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Invalid => "FieldValueInvalid",
            Self::TypeInvalid => "FieldValueTypeInvalid",
        }
    }

    /// Human readable prefix used when rendering an error
    pub fn description(&self) -> &'static str {
        "Invalid value"
    }
}

/// A single validation failure tied to a field
#[derive(Clone, Debug, PartialEq)]
pub struct FieldError {
    /// Category of the failure
    pub error_type: FieldErrorType,
    /// Rendered path of the offending field
    pub field: String,
    /// The value surfaced as rejected
    pub bad_value: Value,
    /// Reason the value was rejected
    pub detail: String,
}

impl FieldError {
    fn new(
        error_type: FieldErrorType,
        path: &FieldPath,
        bad_value: impl Into<Value>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            error_type,
            field: path.to_string(),
            bad_value: bad_value.into(),
            detail: detail.into(),
        }
    }

    /// The value at `path` is invalid
    pub fn invalid(path: &FieldPath, value: impl Into<Value>, detail: impl Into<String>) -> Self {
        Self::new(FieldErrorType::Invalid, path, value, detail)
    }

    /// The value at `path` could not be decoded into the expected type
    pub fn type_invalid(
        path: &FieldPath,
        value: impl Into<Value>,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(FieldErrorType::TypeInvalid, path, value, detail)
    }

    /// Message without the field prefix, as placed in a status cause
    pub fn error_body(&self) -> String {
        let mut body = format!(
            "{}: {}",
            self.error_type.description(),
            render_value(&self.bad_value)
        );
        if !self.detail.is_empty() {
            body.push_str(": ");
            body.push_str(&self.detail);
        }
        body
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.error_body())
        } else {
            write!(f, "{}: {}", self.field, self.error_body())
        }
    }
}

impl std::error::Error for FieldError {}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        // Debug of a String quotes and escapes it
        Value::String(s) => format!("{:?}", s),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_rendering() {
        let spec = FieldPath::new("spec");
        assert_eq!(spec.to_string(), "spec");
        assert_eq!(spec.child("replicas").to_string(), "spec.replicas");
        assert_eq!(
            spec.child("range").child("interval").to_string(),
            "spec.range.interval"
        );
    }

    #[test]
    fn test_child_does_not_modify_parent() {
        let spec = FieldPath::new("spec");
        let _ = spec.child("replicas");
        assert_eq!(spec.to_string(), "spec");
    }

    #[test]
    fn test_invalid_error_renders_value_and_detail() {
        let path = FieldPath::new("spec").child("replicas");
        let err = FieldError::invalid(&path, 2, "replica count below minimum of 3");
        assert_eq!(
            err.to_string(),
            "spec.replicas: Invalid value: 2: replica count below minimum of 3"
        );
        assert_eq!(err.error_type.reason(), "FieldValueInvalid");
    }

    #[test]
    fn test_string_values_are_quoted() {
        let path = FieldPath::new("spec").child("range").child("interval");
        let err = FieldError::invalid(&path, "5x", "bad duration");
        assert_eq!(
            err.to_string(),
            r#"spec.range.interval: Invalid value: "5x": bad duration"#
        );
    }

    #[test]
    fn test_empty_detail_is_omitted() {
        let path = FieldPath::new("spec").child("range").child("interval");
        let err = FieldError::invalid(&path, "", "");
        assert_eq!(err.to_string(), r#"spec.range.interval: Invalid value: """#);
        assert_eq!(err.error_body(), r#"Invalid value: """#);
    }

    #[test]
    fn test_type_invalid_keeps_structured_value() {
        let path = FieldPath::new("spec");
        let err = FieldError::type_invalid(&path, json!({"replicas": "two"}), "cannot decode");
        assert_eq!(err.error_type.reason(), "FieldValueTypeInvalid");
        assert!(err.error_body().contains(r#"{"replicas":"two"}"#));
    }
}
