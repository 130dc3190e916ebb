//! Manifest loading
//!
//! Reads Deployment objects from YAML (or JSON, which is a YAML subset) so the
//! same objects the API server would see can be checked offline.

use std::path::Path;

use serde_json::Value;

use crate::crd::Deployment;
use crate::{Error, Result, API_GROUP, API_VERSION};

/// Parse a single YAML document into a JSON value.
///
/// Empty input yields `Value::Null`.
pub fn parse_yaml(input: &str) -> Result<Value> {
    if input.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_yaml::from_str(input)?)
}

/// Parse a Deployment manifest, checking apiVersion and kind first.
pub fn parse_deployment(input: &str) -> Result<Deployment> {
    let value = parse_yaml(input)?;
    let name = value
        .pointer("/metadata/name")
        .and_then(Value::as_str)
        .unwrap_or(crate::error::UNKNOWN_CONTEXT)
        .to_string();

    let expected_api_version = format!("{}/{}", API_GROUP, API_VERSION);
    match value.get("apiVersion").and_then(Value::as_str) {
        Some(v) if v == expected_api_version => {}
        other => {
            return Err(Error::validation_for_field(
                name,
                "apiVersion",
                format!(
                    "expected apiVersion {}, got {}",
                    expected_api_version,
                    other.unwrap_or("<none>")
                ),
            ))
        }
    }

    match value.get("kind").and_then(Value::as_str) {
        Some("Deployment") => {}
        other => {
            return Err(Error::validation_for_field(
                name,
                "kind",
                format!("expected kind Deployment, got {}", other.unwrap_or("<none>")),
            ))
        }
    }

    serde_json::from_value(value).map_err(|e| Error::serialization_for("Deployment", e.to_string()))
}

/// Read and parse a Deployment manifest from disk.
pub fn read_deployment(path: impl AsRef<Path>) -> Result<Deployment> {
    let path = path.as_ref();
    let content =
        std::fs::read_to_string(path).map_err(|e| Error::io(path.display().to_string(), e))?;
    parse_deployment(&content)
}
