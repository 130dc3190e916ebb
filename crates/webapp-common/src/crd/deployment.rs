//! Deployment Custom Resource Definition
//!
//! A Deployment describes a replicated service together with the observation
//! window used when judging its health. Objects are checked by the validating
//! admission webhook before the API server persists them.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Observation interval used when `range.interval` is omitted
pub const DEFAULT_INTERVAL: &str = "5m";

fn default_interval() -> String {
    DEFAULT_INTERVAL.to_string()
}

/// Time range over which the service is observed
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RangeSpec {
    /// Observation window as a duration string (e.g. "5m", "1h30m")
    #[serde(default = "default_interval")]
    pub interval: String,
}

impl Default for RangeSpec {
    fn default() -> Self {
        Self {
            interval: default_interval(),
        }
    }
}

/// Specification for a Deployment
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[kube(
    group = "webapp.my.domain",
    version = "v1",
    kind = "Deployment",
    plural = "deployments",
    namespaced,
    derive = "PartialEq",
    printcolumn = r#"{"name":"Replicas","type":"integer","jsonPath":".spec.replicas"}"#,
    printcolumn = r#"{"name":"Interval","type":"string","jsonPath":".spec.range.interval"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    /// Desired number of running copies
    pub replicas: i32,

    /// Observation window for the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeSpec>,
}

impl DeploymentSpec {
    /// The configured observation interval, if a range is set
    pub fn interval(&self) -> Option<&str> {
        self.range.as_ref().map(|r| r.interval.as_str())
    }
}
