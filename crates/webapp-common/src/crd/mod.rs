//! Custom Resource Definitions for the webapp API group

mod deployment;

pub use deployment::{Deployment, DeploymentSpec, RangeSpec, DEFAULT_INTERVAL};
