//! Validation settings

/// Minimum replica count for a Deployment (inclusive).
///
/// Fewer than three copies cannot survive the loss of a node while keeping a
/// majority available.
pub const MIN_REPLICAS: i32 = 3;

/// Which value a replica violation reports as rejected
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RejectedValue {
    /// The replica count itself
    #[default]
    Replicas,
    /// The observation interval (`spec.range.interval`), as older releases reported
    Interval,
}

/// Settings for [`crate::validation::DeploymentValidator`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationConfig {
    /// Value attached to a `spec.replicas` violation
    pub replica_rejected_value: RejectedValue,
}

impl ValidationConfig {
    /// Select the value reported on replica violations
    pub fn with_replica_rejected_value(mut self, value: RejectedValue) -> Self {
        self.replica_rejected_value = value;
        self
    }
}
