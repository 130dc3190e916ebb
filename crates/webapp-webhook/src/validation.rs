//! Deployment validation rules
//!
//! Each rule inspects a candidate [`DeploymentSpec`] independently and reports
//! at most one [`FieldError`]. Every rule runs on every candidate; nothing
//! short-circuits, so an operator sees all problems in one rejection.

use serde_json::Value;
use tracing::{debug, info_span, Span};

use webapp_common::crd::{Deployment, DeploymentSpec};

use crate::config::{RejectedValue, ValidationConfig, MIN_REPLICAS};
use crate::duration::parse_duration;
use crate::field::{FieldError, FieldErrors, FieldPath};

/// Name of the span the default validator logs under
pub const LOG_SPAN_NAME: &str = "deployment-resource";

/// A single validation rule
type Rule = fn(&DeploymentSpec, &ValidationConfig) -> Option<FieldError>;

/// Rules in evaluation order; violations are reported in this order
const RULES: &[Rule] = &[validate_replicas, validate_interval];

/// Validates Deployment candidates against the resource invariants
///
/// Holds no mutable state: one instance can be shared across concurrent
/// admission requests.
#[derive(Clone, Debug)]
pub struct DeploymentValidator {
    config: ValidationConfig,
    log: Span,
}

impl DeploymentValidator {
    /// Create a validator that logs under the given span.
    ///
    /// Every event of the validator and its hooks is recorded inside `log`;
    /// pass `Span::none()` to log without that context.
    pub fn new(config: ValidationConfig, log: Span) -> Self {
        Self { config, log }
    }

    /// Validator with default settings logging under [`LOG_SPAN_NAME`].
    ///
    /// The span is created here, so install the subscriber first.
    pub fn with_defaults() -> Self {
        Self::new(ValidationConfig::default(), info_span!(LOG_SPAN_NAME))
    }

    /// Settings this validator was built with
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Span events are logged under
    pub fn log(&self) -> &Span {
        &self.log
    }

    /// Run every rule against the candidate and collect all violations.
    ///
    /// An empty result means the candidate is valid. The candidate is never
    /// modified and the result depends only on its content.
    pub fn validate(&self, deployment: &Deployment) -> FieldErrors {
        let _entered = self.log.enter();

        let errors: FieldErrors = RULES
            .iter()
            .filter_map(|rule| rule(&deployment.spec, &self.config))
            .collect();

        for error in &errors {
            debug!(field = %error.field, reason = error.error_type.reason(), error = %error, "field violation");
        }
        debug!(
            name = deployment.metadata.name.as_deref().unwrap_or_default(),
            violations = errors.len(),
            "validated deployment"
        );

        errors
    }
}

impl Default for DeploymentValidator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// `spec.replicas` must be at least [`MIN_REPLICAS`]
fn validate_replicas(spec: &DeploymentSpec, config: &ValidationConfig) -> Option<FieldError> {
    if spec.replicas >= MIN_REPLICAS {
        return None;
    }

    let rejected = match config.replica_rejected_value {
        RejectedValue::Replicas => Value::from(spec.replicas),
        RejectedValue::Interval => spec.interval().map(Value::from).unwrap_or(Value::Null),
    };

    Some(FieldError::invalid(
        &FieldPath::new("spec").child("replicas"),
        rejected,
        format!(
            "replica count below minimum of {min}: at least {min} replicas are required to tolerate node loss",
            min = MIN_REPLICAS
        ),
    ))
}

/// `spec.range.interval`, when a range is set, must be a positive duration
fn validate_interval(spec: &DeploymentSpec, _config: &ValidationConfig) -> Option<FieldError> {
    let interval = spec.interval()?;
    let path = FieldPath::new("spec").child("range").child("interval");

    match parse_duration(interval) {
        Ok(d) if d.is_zero() => Some(FieldError::invalid(
            &path,
            interval,
            "interval must be greater than zero",
        )),
        Ok(_) => None,
        Err(e) => Some(FieldError::invalid(
            &path,
            interval,
            format!(
                "the time interval cannot be parsed ({}), use a duration such as 30s, 5m or 1h30m",
                e
            ),
        )),
    }
}
