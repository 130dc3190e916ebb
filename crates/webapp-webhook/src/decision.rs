//! Admission decisions
//!
//! Turns the violations found by a validator into a single outcome. A
//! candidate with no violations is allowed; any violation denies it with one
//! structured "invalid resource" error that lists every offending field.

use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Status, StatusCause, StatusDetails};
use kube::Resource;
use thiserror::Error;

use crate::field::{FieldError, FieldErrors};

/// HTTP status code the API server uses for invalid resources
pub const STATUS_CODE_INVALID: i32 = 422;

/// Status reason for invalid resources
pub const STATUS_REASON_INVALID: &str = "Invalid";

/// Non-fatal messages returned to the client alongside an allowed request
pub type Warnings = Vec<String>;

/// API group and kind of a resource
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupKind {
    /// API group (empty for the core group)
    pub group: String,
    /// Resource kind
    pub kind: String,
}

impl GroupKind {
    /// Create a group/kind pair
    pub fn new(group: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            kind: kind.into(),
        }
    }

    /// Group/kind of a statically typed resource
    pub fn of<K: Resource<DynamicType = ()>>() -> Self {
        Self::new(K::group(&()), K::kind(&()))
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}.{}", self.kind, self.group)
        }
    }
}

/// Identity of the resource instance an admission request is about
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceIdentity {
    /// Group and kind
    pub group_kind: GroupKind,
    /// Instance name
    pub name: String,
}

impl ResourceIdentity {
    /// Identity of a typed object; an unnamed object gets an empty name
    pub fn of<K: Resource<DynamicType = ()>>(obj: &K) -> Self {
        Self {
            group_kind: GroupKind::of::<K>(),
            name: obj.meta().name.clone().unwrap_or_default(),
        }
    }
}

/// A resource failed validation
///
/// Carries every violation in the order the rules produced them.
#[derive(Clone, Debug, Error, PartialEq)]
pub struct InvalidError {
    /// Group and kind of the rejected resource
    pub group_kind: GroupKind,
    /// Name of the rejected instance
    pub name: String,
    /// All violations, never empty
    pub errors: FieldErrors,
}

impl fmt::Display for InvalidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} is invalid: ", self.group_kind, self.name)?;
        match self.errors.as_slice() {
            [] => Ok(()),
            [only] => write!(f, "{}", only),
            many => {
                let joined: Vec<String> = many.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", joined.join(", "))
            }
        }
    }
}

impl InvalidError {
    /// Kubernetes status for this error: `422 Invalid` with one cause per violation
    pub fn to_status(&self) -> Status {
        let causes = self
            .errors
            .iter()
            .map(|e| StatusCause {
                field: Some(e.field.clone()),
                message: Some(e.error_body()),
                reason: Some(e.error_type.reason().to_string()),
            })
            .collect();

        Status {
            status: Some("Failure".to_string()),
            code: Some(STATUS_CODE_INVALID),
            reason: Some(STATUS_REASON_INVALID.to_string()),
            message: Some(self.to_string()),
            details: Some(StatusDetails {
                group: Some(self.group_kind.group.clone()),
                kind: Some(self.group_kind.kind.clone()),
                name: Some(self.name.clone()),
                causes: Some(causes),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

/// Outcome of one admission check
#[derive(Clone, Debug, PartialEq)]
pub enum AdmissionDecision {
    /// The operation may proceed
    Allowed {
        /// Non-fatal warnings for the client
        warnings: Warnings,
    },
    /// The operation is rejected
    Denied(InvalidError),
}

impl AdmissionDecision {
    /// Allowed without warnings
    pub fn allowed() -> Self {
        Self::Allowed {
            warnings: Warnings::new(),
        }
    }

    /// Whether the operation may proceed
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Warnings of an allowed decision; empty when denied
    pub fn warnings(&self) -> &[String] {
        match self {
            Self::Allowed { warnings } => warnings,
            Self::Denied(_) => &[],
        }
    }

    /// Violations of a denied decision; empty when allowed
    pub fn violations(&self) -> &[FieldError] {
        match self {
            Self::Allowed { .. } => &[],
            Self::Denied(err) => &err.errors,
        }
    }

    /// Warnings on success, the invalid-resource error on denial
    pub fn into_result(self) -> Result<Warnings, InvalidError> {
        match self {
            Self::Allowed { warnings } => Ok(warnings),
            Self::Denied(err) => Err(err),
        }
    }
}

/// Decide from a list of violations.
///
/// Denied if and only if `errors` is non-empty; all violations are kept.
pub fn aggregate(errors: FieldErrors, identity: ResourceIdentity) -> AdmissionDecision {
    if errors.is_empty() {
        return AdmissionDecision::allowed();
    }
    AdmissionDecision::Denied(InvalidError {
        group_kind: identity.group_kind,
        name: identity.name,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldPath;
    use webapp_common::crd::{Deployment, DeploymentSpec};

    fn identity(name: &str) -> ResourceIdentity {
        ResourceIdentity {
            group_kind: GroupKind::new("webapp.my.domain", "Deployment"),
            name: name.to_string(),
        }
    }

    fn replica_error(value: i32) -> FieldError {
        FieldError::invalid(
            &FieldPath::new("spec").child("replicas"),
            value,
            "replica count below minimum of 3",
        )
    }

    fn interval_error() -> FieldError {
        FieldError::invalid(
            &FieldPath::new("spec").child("range").child("interval"),
            "soon",
            "cannot be parsed",
        )
    }

    #[test]
    fn test_group_kind_display() {
        assert_eq!(
            GroupKind::new("webapp.my.domain", "Deployment").to_string(),
            "Deployment.webapp.my.domain"
        );
        assert_eq!(GroupKind::new("", "Pod").to_string(), "Pod");
    }

    #[test]
    fn test_identity_of_typed_object() {
        let d = Deployment::new(
            "web",
            DeploymentSpec {
                replicas: 3,
                range: None,
            },
        );
        assert_eq!(ResourceIdentity::of(&d), identity("web"));
    }

    #[test]
    fn test_empty_errors_are_allowed() {
        let decision = aggregate(vec![], identity("web"));
        assert_eq!(decision, AdmissionDecision::allowed());
        assert!(decision.is_allowed());
        assert!(decision.warnings().is_empty());
        assert!(decision.violations().is_empty());
    }

    #[test]
    fn test_any_error_denies_and_keeps_order() {
        let errors = vec![replica_error(1), interval_error()];
        let decision = aggregate(errors.clone(), identity("web"));

        assert!(!decision.is_allowed());
        assert_eq!(decision.violations(), errors.as_slice());

        let err = decision.into_result().unwrap_err();
        assert_eq!(err.name, "web");
        assert_eq!(err.group_kind.kind, "Deployment");
    }

    #[test]
    fn test_single_error_message() {
        let err = aggregate(vec![replica_error(2)], identity("web"))
            .into_result()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Deployment.webapp.my.domain "web" is invalid: spec.replicas: Invalid value: 2: replica count below minimum of 3"#
        );
    }

    #[test]
    fn test_multiple_error_message_lists_all() {
        let err = aggregate(vec![replica_error(0), interval_error()], identity("web"))
            .into_result()
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with(r#"Deployment.webapp.my.domain "web" is invalid: ["#));
        assert!(msg.contains("spec.replicas"));
        assert!(msg.contains("spec.range.interval"));
        assert!(msg.ends_with(']'));
    }

    #[test]
    fn test_status_carries_identity_and_causes() {
        let err = aggregate(vec![replica_error(1), interval_error()], identity("web"))
            .into_result()
            .unwrap_err();
        let status = err.to_status();

        assert_eq!(status.code, Some(422));
        assert_eq!(status.reason.as_deref(), Some("Invalid"));
        assert_eq!(status.status.as_deref(), Some("Failure"));
        assert_eq!(status.message, Some(err.to_string()));

        let details = status.details.expect("details");
        assert_eq!(details.group.as_deref(), Some("webapp.my.domain"));
        assert_eq!(details.kind.as_deref(), Some("Deployment"));
        assert_eq!(details.name.as_deref(), Some("web"));

        let causes = details.causes.expect("causes");
        assert_eq!(causes.len(), 2);
        assert_eq!(causes[0].field.as_deref(), Some("spec.replicas"));
        assert_eq!(causes[0].reason.as_deref(), Some("FieldValueInvalid"));
        assert_eq!(
            causes[0].message.as_deref(),
            Some("Invalid value: 1: replica count below minimum of 3")
        );
        assert_eq!(causes[1].field.as_deref(), Some("spec.range.interval"));
    }
}
