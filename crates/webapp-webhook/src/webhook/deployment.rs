//! Deployment Validation Webhook
//!
//! Lifecycle hooks for `webapp.my.domain/v1` Deployments. Create and update
//! run every validation rule against the proposed object; delete is always
//! allowed since no invariant applies to removal.

use kube::core::admission::{AdmissionRequest, AdmissionResponse};
use kube::core::DynamicObject;
use tracing::info;

use webapp_common::crd::Deployment;

use super::{review, CustomValidator};
use crate::decision::{aggregate, AdmissionDecision, ResourceIdentity};
use crate::validation::DeploymentValidator;

impl DeploymentValidator {
    /// Validate and decide in one step
    fn decide(&self, deployment: &Deployment) -> AdmissionDecision {
        let errors = self.validate(deployment);
        aggregate(errors, ResourceIdentity::of(deployment))
    }
}

impl CustomValidator<Deployment> for DeploymentValidator {
    fn validate_create(&self, obj: &Deployment) -> AdmissionDecision {
        self.log().in_scope(|| info!(name = ?obj.metadata.name, "validate create"));
        self.decide(obj)
    }

    fn validate_update(&self, obj: &Deployment, old: &Deployment) -> AdmissionDecision {
        self.log().in_scope(|| {
            info!(
                name = ?obj.metadata.name,
                old_replicas = old.spec.replicas,
                new_replicas = obj.spec.replicas,
                "validate update"
            )
        });
        // Only the proposed state is judged
        self.decide(obj)
    }

    fn validate_delete(&self, obj: &Deployment) -> AdmissionDecision {
        self.log().in_scope(|| info!(name = ?obj.metadata.name, "validate delete"));
        AdmissionDecision::allowed()
    }
}

/// Handle a validating admission request for a Deployment
pub fn review_deployment(
    validator: &DeploymentValidator,
    request: &AdmissionRequest<DynamicObject>,
) -> AdmissionResponse {
    review::<Deployment, _>(validator, request)
}
