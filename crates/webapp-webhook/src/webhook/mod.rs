//! Validating Admission Webhook for webapp Deployments
//!
//! The admission framework calls one lifecycle hook per request:
//! - Create: validate the new object
//! - Update: validate the proposed object (the previous one is passed along
//!   when it decodes)
//! - Delete: always allowed
//!
//! [`review`] binds those hooks to kube's `AdmissionRequest`/`AdmissionResponse`
//! types. Serving the endpoint (TLS, routing) is left to the framework.

pub mod deployment;

#[cfg(test)]
use mockall::automock;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, Operation};
use kube::core::DynamicObject;
use kube::Resource;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::decision::{AdmissionDecision, GroupKind, InvalidError};
use crate::field::{FieldError, FieldPath};

/// Lifecycle hooks a validating webhook implements for resource kind `K`
///
/// Implementations must be safe to call concurrently.
#[cfg_attr(test, automock)]
pub trait CustomValidator<K: Send + Sync + 'static>: Send + Sync {
    /// Validate an object that is about to be created
    fn validate_create(&self, obj: &K) -> AdmissionDecision;

    /// Validate the proposed state of an object that is about to be updated
    ///
    /// `old` is the stored state when the request carries a decodable one,
    /// otherwise the proposed state again.
    fn validate_update(&self, obj: &K, old: &K) -> AdmissionDecision;

    /// Validate an object that is about to be deleted
    fn validate_delete(&self, obj: &K) -> AdmissionDecision;
}

/// Answer one admission request using `validator`
///
/// The object is decoded into `K` before any hook runs. An object that cannot
/// be decoded is denied with a single `FieldValueTypeInvalid` cause rather than
/// failing the request. Only the candidate object can cause that denial; the
/// previous state of an update is decoded best-effort.
pub fn review<K, V>(validator: &V, request: &AdmissionRequest<DynamicObject>) -> AdmissionResponse
where
    K: Resource<DynamicType = ()> + DeserializeOwned + Send + Sync + 'static,
    V: CustomValidator<K> + ?Sized,
{
    let uid = request.uid.as_str();

    let decision = match request.operation {
        Operation::Create => match &request.object {
            Some(obj) => decode::<K>(obj, "object").map(|new| validator.validate_create(&new)),
            None => {
                debug!(uid = %uid, "No object in create request, allowing");
                Ok(AdmissionDecision::allowed())
            }
        },
        Operation::Update => match &request.object {
            Some(obj) => decode::<K>(obj, "object").map(|new| {
                let old = request
                    .old_object
                    .as_ref()
                    .and_then(|old_obj| match decode::<K>(old_obj, "oldObject") {
                        Ok(old) => Some(old),
                        Err(e) => {
                            debug!(uid = %uid, error = %e, "Undecodable oldObject in update request, ignoring");
                            None
                        }
                    });
                if request.old_object.is_none() {
                    debug!(uid = %uid, "No oldObject in update request, judging new state alone");
                }
                validator.validate_update(&new, old.as_ref().unwrap_or(&new))
            }),
            None => {
                debug!(uid = %uid, "No object in update request, allowing");
                Ok(AdmissionDecision::allowed())
            }
        },
        // DELETE carries the object being removed in oldObject
        Operation::Delete => match request.old_object.as_ref().or(request.object.as_ref()) {
            Some(obj) => match decode::<K>(obj, "oldObject") {
                Ok(old) => Ok(validator.validate_delete(&old)),
                Err(e) => {
                    debug!(uid = %uid, error = %e, "Undecodable object in delete request, allowing");
                    Ok(AdmissionDecision::allowed())
                }
            },
            None => Ok(AdmissionDecision::allowed()),
        },
        Operation::Connect => Ok(AdmissionDecision::allowed()),
    };

    let decision = decision.unwrap_or_else(|malformed| {
        warn!(uid = %uid, error = %malformed, "Malformed admission object");
        AdmissionDecision::Denied(malformed)
    });

    into_response(request, decision)
}

/// Decode a dynamic object into its typed form
///
/// A failure becomes an invalid-resource error naming the request field.
fn decode<K>(obj: &DynamicObject, field: &str) -> Result<K, InvalidError>
where
    K: Resource<DynamicType = ()> + DeserializeOwned,
{
    serde_json::to_value(obj)
        .and_then(serde_json::from_value)
        .map_err(|e| InvalidError {
            group_kind: GroupKind::of::<K>(),
            name: obj.metadata.name.clone().unwrap_or_default(),
            errors: vec![FieldError::type_invalid(
                &FieldPath::new(field),
                serde_json::Value::Null,
                format!("cannot decode {}: {}", K::kind(&()), e),
            )],
        })
}

/// Translate a decision into the response sent back to the API server
fn into_response(
    request: &AdmissionRequest<DynamicObject>,
    decision: AdmissionDecision,
) -> AdmissionResponse {
    match decision {
        AdmissionDecision::Allowed { warnings } => {
            let mut response = AdmissionResponse::from(request);
            if !warnings.is_empty() {
                response.warnings = Some(warnings);
            }
            response
        }
        AdmissionDecision::Denied(err) => {
            let mut response = AdmissionResponse::from(request).deny(err.to_string());
            match to_kube_status(&err) {
                Ok(status) => response.result = status,
                Err(e) => {
                    error!(uid = %request.uid, error = %e, "Failed to convert status, sending message only");
                }
            }
            response
        }
    }
}

/// Convert the k8s-openapi status into kube's wire type; both share one JSON shape
fn to_kube_status(err: &InvalidError) -> Result<kube::core::Status, serde_json::Error> {
    serde_json::to_value(err.to_status()).and_then(serde_json::from_value)
}
