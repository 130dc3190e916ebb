//! Validating admission core for `webapp.my.domain/v1` Deployments
//!
//! Before the API server persists a Deployment, the admission framework asks
//! this crate whether the object is acceptable. Rules run against the
//! candidate, every violation is collected, and the result is a single
//! decision: allowed, or denied with a field-addressed error listing every
//! problem.
//!
//! # Modules
//!
//! - [`field`] - Field paths and field-level errors
//! - [`validation`] - Deployment rules
//! - [`decision`] - Aggregation of violations into an admission decision
//! - [`webhook`] - Create/update/delete hooks and the kube admission binding
//! - [`registration`] - `ValidatingWebhookConfiguration` for the hooks
//! - [`config`] - Validation settings
//! - [`duration`] - Go-style duration strings

#![deny(missing_docs)]

pub mod config;
pub mod decision;
pub mod duration;
pub mod field;
pub mod registration;
pub mod validation;
pub mod webhook;

pub use config::{RejectedValue, ValidationConfig, MIN_REPLICAS};
pub use decision::{aggregate, AdmissionDecision, GroupKind, InvalidError, ResourceIdentity};
pub use field::{FieldError, FieldErrorType, FieldErrors, FieldPath};
pub use validation::DeploymentValidator;
pub use webhook::deployment::review_deployment;
pub use webhook::{review, CustomValidator};
