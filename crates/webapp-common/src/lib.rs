//! Common types for the webapp admission webhook: CRDs, errors, and utilities

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod manifest;
pub mod telemetry;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// API group served by the webapp CRDs
pub const API_GROUP: &str = "webapp.my.domain";

/// API version served by the webapp CRDs
pub const API_VERSION: &str = "v1";
