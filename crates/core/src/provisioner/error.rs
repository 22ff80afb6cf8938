//! Error types for the provisioner module.

use thiserror::Error;

use crate::emapi::EmApiError;

/// Errors that can occur while provisioning incident orgs and rooms.
#[derive(Debug, Error)]
pub enum ProvisionerError {
    /// Rooms configuration document is not valid JSON of the expected shape.
    #[error("Invalid rooms configuration: {0}")]
    InvalidRoomsConfig(String),

    /// A routing pattern failed to compile.
    #[error("Invalid routing pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The identity user has no membership in the configured org.
    #[error("Identity user '{user}' has no userorg in org {org_id}")]
    IdentityNotFound { user: String, org_id: i64 },

    /// The identity user has no usable session.
    #[error("Identity user session unavailable: {0}")]
    IdentitySession(String),

    /// Notification body is malformed or lacks required ids.
    #[error("Invalid notification: {0}")]
    InvalidNotification(String),

    /// Organization record cannot be used to build a room.
    #[error("Invalid organization {org_id}: {reason}")]
    InvalidOrganization { org_id: i64, reason: String },

    #[error("em-api error: {0}")]
    EmApi(#[from] EmApiError),
}
