//! Typed error hierarchy for the triage client.
//!
//! Two enums cover the two layers:
//! - `GatewayError`: a call to an external collaborator failed
//! - `CoordinatorError`: a view operation's precondition does not hold
//!
//! Neither is fatal. The coordinator turns gateway failures into local view
//! state, and the CLI turns coordinator errors into a message.

use thiserror::Error;

/// Errors from an external collaborator call.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("No credential available; log in first")]
    AuthMissing,

    #[error("Request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl GatewayError {
    /// True when the backend rejected the credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GatewayError::AuthMissing)
            || matches!(self, GatewayError::Status { status: 401, .. })
    }
}

/// Errors from coordinator operations whose preconditions are not met.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("No credential available; log in first")]
    AuthMissing,

    #[error("No repository is selected")]
    NoRepositorySelected,

    #[error("No issue is selected")]
    NoIssueSelected,

    #[error("Categories are not available in the current view")]
    CategoriesUnavailable,

    #[error("Issue #{number} is not in the current issue set")]
    UnknownIssue { number: i64 },
}
