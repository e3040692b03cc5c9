//! Error types for identity service operations.

use thiserror::Error;

/// Identity service error.
///
/// Every variant degrades rather than propagates at the session layer: a
/// failed primary fetch becomes an unauthenticated session, a failed coach
/// lookup becomes not-approved, a failed logout notification is ignored.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP transport failed (connection, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("Server error {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for identity operations.
pub type Result<T> = std::result::Result<T, IdentityError>;
