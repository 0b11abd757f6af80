//! Crate-level error types.
//!
//! [`FoodstoreError`] unifies every error source (configuration, HTTP,
//! JSON, the order stream) behind a single enum so callers can match on
//! the variant they care about while still using the `?` operator for
//! easy propagation.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FoodstoreError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum FoodstoreError {
    /// Environment configuration is missing or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// The HTTP request could not be sent or its body could not be read.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing the persisted auth record failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered with a non-success status.
    #[error("API error: {status} {reason}")]
    Status { status: u16, reason: String },

    /// The server rejected the bearer token (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// The refresh token was rejected; the user must log in again.
    #[error("Session expired. Please login again.")]
    SessionExpired,

    /// Login or token exchange failed.
    #[error("authentication error: {0}")]
    Auth(String),

    /// A stream payload could not be interpreted.
    #[error("Failed to parse server data: {0}")]
    MalformedMessage(String),

    /// A report date range was rejected.
    #[error("invalid date range: {0}")]
    InvalidRange(String),
}

impl FoodstoreError {
    /// Builds a [`FoodstoreError::Status`] from an HTTP status code.
    pub(crate) fn status(status: reqwest::StatusCode) -> Self {
        Self::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        }
    }
}
