//! Client error types.

/// Errors that can occur when using the subgate client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// Requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation conflicts with the current order state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The shop refused the operation (ordering paused, limits reached).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
