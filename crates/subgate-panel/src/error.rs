//! Panel client error types.

/// Errors surfaced by the panel provisioning client.
///
/// Transport failures, authorization failures and panel-side operation
/// rejections are kept distinct so the service layer can map them to
/// different outcomes.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The panel refused to open or renew a session.
    #[error("panel authorization failed: {0}")]
    Auth(String),

    /// The panel answered with a `success: false` envelope.
    #[error("panel rejected {endpoint}: {message}")]
    Api {
        /// Which panel operation was rejected.
        endpoint: &'static str,
        /// Message carried by the envelope.
        message: String,
    },

    /// An operation was attempted before the shared inbound was
    /// discovered or created.
    #[error("inbound not initialized")]
    Uninitialized,

    /// A nested settings blob could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A URL could not be parsed or assembled.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
