//! Notification channel to the external bot service.
//!
//! The bot exposes a single `/notify` endpoint taking a batch of per-user
//! notices. Subgate composes the message texts; the bot owns delivery,
//! retries and presentation.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

/// Errors surfaced by the notification channel.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The bot service rejected the batch.
    #[error("notifier rejected the batch: HTTP {status}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
}

/// A single notice addressed to one user.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    /// Recipient id.
    pub id: i64,
    /// Message text.
    pub message: String,
    /// Action metadata the bot turns into interactive controls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control: Option<serde_json::Value>,
    /// Whether the bot should attach its default reply options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_default_options: Option<bool>,
}

impl Notice {
    /// Create a plain notice.
    #[must_use]
    pub fn new(id: i64, message: impl Into<String>) -> Self {
        Self {
            id,
            message: message.into(),
            control: None,
            with_default_options: None,
        }
    }

    /// Attach action metadata.
    #[must_use]
    pub fn with_control(mut self, control: serde_json::Value) -> Self {
        self.control = Some(control);
        self
    }

    /// Ask the bot to attach its default reply options.
    #[must_use]
    pub fn with_default_options(mut self) -> Self {
        self.with_default_options = Some(true);
        self
    }
}

#[derive(Debug, Serialize)]
struct NotifyRequest<'a> {
    users: &'a [Notice],
}

/// Client for the bot service's `/notify` endpoint.
#[derive(Debug, Clone)]
pub struct Notifier {
    client: Client,
    base_url: String,
    admin_id: i64,
}

impl Notifier {
    /// Create a notifier for the bot service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        admin_id: i64,
        timeout_seconds: u64,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            admin_id,
        })
    }

    /// A notice addressed to the administrator.
    #[must_use]
    pub fn admin_notice(&self, message: impl Into<String>) -> Notice {
        Notice::new(self.admin_id, message)
    }

    /// Deliver a batch of notices. An empty batch is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the bot rejects the batch.
    pub async fn send(&self, notices: Vec<Notice>) -> Result<(), NotifyError> {
        if notices.is_empty() {
            return Ok(());
        }

        let url = format!("{}/notify", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&NotifyRequest { users: &notices })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                body = %body,
                "Notifier rejected the batch"
            );
            return Err(NotifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(count = notices.len(), "Notices delivered");
        Ok(())
    }
}

/// Format a byte count for human eyes: two decimals, 1024-based units.
#[must_use]
#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
pub fn format_bytes(bytes: i64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes <= 0 {
        return "0 B".to_string();
    }

    let exponent = ((bytes as f64).ln() / 1024_f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024_f64.powi(exponent as i32);

    format!("{value:.2} {}", UNITS[exponent])
}

/// Format a UNIX-seconds timestamp as `YYYY-MM-DD HH:MM` (UTC).
#[must_use]
pub fn friendly_date(unix_secs: i64) -> String {
    chrono::DateTime::from_timestamp(unix_secs, 0).map_or_else(
        || unix_secs.to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M").to_string(),
    )
}
