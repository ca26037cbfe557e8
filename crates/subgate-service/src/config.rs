//! Service configuration.
//!
//! Two layers: [`ServiceConfig`] holds process-level settings read from the
//! environment once at startup, and [`ShopSettings`] is the runtime-mutable
//! policy document loaded from a JSON file and replaceable through the admin
//! endpoint.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// SQLite database URL (default: `sqlite://subgate.db?mode=rwc`).
    pub database_url: String,

    /// Path of the runtime shop settings file.
    pub settings_path: String,

    /// Shared API key guarding the `/v1` routes. Unset disables the guard.
    pub api_key: Option<String>,

    /// Recipient id for administrator notices.
    pub admin_id: i64,

    /// Panel dashboard base URL.
    pub panel_base_url: String,

    /// Panel dashboard username.
    pub panel_username: String,

    /// Panel dashboard password.
    pub panel_password: String,

    /// Public host advertised in connection strings. Falls back to the
    /// dashboard URL's host.
    pub panel_public_host: Option<String>,

    /// Listen port of the managed inbound.
    pub panel_inbound_port: u16,

    /// Remark of the managed inbound.
    pub panel_inbound_remark: String,

    /// Base URL of the notification bot service.
    pub notify_url: String,

    /// Timeout for panel and notifier requests, seconds.
    pub remote_timeout_seconds: u64,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Expiry sweep period, seconds.
    pub expiry_sweep_secs: u64,

    /// Disengagement sweep period, seconds.
    pub disengagement_sweep_secs: u64,

    /// Broadcast job period, seconds.
    pub broadcast_sweep_secs: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://subgate.db?mode=rwc".into()),
            settings_path: std::env::var("SETTINGS_PATH")
                .unwrap_or_else(|_| "shop-settings.json".into()),
            api_key: std::env::var("API_KEY").ok(),
            admin_id: std::env::var("ADMIN_ID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            panel_base_url: std::env::var("PANEL_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:2053".into()),
            panel_username: std::env::var("PANEL_USERNAME").unwrap_or_else(|_| "admin".into()),
            panel_password: std::env::var("PANEL_PASSWORD").unwrap_or_else(|_| "admin".into()),
            panel_public_host: std::env::var("PANEL_PUBLIC_HOST").ok(),
            panel_inbound_port: std::env::var("PANEL_INBOUND_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(443),
            panel_inbound_remark: std::env::var("PANEL_INBOUND_REMARK")
                .unwrap_or_else(|_| "subgate".into()),
            notify_url: std::env::var("NOTIFY_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:3001".into()),
            remote_timeout_seconds: std::env::var("REMOTE_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            expiry_sweep_secs: std::env::var("EXPIRY_SWEEP_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(86_400),
            disengagement_sweep_secs: std::env::var("DISENGAGEMENT_SWEEP_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(604_800),
            broadcast_sweep_secs: std::env::var("BROADCAST_SWEEP_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1_209_600),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            database_url: "sqlite://subgate.db?mode=rwc".into(),
            settings_path: "shop-settings.json".into(),
            api_key: None,
            admin_id: 0,
            panel_base_url: "http://127.0.0.1:2053".into(),
            panel_username: "admin".into(),
            panel_password: "admin".into(),
            panel_public_host: None,
            panel_inbound_port: 443,
            panel_inbound_remark: "subgate".into(),
            notify_url: "http://127.0.0.1:3001".into(),
            remote_timeout_seconds: 30,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            expiry_sweep_secs: 86_400,
            disengagement_sweep_secs: 604_800,
            broadcast_sweep_secs: 1_209_600,
        }
    }
}

/// Runtime shop settings.
///
/// Replaced wholesale through the admin endpoint and persisted back to the
/// settings file on every update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopSettings {
    /// Whether new orders are accepted.
    pub accept_new_offers: bool,
    /// Message returned when ordering is paused.
    pub new_offers_message: String,
    /// Whether free-trial offers are confirmed immediately on creation.
    pub auto_accept_free_trial: bool,
    /// Maximum number of registered users. Zero means unlimited.
    pub total_participants_limit: i64,
    /// Message returned when the participant limit is reached.
    pub limit_participants_message: String,
    /// Message shown to newly registered users by the bot.
    pub welcome_message: String,
    /// Discount percentage granted per rewarded referral.
    pub invite_discount: i64,
    /// One-time discount percentage for invited users on their first paid
    /// order.
    pub for_invited_discount: i64,
    /// Message broadcast periodically to all users. Skipped when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcast_message: Option<String>,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            accept_new_offers: true,
            new_offers_message: "New orders are paused for now, check back later".into(),
            auto_accept_free_trial: true,
            total_participants_limit: 0,
            limit_participants_message: "Registration is closed: the participant limit is reached"
                .into(),
            welcome_message: "Welcome! Pick a subscription to get connected".into(),
            invite_discount: 5,
            for_invited_discount: 10,
            broadcast_message: None,
        }
    }
}

impl ShopSettings {
    /// Load settings from a JSON file, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or parsed.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "Settings file absent, using defaults");
            return Ok(Self::default());
        }
        let contents = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Persist settings to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), std::io::Error> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        tokio::fs::write(path.as_ref(), contents).await
    }

    /// Check value ranges before accepting a replacement document.
    ///
    /// # Errors
    ///
    /// Returns a field-specific message for the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        if !(0..=100).contains(&self.invite_discount) {
            return Err("invite_discount must be between 0 and 100".into());
        }
        if !(0..=100).contains(&self.for_invited_discount) {
            return Err("for_invited_discount must be between 0 and 100".into());
        }
        if self.total_participants_limit < 0 {
            return Err("total_participants_limit must not be negative".into());
        }
        Ok(())
    }
}
