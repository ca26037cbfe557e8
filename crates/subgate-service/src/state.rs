//! Application state.

use std::sync::Arc;

use tokio::sync::RwLock;

use subgate_panel::PanelClient;
use subgate_store::Store;

use crate::config::{ServiceConfig, ShopSettings};
use crate::notify::Notifier;

/// Application state shared across handlers and jobs.
#[derive(Clone)]
pub struct AppState {
    /// The record store.
    pub store: Arc<dyn Store>,

    /// The panel provisioning client.
    pub panel: Arc<PanelClient>,

    /// The notification channel.
    pub notifier: Arc<Notifier>,

    /// Runtime shop settings, replaceable through the admin endpoint.
    pub settings: Arc<RwLock<ShopSettings>>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        panel: Arc<PanelClient>,
        notifier: Arc<Notifier>,
        settings: ShopSettings,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            panel,
            notifier,
            settings: Arc::new(RwLock::new(settings)),
            config,
        }
    }

    /// A point-in-time copy of the shop settings.
    pub async fn settings_snapshot(&self) -> ShopSettings {
        self.settings.read().await.clone()
    }
}
