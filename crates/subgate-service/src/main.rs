//! Subgate Service - HTTP API for the subscription order engine
//!
//! This is the main entry point for the subgate service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subgate_panel::{PanelClient, PanelConfig};
use subgate_service::{create_router, AppState, Notifier, ServiceConfig, ShopSettings};
use subgate_store::SqliteStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,subgate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Subgate Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        database_url = %config.database_url,
        panel_base_url = %config.panel_base_url,
        notify_url = %config.notify_url,
        api_key_configured = %config.api_key.is_some(),
        "Service configuration loaded"
    );

    // Open the store
    let store = Arc::new(SqliteStore::connect(&config.database_url).await?);

    // Load the runtime shop settings
    let settings = ShopSettings::load(&config.settings_path).await?;

    // Connect the panel client and make sure the shared inbound exists
    let panel = Arc::new(PanelClient::new(PanelConfig {
        base_url: config.panel_base_url.clone(),
        username: config.panel_username.clone(),
        password: config.panel_password.clone(),
        public_host: config.panel_public_host.clone(),
        inbound_port: config.panel_inbound_port,
        inbound_remark: config.panel_inbound_remark.clone(),
        timeout_seconds: config.remote_timeout_seconds,
    })?);
    let inbound_id = panel.init_inbound().await?;
    tracing::info!(inbound_id, "Panel inbound ready");

    // Notification channel to the bot service
    let notifier = Arc::new(Notifier::new(
        config.notify_url.clone(),
        config.admin_id,
        config.remote_timeout_seconds,
    )?);

    // Build app state
    let state = AppState::new(store, panel, notifier, settings, config.clone());

    // Spawn the maintenance sweeps
    let jobs = subgate_service::jobs::spawn_all(Arc::new(state.clone()));
    tracing::info!(jobs = jobs.len(), "Maintenance jobs scheduled");

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
