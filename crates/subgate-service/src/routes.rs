//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post, put};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, health, offers, users};
use crate::state::AppState;

/// Maximum concurrent requests for API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## API (service API key auth)
/// - `POST /v1/users` - Register a user
/// - `POST /v1/offers` - Place an offer
/// - `GET /v1/offers/latest` - Report a user's latest offer
/// - `POST /v1/offers/:id/confirm` - Confirm a pending offer
/// - `POST /v1/offers/:id/reject` - Reject a pending offer
/// - `POST /v1/offers/recreate` - Recreate live panel credentials
/// - `GET /v1/admin/settings` - Read shop settings
/// - `PUT /v1/admin/settings` - Replace shop settings
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Create concurrency-limited API routes
    let api_routes = Router::new()
        // Users
        .route("/users", post(users::register_user))
        // Offers
        .route("/offers", post(offers::create_offer))
        .route("/offers/latest", get(offers::latest_offer))
        .route("/offers/:id/confirm", post(offers::confirm_offer))
        .route("/offers/:id/reject", post(offers::reject_offer))
        .route("/offers/recreate", post(offers::recreate_offers))
        // Shop settings
        .route("/admin/settings", get(admin::get_settings))
        .route("/admin/settings", put(admin::update_settings))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
