//! Offer lifecycle handlers.
//!
//! Thin HTTP shells over [`crate::orders`], which owns the actual state
//! machine.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use subgate_core::{OfferId, PromoId, TierId, UserId};

use crate::auth::ApiKeyAuth;
use crate::error::ApiError;
use crate::orders::status::StatusView;
use crate::orders::{self, OfferDetail};
use crate::state::AppState;

/// Offer creation request.
#[derive(Debug, Deserialize)]
pub struct CreateOfferRequest {
    /// Buyer's user id.
    pub user_id: i64,
    /// Tier to order.
    pub tier_id: String,
    /// Promo code to apply. Omitted means the default promo.
    #[serde(default)]
    pub promo_id: Option<String>,
}

/// Place a new offer.
pub async fn create_offer(
    State(state): State<Arc<AppState>>,
    _auth: ApiKeyAuth,
    Json(body): Json<CreateOfferRequest>,
) -> Result<(StatusCode, Json<OfferDetail>), ApiError> {
    let detail = orders::create::place(
        &state,
        UserId(body.user_id),
        TierId::from(body.tier_id.as_str()),
        body.promo_id.as_deref().map(PromoId::from),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

/// Status lookup query parameters.
#[derive(Debug, Deserialize)]
pub struct LatestOfferQuery {
    /// User whose latest offer to report.
    pub user_id: i64,
}

/// Report the state of a user's latest offer.
pub async fn latest_offer(
    State(state): State<Arc<AppState>>,
    _auth: ApiKeyAuth,
    Query(query): Query<LatestOfferQuery>,
) -> Result<Json<StatusView>, ApiError> {
    let view = orders::status::latest_for_user(&state, UserId(query.user_id)).await?;
    Ok(Json(view))
}

/// Confirm a pending offer.
pub async fn confirm_offer(
    State(state): State<Arc<AppState>>,
    _auth: ApiKeyAuth,
    Path(offer_id): Path<i64>,
) -> Result<Json<OfferDetail>, ApiError> {
    let detail = orders::confirm::confirm_by_id(&state, OfferId(offer_id)).await?;
    Ok(Json(detail))
}

/// Reject a pending offer.
pub async fn reject_offer(
    State(state): State<Arc<AppState>>,
    _auth: ApiKeyAuth,
    Path(offer_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    orders::confirm::reject_by_id(&state, OfferId(offer_id)).await?;
    Ok(Json(serde_json::json!({ "rejected": true })))
}

/// Bulk re-provisioning request.
#[derive(Debug, Deserialize)]
pub struct RecreateRequest {
    /// Users whose live credentials to recreate.
    pub users: Vec<i64>,
    /// Whether to notify each affected user.
    #[serde(default)]
    pub notify: bool,
}

/// Bulk re-provisioning response.
#[derive(Debug, Serialize)]
pub struct RecreateResponse {
    /// Number of credentials recreated.
    pub recreated: u64,
}

/// Recreate the live credentials of the listed users.
pub async fn recreate_offers(
    State(state): State<Arc<AppState>>,
    _auth: ApiKeyAuth,
    Json(body): Json<RecreateRequest>,
) -> Result<Json<RecreateResponse>, ApiError> {
    let recreated = orders::recreate::recreate_for_users(&state, &body.users, body.notify).await?;
    Ok(Json(RecreateResponse { recreated }))
}
