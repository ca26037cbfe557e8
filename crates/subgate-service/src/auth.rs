//! Authentication extractor.
//!
//! Every `/v1` route is guarded by a shared API key carried in the
//! `x-api-key` header. The key is optional in configuration: when unset
//! (local development, tests) the guard admits everything.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::state::AppState;

/// Proof that the caller presented the configured API key.
#[derive(Debug, Clone)]
pub struct ApiKeyAuth;

impl FromRequestParts<Arc<AppState>> for ApiKeyAuth {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let Some(expected) = state.config.api_key.as_ref() else {
                return Ok(ApiKeyAuth);
            };

            let api_key = parts
                .headers
                .get("x-api-key")
                .and_then(|v| v.to_str().ok())
                .ok_or(ApiError::Unauthorized)?;

            if api_key != expected {
                return Err(ApiError::Unauthorized);
            }

            Ok(ApiKeyAuth)
        })
    }
}
