//! User registration handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use subgate_core::{generate_invite_code, unix_now, User, UserId};
use subgate_store::StoreError;

use crate::auth::ApiKeyAuth;
use crate::error::ApiError;
use crate::notify::Notice;
use crate::state::AppState;

/// Longest accepted messenger handle.
const MAX_HANDLE_CHARS: usize = 32;
/// Longest accepted display name.
const MAX_DISPLAY_NAME_CHARS: usize = 100;
/// Attempts at allocating an unclaimed invite code before giving up.
const INVITE_CODE_ATTEMPTS: usize = 5;

/// Registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    /// Messenger-assigned user id.
    pub id: i64,
    /// Messenger handle.
    pub handle: String,
    /// Display name.
    pub display_name: String,
    /// Invite code of the referring user, if any.
    #[serde(default)]
    pub invited_with_code: Option<String>,
}

/// Register a new user.
///
/// Returns the stored user, including the freshly minted invite code.
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    _auth: ApiKeyAuth,
    Json(body): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    if body.handle.is_empty() || body.handle.chars().count() > MAX_HANDLE_CHARS {
        return Err(ApiError::BadRequest(format!(
            "handle must be 1 to {MAX_HANDLE_CHARS} characters"
        )));
    }
    if body.display_name.is_empty() || body.display_name.chars().count() > MAX_DISPLAY_NAME_CHARS {
        return Err(ApiError::BadRequest(format!(
            "display_name must be 1 to {MAX_DISPLAY_NAME_CHARS} characters"
        )));
    }

    let settings = state.settings_snapshot().await;
    let total = state.store.count_users().await?;
    if settings.total_participants_limit > 0 && total >= settings.total_participants_limit {
        return Err(ApiError::Forbidden(settings.limit_participants_message));
    }

    let user = insert_with_fresh_code(&state, &body).await?;

    tracing::info!(user_id = %user.id, handle = %user.handle, "User registered");

    let mut notices = Vec::new();
    if let Some(code) = &body.invited_with_code {
        if let Some(inviter) = state.store.user_by_invite_code(code).await? {
            notices.push(Notice::new(
                inviter.id.0,
                format!(
                    "Your referral link was used by @{}. Once they place a paid \
                     order, your discount grows by {}%",
                    user.handle, settings.invite_discount
                ),
            ));
        }
    }
    notices.push(state.notifier.admin_notice(format!(
        "New user @{} \"{}\". Total users: {}",
        user.handle,
        user.display_name,
        total + 1
    )));
    state.notifier.send(notices).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Insert the user, regenerating the invite code on collision.
///
/// The code space is small enough that collisions happen in practice; any
/// other constraint breach (a duplicate user id, say) is passed through.
async fn insert_with_fresh_code(
    state: &AppState,
    body: &RegisterUserRequest,
) -> Result<User, ApiError> {
    for _ in 0..INVITE_CODE_ATTEMPTS {
        let user = User {
            id: UserId(body.id),
            handle: body.handle.clone(),
            display_name: body.display_name.clone(),
            registered_at: unix_now(),
            invite_code: generate_invite_code(),
            invited_with_code: body.invited_with_code.clone(),
            free_trial_used: false,
            invite_count: 0,
        };
        match state.store.insert_user(&user).await {
            Ok(()) => return Ok(user),
            Err(StoreError::Constraint(msg)) if msg.contains("invite_code") => {
                tracing::debug!(user_id = body.id, "Invite code collision, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(ApiError::Internal(
        "could not allocate a free invite code".into(),
    ))
}
