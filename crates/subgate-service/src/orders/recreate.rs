//! Bulk credential re-provisioning.
//!
//! Operator tooling for panel mishaps: the live credential of each listed
//! user is deleted and recreated under the same name, carrying over the
//! measured remaining traffic and the stored entitlement end. Refusals
//! (expired or exhausted subscriptions) abort the request with a
//! user-facing message; they are never silently skipped.

use subgate_core::{unix_now, Offer, UserId};

use crate::error::ApiError;
use crate::notify::Notice;
use crate::orders::EXHAUSTED_SLACK_BYTES;
use crate::state::AppState;

/// Recreate the live credentials of the given users.
///
/// Returns the number of credentials recreated. Users without a live offer
/// are skipped; if none of the users has one, the whole request is
/// not-found.
pub async fn recreate_for_users(
    state: &AppState,
    users: &[i64],
    notify: bool,
) -> Result<u64, ApiError> {
    if users.is_empty() {
        return Err(ApiError::BadRequest("users must not be empty".into()));
    }

    let now = unix_now();
    let mut targets: Vec<Offer> = Vec::new();
    for &id in users {
        if let Some(offer) = state.store.latest_live_offer(UserId(id), now).await? {
            targets.push(offer);
        }
    }

    if targets.is_empty() {
        return Err(ApiError::NotFound(
            "no live orders for the given users".into(),
        ));
    }

    let mut recreated = 0u64;
    for offer in targets {
        let name = offer.credential_name();
        let credential = state
            .panel
            .get_credential(&name)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("credential {name} is gone from the panel")))?;

        if credential.expires_at <= now {
            return Err(ApiError::Forbidden(format!(
                "the subscription of user {} has expired, a new order is needed",
                offer.user_id
            )));
        }

        let limited = credential.quota_bytes > 0;
        let remaining = credential.quota_bytes - credential.used_bytes;
        if limited && remaining <= EXHAUSTED_SLACK_BYTES {
            return Err(ApiError::Forbidden(format!(
                "the traffic of user {} is exhausted, a new order is needed",
                offer.user_id
            )));
        }

        state.panel.delete_credential(&name).await?;
        let quota = if limited { remaining } else { 0 };
        let fresh = state
            .panel
            .create_credential(&name, quota, offer.end_time * 1000)
            .await?;
        state
            .store
            .set_conn_string(offer.id, Some(&fresh.conn_string))
            .await?;
        recreated += 1;

        tracing::info!(
            offer_id = %offer.id,
            credential = %name,
            quota_bytes = quota,
            "Credential recreated"
        );

        if notify {
            state
                .notifier
                .send(vec![Notice::new(
                    offer.user_id.0,
                    "Your connection details were refreshed automatically. \
                     Open \"My subscription\" to pick up the new link",
                )
                .with_default_options()])
                .await?;
        }
    }

    Ok(recreated)
}
