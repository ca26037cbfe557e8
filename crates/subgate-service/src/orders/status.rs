//! Subscription status lookup.

use serde::Serialize;

use subgate_core::{unix_now, UserId};

use crate::error::ApiError;
use crate::orders::EXHAUSTED_SLACK_BYTES;
use crate::state::AppState;

/// Status view of a user's latest offer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StatusView {
    /// The latest offer is awaiting confirmation.
    Waiting {
        /// Offer id.
        offer_id: i64,
        /// Human-readable tier name.
        tier_title: String,
        /// Tier traffic quota in gigabytes. Zero means unlimited.
        data_limit_gb: i64,
        /// Tier entitlement duration in seconds.
        duration_secs: i64,
    },
    /// The latest offer is confirmed; traffic figures come from the live
    /// panel credential.
    Active {
        /// Human-readable tier name.
        tier_title: String,
        /// Traffic consumed so far, bytes.
        used_bytes: i64,
        /// Provisioned quota, bytes. Zero means unlimited.
        quota_bytes: i64,
        /// Tier traffic quota in gigabytes. Zero means unlimited.
        data_limit_gb: i64,
        /// Offer creation time, UNIX seconds.
        created_at: i64,
        /// Credential expiry, UNIX seconds.
        expires_at: i64,
        /// The user's own invite code.
        invite_code: String,
        /// Rewarded referrals since the last confirmed order.
        invite_count: i64,
        /// Discount percentage the referrals would earn on the next order.
        next_pay_discount: i64,
        /// Amount collected for this offer, minor currency units.
        price: i64,
        /// Connection string of the live credential.
        conn_string: String,
        /// Whether the provisioned quota differs from the tier quota.
        quota_drift: bool,
        /// Whether the credential has expired or exhausted its traffic.
        is_expired: bool,
    },
}

/// Build the status view for a user's most recent offer.
///
/// Confirmed offers are reported live: the panel is queried for the
/// credential's traffic and expiry. A pending free-trial offer is treated
/// as no order at all; the bot never shows a waiting screen for trials.
pub async fn latest_for_user(state: &AppState, user_id: UserId) -> Result<StatusView, ApiError> {
    let user = state
        .store
        .user(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user not found: {user_id}")))?;

    let offer = state
        .store
        .latest_offer(user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("no active orders".into()))?;
    let tier = state
        .store
        .tier(&offer.tier_id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("offer {} references a missing tier", offer.id)))?;

    let Some(conn_string) = offer.conn_string.clone() else {
        if tier.is_free() {
            return Err(ApiError::NotFound("no active orders".into()));
        }
        return Ok(StatusView::Waiting {
            offer_id: offer.id.0,
            tier_title: tier.title,
            data_limit_gb: tier.data_limit_gb,
            duration_secs: tier.duration_secs,
        });
    };

    let name = offer.credential_name();
    let credential = state
        .panel
        .get_credential(&name)
        .await?
        .ok_or_else(|| ApiError::NotFound("no active orders".into()))?;

    let settings = state.settings_snapshot().await;
    let limited = credential.quota_bytes > 0;
    let remaining = credential.quota_bytes - credential.used_bytes;
    let is_expired = credential.expires_at <= unix_now()
        || (limited && remaining <= EXHAUSTED_SLACK_BYTES);

    Ok(StatusView::Active {
        tier_title: tier.title.clone(),
        used_bytes: credential.used_bytes,
        quota_bytes: credential.quota_bytes,
        data_limit_gb: tier.data_limit_gb,
        created_at: offer.created_at,
        expires_at: credential.expires_at,
        invite_code: user.invite_code,
        invite_count: user.invite_count,
        next_pay_discount: (user.invite_count * settings.invite_discount).min(100),
        price: offer.payment,
        conn_string,
        quota_drift: credential.quota_bytes != tier.data_limit_bytes(),
        is_expired,
    })
}
