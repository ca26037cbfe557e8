//! Periodic maintenance sweeps over the order book.

use serde_json::json;

use subgate_core::tier::BYTES_PER_GB;
use subgate_core::unix_now;

use crate::error::ApiError;
use crate::notify::{format_bytes, friendly_date, Notice};
use crate::orders::EXHAUSTED_SLACK_BYTES;
use crate::state::AppState;

/// Lead time before the entitlement end at which the ending-soon warning
/// fires. Five days.
const ENDING_SOON_LEAD_SECS: i64 = 432_000;

/// Remaining-traffic level at which the running-low warning fires.
const LOW_TRAFFIC_BYTES: i64 = 3 * BYTES_PER_GB;

/// Warn holders of confirmed offers about subscriptions that have ended,
/// are about to end, or are about to run out of traffic.
///
/// Each offer gets at most one notice per run, picked in severity order.
/// Time verdicts are decided from the store alone; the panel is consulted
/// only for offers still comfortably inside their term. A credential that
/// is missing or unreachable just skips its offer.
pub async fn expiry_sweep(state: &AppState) -> Result<(), ApiError> {
    let offers = state.store.confirmed_offers().await?;
    let now = unix_now();
    let mut notices = Vec::new();

    for offer in offers {
        if now >= offer.end_time {
            notices.push(Notice::new(
                offer.user_id.0,
                "Your subscription has ended. Place a new order to continue",
            ));
            continue;
        }

        if now + ENDING_SOON_LEAD_SECS >= offer.end_time {
            notices.push(Notice::new(
                offer.user_id.0,
                format!(
                    "Your subscription ends on {}. Place a new order before it runs out",
                    friendly_date(offer.end_time)
                ),
            ));
            continue;
        }

        let name = offer.credential_name();
        let credential = match state.panel.get_credential(&name).await {
            Ok(Some(credential)) => credential,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(credential = %name, error = %e, "Skipping offer in expiry sweep");
                continue;
            }
        };

        if credential.quota_bytes <= 0 {
            continue;
        }
        let remaining = credential.quota_bytes - credential.used_bytes;

        if remaining <= EXHAUSTED_SLACK_BYTES {
            notices.push(Notice::new(
                offer.user_id.0,
                "Your subscription traffic is used up. Place a new order to continue",
            ));
            continue;
        }

        if remaining <= LOW_TRAFFIC_BYTES {
            notices.push(Notice::new(
                offer.user_id.0,
                format!(
                    "Your subscription is down to {} of traffic. Place a new order before it runs out",
                    format_bytes(remaining)
                ),
            ));
        }
    }

    state.notifier.send(notices).await?;
    Ok(())
}

/// Nudge holders of live offers that have never moved a byte through their
/// credential, attaching a setup-instruction prompt the bot can act on.
pub async fn disengagement_sweep(state: &AppState) -> Result<(), ApiError> {
    let offers = state.store.live_offers(unix_now()).await?;
    let mut notices = Vec::new();

    for offer in offers {
        let name = offer.credential_name();
        let credential = match state.panel.get_credential(&name).await {
            Ok(Some(credential)) => credential,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(
                    credential = %name,
                    error = %e,
                    "Skipping offer in disengagement sweep"
                );
                continue;
            }
        };

        if credential.used_bytes == 0 {
            notices.push(
                Notice::new(
                    offer.user_id.0,
                    "You have a working subscription you never connected to. \
                     Would a short setup walkthrough for your device help?",
                )
                .with_control(json!({ "action": "instruction" })),
            );
        }
    }

    state.notifier.send(notices).await?;
    Ok(())
}

/// Send the configured broadcast message to every registered user.
///
/// Does nothing when no message is configured.
pub async fn broadcast_sweep(state: &AppState) -> Result<(), ApiError> {
    let message = state.settings_snapshot().await.broadcast_message;
    let Some(message) = message.filter(|m| !m.trim().is_empty()) else {
        tracing::debug!("No broadcast message configured, skipping broadcast");
        return Ok(());
    };

    let users = state.store.all_users().await?;
    let notices = users
        .into_iter()
        .map(|user| Notice::new(user.id.0, message.clone()).with_default_options())
        .collect();

    state.notifier.send(notices).await?;
    Ok(())
}
