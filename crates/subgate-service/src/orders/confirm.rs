//! Offer confirmation and rejection.

use subgate_core::{Offer, OfferId, PromoCode, Tier, User};

use crate::error::ApiError;
use crate::notify::Notice;
use crate::orders::OfferDetail;
use crate::state::AppState;

/// Everything the confirmation procedure needs, resolved up front.
///
/// `prior_paid` and `inviter` are pinned before migration touches any
/// connection strings; the referral decision must see the store as it was
/// when confirmation began.
#[derive(Debug, Clone)]
pub struct ConfirmContext {
    /// The offer being confirmed.
    pub offer: Offer,
    /// The ordering user, as loaded with the offer.
    pub user: User,
    /// The ordered tier.
    pub tier: Tier,
    /// The applied promo code.
    pub promo: PromoCode,
    /// A confirmed paid offer of the same user other than this one, if any.
    pub prior_paid: Option<Offer>,
    /// The user who issued `invited_with_code`, if it resolves.
    pub inviter: Option<User>,
}

/// Resolve the confirmation context for an offer.
///
/// Missing offer → not-found; a dangling tier or promo reference is data
/// corruption and surfaces as an internal error.
pub async fn load_context(state: &AppState, offer_id: OfferId) -> Result<ConfirmContext, ApiError> {
    let offer = state
        .store
        .offer(offer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("offer not found: {offer_id}")))?;
    let user = state
        .store
        .user(offer.user_id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("offer {offer_id} references a missing user")))?;
    let tier = state
        .store
        .tier(&offer.tier_id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("offer {offer_id} references a missing tier")))?;
    let promo = state
        .store
        .promo(&offer.promo_id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("offer {offer_id} references a missing promo")))?;

    let prior_paid = state
        .store
        .confirmed_paid_offer(offer.user_id, Some(offer.id))
        .await?;
    let inviter = match user.invited_with_code.as_deref() {
        Some(code) => state.store.user_by_invite_code(code).await?,
        None => None,
    };

    Ok(ConfirmContext {
        offer,
        user,
        tier,
        promo,
        prior_paid,
        inviter,
    })
}

/// Confirm an offer by id. Entry point for the HTTP handler.
pub async fn confirm_by_id(state: &AppState, offer_id: OfferId) -> Result<OfferDetail, ApiError> {
    let ctx = load_context(state, offer_id).await?;
    if ctx.offer.is_confirmed() {
        return Err(ApiError::Conflict(format!(
            "offer {offer_id} is already confirmed"
        )));
    }
    confirm(state, ctx).await
}

/// The confirmation procedure proper.
///
/// Retires the user's previous credential (best effort on the panel side),
/// provisions the new one, persists the connection string, updates user
/// bookkeeping and referral state, and delivers the notification batch.
/// Only after the remote create succeeds does the offer become confirmed.
pub async fn confirm(state: &AppState, ctx: ConfirmContext) -> Result<OfferDetail, ApiError> {
    let ConfirmContext {
        offer,
        user,
        tier,
        promo,
        prior_paid,
        inviter,
    } = ctx;

    // Retire the previous live credential. Panel-side absence or failure
    // never aborts the confirmation; the local clear must happen either way
    // so at most one offer stays live.
    if let Some(prior) = state
        .store
        .prior_confirmed_offer(offer.user_id, offer.id)
        .await?
    {
        let prior_name = prior.credential_name();
        if let Err(err) = state.panel.delete_credential(&prior_name).await {
            tracing::warn!(
                offer_id = %prior.id,
                credential = %prior_name,
                error = %err,
                "Failed to retire the previous credential, continuing"
            );
        }
        state.store.set_conn_string(prior.id, None).await?;
        tracing::info!(offer_id = %prior.id, "Previous offer retired");
    }

    let name = offer.credential_name();
    let credential = state
        .panel
        .create_credential(&name, tier.data_limit_bytes(), offer.end_time * 1000)
        .await?;
    state
        .store
        .set_conn_string(offer.id, Some(&credential.conn_string))
        .await?;

    tracing::info!(offer_id = %offer.id, credential = %name, "Offer confirmed");

    if !user.free_trial_used {
        state.store.mark_trial_used(user.id).await?;
    }
    if user.invite_count != 0 {
        state.store.reset_invite_count(user.id).await?;
    }

    let settings = state.settings_snapshot().await;
    let mut notices = vec![state.notifier.admin_notice(format!(
        "Order #{} confirmed: \"{}\" for {} (@{})",
        offer.id, tier.title, user.display_name, user.handle
    ))];

    // Referral reward: first confirmed paid order of an invited user.
    if !tier.is_free() && prior_paid.is_none() {
        if let Some(inviter) = &inviter {
            state.store.increment_invite_count(inviter.id).await?;
            tracing::info!(
                inviter_id = %inviter.id,
                user_id = %user.id,
                "Referral rewarded"
            );
            notices.push(Notice::new(
                inviter.id.0,
                format!(
                    "@{} placed their first paid order with your invite code. \
                     You earn an extra {}% off your next payment; friends invited so far: {}",
                    user.handle,
                    settings.invite_discount,
                    inviter.invite_count + 1
                ),
            ));
        }
    }

    if !tier.is_free() {
        notices.push(
            Notice::new(
                user.id.0,
                format!(
                    "Your order \"{}\" is confirmed. Open \"My subscription\" for the details",
                    tier.title
                ),
            )
            .with_default_options(),
        );
    }

    state.notifier.send(notices).await?;

    let mut offer = offer;
    offer.conn_string = Some(credential.conn_string);
    Ok(OfferDetail::for_offer(&offer, &tier, &promo, user.invite_count))
}

/// Reject a pending offer, deleting it.
///
/// Confirmed offers cannot be rejected; retire them by confirming a newer
/// order instead.
pub async fn reject_by_id(state: &AppState, offer_id: OfferId) -> Result<(), ApiError> {
    let offer = state
        .store
        .offer(offer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("offer not found: {offer_id}")))?;

    if offer.is_confirmed() {
        return Err(ApiError::Conflict(format!(
            "offer {offer_id} is already confirmed"
        )));
    }

    state.store.delete_offer(offer_id).await?;
    tracing::info!(offer_id = %offer_id, "Offer rejected");

    state
        .notifier
        .send(vec![
            state
                .notifier
                .admin_notice(format!("Order #{offer_id} rejected")),
            Notice::new(
                offer.user_id.0,
                "Your order was rejected. You can place a new one at any time",
            ),
        ])
        .await?;

    Ok(())
}
