//! Offer creation.

use serde_json::json;

use subgate_core::{quote, unix_now, DiscountInputs, PromoCode, PromoId, TierId, UserId};
use subgate_store::NewOffer;

use crate::error::ApiError;
use crate::orders::{confirm, OfferDetail};
use crate::state::AppState;

/// Place a new offer for `user_id` against `tier_id`.
///
/// The offer is inserted as pending and the administrator is asked to
/// accept it. Free-trial offers are confirmed on the spot when the shop is
/// configured to auto-accept them; the confirmed detail is returned in that
/// case and the administrator gets the confirmation summary instead of an
/// acceptance request.
pub async fn place(
    state: &AppState,
    user_id: UserId,
    tier_id: TierId,
    promo_id: Option<PromoId>,
) -> Result<OfferDetail, ApiError> {
    let settings = state.settings_snapshot().await;
    if !settings.accept_new_offers {
        return Err(ApiError::Forbidden(settings.new_offers_message.clone()));
    }

    let tier = state
        .store
        .tier(&tier_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("tier not found: {tier_id}")))?;
    let user = state
        .store
        .user(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user not found: {user_id}")))?;

    if tier.is_free() && user.free_trial_used {
        return Err(ApiError::Forbidden(
            "the free trial is only available on the first order".into(),
        ));
    }

    let promo = match promo_id {
        Some(id) => state
            .store
            .promo(&id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("promo code not found: {id}")))?,
        None => state
            .store
            .promo(&PromoId::from(PromoCode::DEFAULT))
            .await?
            .ok_or_else(|| ApiError::Internal("the default promo code is missing".into()))?,
    };

    // First-order bonus: the buyer was invited and has never confirmed a
    // paid order.
    let inviter = match user.invited_with_code.as_deref() {
        Some(code) => state.store.user_by_invite_code(code).await?,
        None => None,
    };
    let prior_paid = state.store.confirmed_paid_offer(user.id, None).await?;

    let priced = quote(
        tier.price,
        &DiscountInputs {
            promo_percent: promo.discount_percent,
            invite_percent: settings.invite_discount,
            invite_count: user.invite_count,
            first_order_bonus_percent: settings.for_invited_discount,
            applies_first_order_bonus: inviter.is_some() && prior_paid.is_none(),
        },
    );

    let now = unix_now();
    let offer_id = state
        .store
        .insert_offer(&NewOffer {
            user_id: user.id,
            tier_id: tier.id.clone(),
            promo_id: promo.id.clone(),
            payment: priced.payment,
            discount_percent: priced.discount_percent,
            created_at: now,
            end_time: now + tier.duration_secs,
        })
        .await?;

    tracing::info!(
        offer_id = %offer_id,
        user_id = %user.id,
        tier_id = %tier.id,
        payment = priced.payment,
        discount_percent = priced.discount_percent,
        "Offer placed"
    );

    if settings.auto_accept_free_trial && tier.is_free() {
        return confirm::confirm_by_id(state, offer_id).await;
    }

    state
        .notifier
        .send(vec![state
            .notifier
            .admin_notice(format!(
                "New order #{offer_id} from {} (@{}): \"{}\", to pay {}",
                user.display_name, user.handle, tier.title, priced.payment
            ))
            .with_control(json!({ "action": "accept offer", "offer_id": offer_id.0 }))])
        .await?;

    let offer = state
        .store
        .offer(offer_id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("offer {offer_id} vanished after insert")))?;

    Ok(OfferDetail::for_offer(&offer, &tier, &promo, user.invite_count))
}
