//! The offer state machine: creation, confirmation, rejection, status
//! lookup and bulk re-provisioning.
//!
//! An offer is pending until its panel credential exists, confirmed once the
//! connection string is persisted, and gone once rejected. Confirmation is
//! the only door between the states and owns credential migration and
//! referral bookkeeping.

pub mod confirm;
pub mod create;
pub mod recreate;
pub mod status;

use serde::Serialize;

use subgate_core::{Offer, PromoCode, Tier};

/// Remaining-traffic floor below which a limited credential counts as
/// exhausted. Matches the panel's own accounting slack.
pub(crate) const EXHAUSTED_SLACK_BYTES: i64 = 1024;

/// Client-facing summary of a priced order.
///
/// Free-trial offers omit the price breakdown: the trial costs nothing and
/// the bot renders it without payment details.
#[derive(Debug, Clone, Serialize)]
pub struct OfferDetail {
    /// Offer id.
    pub offer_id: i64,
    /// Human-readable tier name.
    pub tier_title: String,
    /// Human-readable name of the applied promo.
    pub promo_title: String,
    /// Amount to collect, minor currency units.
    pub to_pay: i64,
    /// Tier base price. Absent for free-trial offers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    /// Effective discount percentage. Absent for free-trial offers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<i64>,
    /// Rewarded referrals counted into the price. Absent for free-trial
    /// offers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_count: Option<i64>,
    /// Connection string. Present once the offer is confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conn_string: Option<String>,
}

impl OfferDetail {
    /// Build the client-facing view of an offer.
    ///
    /// `user_invite_count` is the buyer's rewarded-referral counter as
    /// loaded with the order, before any confirmation-time reset.
    #[must_use]
    pub fn for_offer(offer: &Offer, tier: &Tier, promo: &PromoCode, user_invite_count: i64) -> Self {
        let (price, discount_percent, invite_count) = if tier.is_free() {
            (None, None, None)
        } else {
            (
                Some(tier.price),
                Some(offer.discount_percent),
                Some(user_invite_count),
            )
        };

        Self {
            offer_id: offer.id.0,
            tier_title: tier.title.clone(),
            promo_title: promo.title.clone(),
            to_pay: offer.payment,
            price,
            discount_percent,
            invite_count,
            conn_string: offer.conn_string.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subgate_core::{OfferId, PromoId, TierId, UserId};

    fn tier(id: &str, price: i64) -> Tier {
        Tier {
            id: TierId::from(id),
            title: id.to_owned(),
            data_limit_gb: 30,
            duration_secs: 2_592_000,
            price,
            promo_eligible: true,
        }
    }

    fn promo() -> PromoCode {
        PromoCode {
            id: PromoId::from("default"),
            title: "Default".to_owned(),
            discount_percent: 0,
        }
    }

    fn offer(tier_id: &str, conn: Option<&str>) -> Offer {
        Offer {
            id: OfferId(9),
            user_id: UserId(42),
            tier_id: TierId::from(tier_id),
            promo_id: PromoId::from("default"),
            payment: 800,
            discount_percent: 20,
            created_at: 1_700_000_000,
            end_time: 1_702_592_000,
            conn_string: conn.map(str::to_owned),
        }
    }

    #[test]
    fn paid_detail_carries_the_price_breakdown() {
        let detail = OfferDetail::for_offer(&offer("light", None), &tier("light", 1000), &promo(), 2);
        assert_eq!(detail.price, Some(1000));
        assert_eq!(detail.discount_percent, Some(20));
        assert_eq!(detail.invite_count, Some(2));
        assert_eq!(detail.conn_string, None);
    }

    #[test]
    fn free_detail_omits_the_price_breakdown() {
        let detail =
            OfferDetail::for_offer(&offer("free", Some("vless://x")), &tier("free", 0), &promo(), 2);
        assert_eq!(detail.price, None);
        assert_eq!(detail.discount_percent, None);
        assert_eq!(detail.invite_count, None);
        assert_eq!(detail.conn_string.as_deref(), Some("vless://x"));
    }
}
