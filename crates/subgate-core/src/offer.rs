//! Offers: the unit of the order lifecycle.
//!
//! An offer is born `pending`, becomes `confirmed` when a panel credential
//! has been provisioned for it (its connection string is persisted), and is
//! deleted outright on rejection. There is no separate status column; the
//! state is derived from connection-string presence.

use serde::{Deserialize, Serialize};

use crate::ids::{OfferId, PromoId, TierId, UserId};

/// Lifecycle state of an offer, derived from credential presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    /// Placed and priced, awaiting confirmation.
    Pending,
    /// Confirmed and provisioned; the connection string is set.
    Confirmed,
}

/// An order placed by a user against a tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Store-assigned identifier. Later offers carry larger ids.
    pub id: OfferId,
    /// The ordering user.
    pub user_id: UserId,
    /// Ordered tier.
    pub tier_id: TierId,
    /// Promo code applied at creation time.
    pub promo_id: PromoId,
    /// Amount to collect, minor currency units.
    pub payment: i64,
    /// Effective discount percentage reflected by the payment.
    pub discount_percent: i64,
    /// Creation time, UNIX seconds.
    pub created_at: i64,
    /// Entitlement end, UNIX seconds: creation time plus tier duration.
    pub end_time: i64,
    /// Connection string of the provisioned credential. Present exactly
    /// when the offer is confirmed.
    pub conn_string: Option<String>,
}

impl Offer {
    /// Derived lifecycle status.
    #[must_use]
    pub fn status(&self) -> OfferStatus {
        if self.conn_string.is_some() {
            OfferStatus::Confirmed
        } else {
            OfferStatus::Pending
        }
    }

    /// Whether the offer has been confirmed and provisioned.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.conn_string.is_some()
    }

    /// Name of the panel credential backing this offer.
    #[must_use]
    pub fn credential_name(&self) -> String {
        format!("{}_{}", self.tier_id, self.id)
    }

    /// Whether the entitlement has ended as of `now` (UNIX seconds).
    #[must_use]
    pub fn is_ended(&self, now: i64) -> bool {
        now >= self.end_time
    }
}
