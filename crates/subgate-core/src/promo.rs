//! Promotional discount codes.

use serde::{Deserialize, Serialize};

use crate::ids::PromoId;

/// A promo code granting a percentage discount at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoCode {
    /// Operator-chosen identifier. [`PromoCode::DEFAULT`] must always exist.
    pub id: PromoId,
    /// Human-readable name.
    pub title: String,
    /// Discount percentage contributed to the order, `0..=100`.
    pub discount_percent: i64,
}

impl PromoCode {
    /// Well-known identifier of the fallback promo applied when an order
    /// names none. Seeded by the store schema with a zero discount.
    pub const DEFAULT: &'static str = "default";

    /// Whether this is the fallback promo.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.id.as_str() == Self::DEFAULT
    }
}
