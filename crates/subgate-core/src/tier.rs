//! Subscription tiers.

use serde::{Deserialize, Serialize};

use crate::ids::TierId;

/// Bytes in one gigabyte of tier quota.
pub const BYTES_PER_GB: i64 = 1024 * 1024 * 1024;

/// A subscription tier a user can place an order against.
///
/// Tiers are reference data created out of band; the engine never mutates
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    /// Operator-chosen identifier. [`Tier::FREE`] marks the trial tier.
    pub id: TierId,
    /// Human-readable name shown in notices and status views.
    pub title: String,
    /// Traffic quota in gigabytes. Zero means unlimited.
    pub data_limit_gb: i64,
    /// Entitlement duration in seconds.
    pub duration_secs: i64,
    /// Price in minor currency units. Zero for the trial tier.
    pub price: i64,
    /// Whether promo codes may be applied to this tier.
    pub promo_eligible: bool,
}

impl Tier {
    /// Well-known identifier of the free trial tier.
    pub const FREE: &'static str = "free";

    /// Traffic quota in bytes, as provisioned on the panel. Zero means
    /// unlimited.
    #[must_use]
    pub fn data_limit_bytes(&self) -> i64 {
        self.data_limit_gb * BYTES_PER_GB
    }

    /// Whether this is the free trial tier.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.id.as_str() == Self::FREE
    }
}
