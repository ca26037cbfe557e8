//! Pricing: turns a tier base price and the buyer's accumulated discounts
//! into the amount to collect.
//!
//! Three discount sources feed an order: the applied promo code, a
//! per-referral percentage for each rewarded referral, and a one-time bonus
//! for invited users placing their first paid order. The sources are summed
//! into a single percentage and applied once; the payment is rounded up and
//! never goes below zero. The reported discount is derived back from the
//! final payment so rounding in the buyer's favor stays visible.

use serde::{Deserialize, Serialize};

/// Discount sources feeding a quote.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscountInputs {
    /// Percentage contributed by the applied promo code.
    pub promo_percent: i64,
    /// Percentage granted per rewarded referral.
    pub invite_percent: i64,
    /// Rewarded referrals since the buyer's last confirmed order.
    pub invite_count: i64,
    /// One-time bonus percentage for invited buyers on their first paid
    /// order.
    pub first_order_bonus_percent: i64,
    /// Whether the first-order bonus applies: the buyer was invited and has
    /// no prior confirmed paid order.
    pub applies_first_order_bonus: bool,
}

/// A priced order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Amount to collect, minor currency units. Never negative.
    pub payment: i64,
    /// Effective discount derived from the payment, rounded up, `0..=100`.
    /// Zero when the base price is zero.
    pub discount_percent: i64,
}

/// Prices an order.
///
/// The total discount percentage is
/// `promo + invite_percent * invite_count (+ first-order bonus)`, capped at
/// 100 so the payment bottoms out at zero. The payment is
/// `ceil(base_price * (100 - total) / 100)`.
#[must_use]
pub fn quote(base_price: i64, inputs: &DiscountInputs) -> Quote {
    let mut total_percent = inputs.promo_percent + inputs.invite_percent * inputs.invite_count;
    if inputs.applies_first_order_bonus {
        total_percent += inputs.first_order_bonus_percent;
    }
    let total_percent = total_percent.clamp(0, 100);

    let payment = ceil_div(base_price * (100 - total_percent), 100);

    let discount_percent = if base_price == 0 {
        0
    } else {
        ceil_div((base_price - payment) * 100, base_price)
    };

    Quote {
        payment,
        discount_percent,
    }
}

/// Ceiling division for non-negative operands.
fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    (numerator + denominator - 1) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(promo: i64, invite: i64, count: i64, bonus: i64, applies: bool) -> DiscountInputs {
        DiscountInputs {
            promo_percent: promo,
            invite_percent: invite,
            invite_count: count,
            first_order_bonus_percent: bonus,
            applies_first_order_bonus: applies,
        }
    }

    #[test]
    fn no_discounts_pays_full_price() {
        let q = quote(1000, &DiscountInputs::default());
        assert_eq!(q.payment, 1000);
        assert_eq!(q.discount_percent, 0);
    }

    #[test]
    fn discount_sources_sum_before_applying() {
        // 10% promo plus two referrals at 5% each -> 20% off.
        let q = quote(1000, &inputs(10, 5, 2, 0, false));
        assert_eq!(q.payment, 800);
        assert_eq!(q.discount_percent, 20);
    }

    #[test]
    fn first_order_bonus_joins_the_sum_when_applicable() {
        let q = quote(1000, &inputs(10, 5, 2, 25, true));
        assert_eq!(q.payment, 550);
        assert_eq!(q.discount_percent, 45);
    }

    #[test]
    fn first_order_bonus_is_ignored_when_not_applicable() {
        let q = quote(1000, &inputs(0, 0, 0, 25, false));
        assert_eq!(q.payment, 1000);
        assert_eq!(q.discount_percent, 0);
    }

    #[test]
    fn total_discount_caps_at_one_hundred() {
        let q = quote(1000, &inputs(60, 10, 5, 0, false));
        assert_eq!(q.payment, 0);
        assert_eq!(q.discount_percent, 100);
    }

    #[test]
    fn payment_rounds_up_in_integer_currency() {
        // 999 * 0.90 = 899.1, collected as 900.
        let q = quote(999, &inputs(10, 0, 0, 0, false));
        assert_eq!(q.payment, 900);
        // The derived discount still reports 10: ceil(99 * 100 / 999).
        assert_eq!(q.discount_percent, 10);
    }

    #[test]
    fn derived_discount_follows_the_rounded_payment() {
        // 33% off 301 collects ceil(301 * 67 / 100) = 202; the 99 saved
        // derive back to ceil(99 * 100 / 301) = 33.
        let q = quote(301, &inputs(33, 0, 0, 0, false));
        assert_eq!(q.payment, 202);
        assert_eq!(q.discount_percent, 33);
    }

    #[test]
    fn free_tier_quotes_zero_without_discount() {
        let q = quote(0, &inputs(50, 5, 3, 25, true));
        assert_eq!(q.payment, 0);
        assert_eq!(q.discount_percent, 0);
    }

    #[test]
    fn referrals_scale_linearly() {
        let one = quote(1000, &inputs(0, 5, 1, 0, false));
        let four = quote(1000, &inputs(0, 5, 4, 0, false));
        assert_eq!(one.payment, 950);
        assert_eq!(four.payment, 800);
    }
}
