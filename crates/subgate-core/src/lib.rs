//! Core domain types for the subgate order engine.
//!
//! This crate holds the vocabulary shared by every subgate crate:
//!
//! - Identifier newtypes for users, offers, tiers and promo codes
//! - The [`User`], [`Tier`], [`PromoCode`] and [`Offer`] records
//! - The pure pricing engine ([`pricing::quote`])
//!
//! Everything here is plain data plus pure functions; persistence and I/O
//! live in the `subgate-store`, `subgate-panel` and `subgate-service`
//! crates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;
pub mod offer;
pub mod pricing;
pub mod promo;
pub mod tier;
pub mod user;

pub use ids::{OfferId, PromoId, TierId, UserId};
pub use offer::{Offer, OfferStatus};
pub use pricing::{quote, DiscountInputs, Quote};
pub use promo::PromoCode;
pub use tier::Tier;
pub use user::{generate_invite_code, User};

/// Current UNIX time in whole seconds.
#[must_use]
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
