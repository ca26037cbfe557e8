//! Record store for the subgate order engine.
//!
//! [`Store`] is the persistence contract for users, tiers, promo codes and
//! offers. Two backends implement it:
//!
//! - [`SqliteStore`] — the production backend, a single SQLite file
//! - [`MemoryStore`] — an in-memory backend for tests and local development
//!
//! Every trait method is one fixed, index-friendly query. Backends must
//! agree on ordering: offers sort by id, and id order is insertion order
//! (ids are never reused), which is what credential migration relies on.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
mod queries;
pub mod sqlite;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use subgate_core::{Offer, OfferId, PromoCode, PromoId, Tier, TierId, User, UserId};

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// A new offer awaiting insertion. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewOffer {
    /// The ordering user.
    pub user_id: UserId,
    /// Ordered tier.
    pub tier_id: TierId,
    /// Promo code applied at creation.
    pub promo_id: PromoId,
    /// Amount to collect, minor currency units.
    pub payment: i64,
    /// Effective discount percentage.
    pub discount_percent: i64,
    /// Creation time, UNIX seconds.
    pub created_at: i64,
    /// Entitlement end, UNIX seconds.
    pub end_time: i64,
}

/// Persistence contract for the order engine.
#[async_trait]
pub trait Store: Send + Sync {
    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Inserts a new user.
    ///
    /// Fails with [`StoreError::Constraint`] when the id or the invite code
    /// is already taken.
    async fn insert_user(&self, user: &User) -> Result<()>;

    /// Looks up a user by platform id.
    async fn user(&self, id: UserId) -> Result<Option<User>>;

    /// Looks up a user by their own invite code.
    async fn user_by_invite_code(&self, code: &str) -> Result<Option<User>>;

    /// Number of registered users.
    async fn count_users(&self) -> Result<i64>;

    /// All registered users, oldest id first.
    async fn all_users(&self) -> Result<Vec<User>>;

    /// Marks the user's free trial as used. A no-op for unknown users.
    async fn mark_trial_used(&self, id: UserId) -> Result<()>;

    /// Resets the user's rewarded-referral counter to zero.
    async fn reset_invite_count(&self, id: UserId) -> Result<()>;

    /// Increments the user's rewarded-referral counter by one.
    async fn increment_invite_count(&self, id: UserId) -> Result<()>;

    // ------------------------------------------------------------------
    // Tiers and promo codes
    // ------------------------------------------------------------------

    /// Inserts a tier.
    async fn insert_tier(&self, tier: &Tier) -> Result<()>;

    /// Looks up a tier.
    async fn tier(&self, id: &TierId) -> Result<Option<Tier>>;

    /// Inserts a promo code.
    async fn insert_promo(&self, promo: &PromoCode) -> Result<()>;

    /// Looks up a promo code.
    async fn promo(&self, id: &PromoId) -> Result<Option<PromoCode>>;

    // ------------------------------------------------------------------
    // Offers
    // ------------------------------------------------------------------

    /// Inserts a pending offer and returns the assigned id.
    async fn insert_offer(&self, offer: &NewOffer) -> Result<OfferId>;

    /// Looks up an offer by id.
    async fn offer(&self, id: OfferId) -> Result<Option<Offer>>;

    /// The user's most recent offer in any state.
    async fn latest_offer(&self, user: UserId) -> Result<Option<Offer>>;

    /// The user's most recent confirmed offer whose entitlement outlives
    /// `now`.
    async fn latest_live_offer(&self, user: UserId, now: i64) -> Result<Option<Offer>>;

    /// The user's most recent confirmed offer with an id strictly smaller
    /// than `before`.
    ///
    /// This is the migration query: the offer whose panel credential must
    /// be retired when `before` gets confirmed.
    async fn prior_confirmed_offer(&self, user: UserId, before: OfferId) -> Result<Option<Offer>>;

    /// Any confirmed offer of the user on a paid (non-free) tier, skipping
    /// `excluding` when given. Feeds first-order pricing and referral
    /// bookkeeping.
    async fn confirmed_paid_offer(
        &self,
        user: UserId,
        excluding: Option<OfferId>,
    ) -> Result<Option<Offer>>;

    /// All confirmed offers across users, oldest id first.
    async fn confirmed_offers(&self) -> Result<Vec<Offer>>;

    /// All confirmed offers whose entitlement outlives `now`, oldest id
    /// first.
    async fn live_offers(&self, now: i64) -> Result<Vec<Offer>>;

    /// Sets or clears an offer's connection string.
    async fn set_conn_string(&self, id: OfferId, conn: Option<&str>) -> Result<()>;

    /// Deletes an offer. A no-op for unknown ids.
    async fn delete_offer(&self, id: OfferId) -> Result<()>;
}
