//! In-memory backend for tests and local experiments.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use subgate_core::{Offer, OfferId, PromoCode, PromoId, Tier, TierId, User, UserId};

use crate::{NewOffer, Result, Store, StoreError};

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    tiers: BTreeMap<String, Tier>,
    promos: BTreeMap<String, PromoCode>,
    offers: BTreeMap<i64, Offer>,
    next_offer_id: i64,
}

/// [`Store`] kept entirely in process memory.
///
/// Behaves like the SQLite backend down to constraint messages, so the
/// service treats both interchangeably. Offer ids are monotonic and never
/// reused after deletion.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store with the default promo code seeded, matching
    /// the SQLite schema bootstrap.
    #[must_use]
    pub fn new() -> Self {
        let mut inner = Inner {
            next_offer_id: 1,
            ..Inner::default()
        };
        inner.promos.insert(
            PromoCode::DEFAULT.to_owned(),
            PromoCode {
                id: PromoId::from(PromoCode::DEFAULT),
                title: "Default".to_owned(),
                discount_percent: 0,
            },
        );
        Self {
            inner: Mutex::new(inner),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut inner = self.lock();
        if inner.users.contains_key(&user.id.0) {
            return Err(StoreError::Constraint(
                "UNIQUE constraint failed: users.id".to_owned(),
            ));
        }
        if inner
            .users
            .values()
            .any(|u| u.invite_code == user.invite_code)
        {
            return Err(StoreError::Constraint(
                "UNIQUE constraint failed: users.invite_code".to_owned(),
            ));
        }
        inner.users.insert(user.id.0, user.clone());
        Ok(())
    }

    async fn user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.lock().users.get(&id.0).cloned())
    }

    async fn user_by_invite_code(&self, code: &str) -> Result<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.invite_code == code)
            .cloned())
    }

    async fn count_users(&self) -> Result<i64> {
        Ok(i64::try_from(self.lock().users.len()).unwrap_or(i64::MAX))
    }

    async fn all_users(&self) -> Result<Vec<User>> {
        Ok(self.lock().users.values().cloned().collect())
    }

    async fn mark_trial_used(&self, id: UserId) -> Result<()> {
        if let Some(user) = self.lock().users.get_mut(&id.0) {
            user.free_trial_used = true;
        }
        Ok(())
    }

    async fn reset_invite_count(&self, id: UserId) -> Result<()> {
        if let Some(user) = self.lock().users.get_mut(&id.0) {
            user.invite_count = 0;
        }
        Ok(())
    }

    async fn increment_invite_count(&self, id: UserId) -> Result<()> {
        if let Some(user) = self.lock().users.get_mut(&id.0) {
            user.invite_count += 1;
        }
        Ok(())
    }

    async fn insert_tier(&self, tier: &Tier) -> Result<()> {
        let mut inner = self.lock();
        if inner.tiers.contains_key(tier.id.as_str()) {
            return Err(StoreError::Constraint(
                "UNIQUE constraint failed: tiers.id".to_owned(),
            ));
        }
        inner.tiers.insert(tier.id.as_str().to_owned(), tier.clone());
        Ok(())
    }

    async fn tier(&self, id: &TierId) -> Result<Option<Tier>> {
        Ok(self.lock().tiers.get(id.as_str()).cloned())
    }

    async fn insert_promo(&self, promo: &PromoCode) -> Result<()> {
        let mut inner = self.lock();
        if inner.promos.contains_key(promo.id.as_str()) {
            return Err(StoreError::Constraint(
                "UNIQUE constraint failed: promo_codes.id".to_owned(),
            ));
        }
        inner
            .promos
            .insert(promo.id.as_str().to_owned(), promo.clone());
        Ok(())
    }

    async fn promo(&self, id: &PromoId) -> Result<Option<PromoCode>> {
        Ok(self.lock().promos.get(id.as_str()).cloned())
    }

    async fn insert_offer(&self, offer: &NewOffer) -> Result<OfferId> {
        let mut inner = self.lock();
        if !inner.users.contains_key(&offer.user_id.0)
            || !inner.tiers.contains_key(offer.tier_id.as_str())
            || !inner.promos.contains_key(offer.promo_id.as_str())
        {
            return Err(StoreError::Constraint(
                "FOREIGN KEY constraint failed".to_owned(),
            ));
        }
        let id = inner.next_offer_id;
        inner.next_offer_id += 1;
        inner.offers.insert(
            id,
            Offer {
                id: OfferId(id),
                user_id: offer.user_id,
                tier_id: offer.tier_id.clone(),
                promo_id: offer.promo_id.clone(),
                payment: offer.payment,
                discount_percent: offer.discount_percent,
                created_at: offer.created_at,
                end_time: offer.end_time,
                conn_string: None,
            },
        );
        Ok(OfferId(id))
    }

    async fn offer(&self, id: OfferId) -> Result<Option<Offer>> {
        Ok(self.lock().offers.get(&id.0).cloned())
    }

    async fn latest_offer(&self, user: UserId) -> Result<Option<Offer>> {
        Ok(self
            .lock()
            .offers
            .values()
            .rev()
            .find(|o| o.user_id == user)
            .cloned())
    }

    async fn latest_live_offer(&self, user: UserId, now: i64) -> Result<Option<Offer>> {
        Ok(self
            .lock()
            .offers
            .values()
            .rev()
            .find(|o| o.user_id == user && o.is_confirmed() && o.end_time > now)
            .cloned())
    }

    async fn prior_confirmed_offer(&self, user: UserId, before: OfferId) -> Result<Option<Offer>> {
        Ok(self
            .lock()
            .offers
            .values()
            .rev()
            .find(|o| o.user_id == user && o.id < before && o.is_confirmed())
            .cloned())
    }

    async fn confirmed_paid_offer(
        &self,
        user: UserId,
        excluding: Option<OfferId>,
    ) -> Result<Option<Offer>> {
        Ok(self
            .lock()
            .offers
            .values()
            .find(|o| {
                o.user_id == user
                    && excluding != Some(o.id)
                    && o.is_confirmed()
                    && o.tier_id.as_str() != Tier::FREE
            })
            .cloned())
    }

    async fn confirmed_offers(&self) -> Result<Vec<Offer>> {
        Ok(self
            .lock()
            .offers
            .values()
            .filter(|o| o.is_confirmed())
            .cloned()
            .collect())
    }

    async fn live_offers(&self, now: i64) -> Result<Vec<Offer>> {
        Ok(self
            .lock()
            .offers
            .values()
            .filter(|o| o.is_confirmed() && o.end_time > now)
            .cloned()
            .collect())
    }

    async fn set_conn_string(&self, id: OfferId, conn: Option<&str>) -> Result<()> {
        if let Some(offer) = self.lock().offers.get_mut(&id.0) {
            offer.conn_string = conn.map(str::to_owned);
        }
        Ok(())
    }

    async fn delete_offer(&self, id: OfferId) -> Result<()> {
        self.lock().offers.remove(&id.0);
        Ok(())
    }
}
