//! SQLite backend.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use subgate_core::{Offer, OfferId, PromoCode, PromoId, Tier, TierId, User, UserId};

use crate::{queries, NewOffer, Result, Store, StoreError};

/// Schema applied idempotently at connect time.
const SCHEMA: &str = include_str!("schema.sql");

/// SQLite-backed [`Store`].
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens the database at `url` (for example `sqlite:///var/lib/subgate.db`),
    /// creating the file if missing, and applies the schema.
    ///
    /// # Errors
    ///
    /// Returns an error when the database cannot be opened or the schema
    /// fails to apply.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        tracing::info!(url, "record store ready");
        Ok(Self { pool })
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: UserId(row.try_get("id")?),
        handle: row.try_get("handle")?,
        display_name: row.try_get("display_name")?,
        registered_at: row.try_get("registered_at")?,
        invite_code: row.try_get("invite_code")?,
        invited_with_code: row.try_get("invited_with_code")?,
        free_trial_used: row.try_get("free_trial_used")?,
        invite_count: row.try_get("invite_count")?,
    })
}

fn tier_from_row(row: &SqliteRow) -> Result<Tier> {
    Ok(Tier {
        id: TierId(row.try_get("id")?),
        title: row.try_get("title")?,
        data_limit_gb: row.try_get("data_limit_gb")?,
        duration_secs: row.try_get("duration_secs")?,
        price: row.try_get("price")?,
        promo_eligible: row.try_get("promo_eligible")?,
    })
}

fn promo_from_row(row: &SqliteRow) -> Result<PromoCode> {
    Ok(PromoCode {
        id: PromoId(row.try_get("id")?),
        title: row.try_get("title")?,
        discount_percent: row.try_get("discount_percent")?,
    })
}

fn offer_from_row(row: &SqliteRow) -> Result<Offer> {
    Ok(Offer {
        id: OfferId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        tier_id: TierId(row.try_get("tier_id")?),
        promo_id: PromoId(row.try_get("promo_id")?),
        payment: row.try_get("payment")?,
        discount_percent: row.try_get("discount_percent")?,
        created_at: row.try_get("created_at")?,
        end_time: row.try_get("end_time")?,
        conn_string: row.try_get("conn_string")?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(queries::INSERT_USER)
            .bind(user.id.0)
            .bind(&user.handle)
            .bind(&user.display_name)
            .bind(user.registered_at)
            .bind(&user.invite_code)
            .bind(user.invited_with_code.as_deref())
            .bind(user.free_trial_used)
            .bind(user.invite_count)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(queries::SELECT_USER)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_by_invite_code(&self, code: &str) -> Result<Option<User>> {
        let row = sqlx::query(queries::SELECT_USER_BY_INVITE_CODE)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn count_users(&self) -> Result<i64> {
        let row = sqlx::query(queries::COUNT_USERS)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get(0)?)
    }

    async fn all_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(queries::SELECT_ALL_USERS)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn mark_trial_used(&self, id: UserId) -> Result<()> {
        sqlx::query(queries::MARK_TRIAL_USED)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn reset_invite_count(&self, id: UserId) -> Result<()> {
        sqlx::query(queries::RESET_INVITE_COUNT)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_invite_count(&self, id: UserId) -> Result<()> {
        sqlx::query(queries::INCREMENT_INVITE_COUNT)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_tier(&self, tier: &Tier) -> Result<()> {
        sqlx::query(queries::INSERT_TIER)
            .bind(tier.id.as_str())
            .bind(&tier.title)
            .bind(tier.data_limit_gb)
            .bind(tier.duration_secs)
            .bind(tier.price)
            .bind(tier.promo_eligible)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn tier(&self, id: &TierId) -> Result<Option<Tier>> {
        let row = sqlx::query(queries::SELECT_TIER)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(tier_from_row).transpose()
    }

    async fn insert_promo(&self, promo: &PromoCode) -> Result<()> {
        sqlx::query(queries::INSERT_PROMO)
            .bind(promo.id.as_str())
            .bind(&promo.title)
            .bind(promo.discount_percent)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn promo(&self, id: &PromoId) -> Result<Option<PromoCode>> {
        let row = sqlx::query(queries::SELECT_PROMO)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(promo_from_row).transpose()
    }

    async fn insert_offer(&self, offer: &NewOffer) -> Result<OfferId> {
        let result = sqlx::query(queries::INSERT_OFFER)
            .bind(offer.user_id.0)
            .bind(offer.tier_id.as_str())
            .bind(offer.promo_id.as_str())
            .bind(offer.payment)
            .bind(offer.discount_percent)
            .bind(offer.created_at)
            .bind(offer.end_time)
            .execute(&self.pool)
            .await?;
        Ok(OfferId(result.last_insert_rowid()))
    }

    async fn offer(&self, id: OfferId) -> Result<Option<Offer>> {
        let row = sqlx::query(queries::SELECT_OFFER)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(offer_from_row).transpose()
    }

    async fn latest_offer(&self, user: UserId) -> Result<Option<Offer>> {
        let row = sqlx::query(queries::SELECT_LATEST_OFFER)
            .bind(user.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(offer_from_row).transpose()
    }

    async fn latest_live_offer(&self, user: UserId, now: i64) -> Result<Option<Offer>> {
        let row = sqlx::query(queries::SELECT_LATEST_LIVE_OFFER)
            .bind(user.0)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(offer_from_row).transpose()
    }

    async fn prior_confirmed_offer(&self, user: UserId, before: OfferId) -> Result<Option<Offer>> {
        let row = sqlx::query(queries::SELECT_PRIOR_CONFIRMED_OFFER)
            .bind(user.0)
            .bind(before.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(offer_from_row).transpose()
    }

    async fn confirmed_paid_offer(
        &self,
        user: UserId,
        excluding: Option<OfferId>,
    ) -> Result<Option<Offer>> {
        // Offer ids start at 1, so 0 excludes nothing.
        let row = sqlx::query(queries::SELECT_CONFIRMED_PAID_OFFER)
            .bind(user.0)
            .bind(excluding.map_or(0, |id| id.0))
            .bind(Tier::FREE)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(offer_from_row).transpose()
    }

    async fn confirmed_offers(&self) -> Result<Vec<Offer>> {
        let rows = sqlx::query(queries::SELECT_CONFIRMED_OFFERS)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(offer_from_row).collect()
    }

    async fn live_offers(&self, now: i64) -> Result<Vec<Offer>> {
        let rows = sqlx::query(queries::SELECT_LIVE_OFFERS)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(offer_from_row).collect()
    }

    async fn set_conn_string(&self, id: OfferId, conn: Option<&str>) -> Result<()> {
        sqlx::query(queries::SET_CONN_STRING)
            .bind(conn)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_offer(&self, id: OfferId) -> Result<()> {
        sqlx::query(queries::DELETE_OFFER)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("temp dir");
        let url = format!("sqlite://{}", dir.path().join("subgate.db").display());
        let store = SqliteStore::connect(&url).await.expect("connect");
        (store, dir)
    }

    fn user(id: i64, code: &str) -> User {
        User {
            id: UserId(id),
            handle: format!("user{id}"),
            display_name: format!("User {id}"),
            registered_at: 1_700_000_000,
            invite_code: code.to_owned(),
            invited_with_code: None,
            free_trial_used: false,
            invite_count: 0,
        }
    }

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

    fn new_offer(user: i64, tier: &str) -> NewOffer {
        NewOffer {
            user_id: UserId(user),
            tier_id: TierId::from(tier),
            promo_id: PromoId::from(PromoCode::DEFAULT),
            payment: 800,
            discount_percent: 20,
            created_at: 1_700_000_000,
            end_time: 1_702_592_000,
        }
    }

    async fn seed(store: &SqliteStore) {
        store.insert_user(&user(1, "aaaa")).await.unwrap();
        store.insert_tier(&tier("light", 1000)).await.unwrap();
        store.insert_tier(&tier(Tier::FREE, 0)).await.unwrap();
    }

    #[tokio::test]
    async fn schema_applies_and_seeds_default_promo() {
        let (store, _dir) = temp_store().await;
        let promo = store
            .promo(&PromoId::from(PromoCode::DEFAULT))
            .await
            .unwrap()
            .expect("default promo seeded");
        assert_eq!(promo.discount_percent, 0);
    }

    #[tokio::test]
    async fn connect_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("subgate.db").display());
        SqliteStore::connect(&url).await.unwrap();
        let store = SqliteStore::connect(&url).await.unwrap();
        assert_eq!(store.count_users().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn users_round_trip() {
        let (store, _dir) = temp_store().await;
        let mut u = user(1, "ab12");
        u.invited_with_code = Some("zz99".to_owned());
        store.insert_user(&u).await.unwrap();

        let found = store.user(UserId(1)).await.unwrap().unwrap();
        assert_eq!(found, u);
        let by_code = store.user_by_invite_code("ab12").await.unwrap().unwrap();
        assert_eq!(by_code.id, UserId(1));
        assert!(store.user(UserId(2)).await.unwrap().is_none());
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_user_id_is_a_constraint() {
        let (store, _dir) = temp_store().await;
        store.insert_user(&user(1, "aaaa")).await.unwrap();
        let err = store.insert_user(&user(1, "bbbb")).await.unwrap_err();
        match err {
            StoreError::Constraint(detail) => assert!(detail.contains("users.id"), "{detail}"),
            other => panic!("expected constraint, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_invite_code_is_a_constraint() {
        let (store, _dir) = temp_store().await;
        store.insert_user(&user(1, "aaaa")).await.unwrap();
        let err = store.insert_user(&user(2, "aaaa")).await.unwrap_err();
        match err {
            StoreError::Constraint(detail) => {
                assert!(detail.contains("invite_code"), "{detail}");
            }
            other => panic!("expected constraint, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn user_counters_update() {
        let (store, _dir) = temp_store().await;
        store.insert_user(&user(1, "aaaa")).await.unwrap();

        store.mark_trial_used(UserId(1)).await.unwrap();
        store.increment_invite_count(UserId(1)).await.unwrap();
        store.increment_invite_count(UserId(1)).await.unwrap();
        let u = store.user(UserId(1)).await.unwrap().unwrap();
        assert!(u.free_trial_used);
        assert_eq!(u.invite_count, 2);

        store.reset_invite_count(UserId(1)).await.unwrap();
        let u = store.user(UserId(1)).await.unwrap().unwrap();
        assert_eq!(u.invite_count, 0);
    }

    #[tokio::test]
    async fn offer_ids_increase_and_survive_deletion() {
        let (store, _dir) = temp_store().await;
        seed(&store).await;

        let first = store.insert_offer(&new_offer(1, "light")).await.unwrap();
        let second = store.insert_offer(&new_offer(1, "light")).await.unwrap();
        assert!(second > first);

        // Deleting the newest offer must not let its id be reused.
        store.delete_offer(second).await.unwrap();
        let third = store.insert_offer(&new_offer(1, "light")).await.unwrap();
        assert!(third > second);
    }

    #[tokio::test]
    async fn offer_with_unknown_tier_is_a_constraint() {
        let (store, _dir) = temp_store().await;
        store.insert_user(&user(1, "aaaa")).await.unwrap();
        let err = store.insert_offer(&new_offer(1, "light")).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[tokio::test]
    async fn latest_offer_picks_the_newest() {
        let (store, _dir) = temp_store().await;
        seed(&store).await;

        store.insert_offer(&new_offer(1, "light")).await.unwrap();
        let newest = store.insert_offer(&new_offer(1, Tier::FREE)).await.unwrap();

        let latest = store.latest_offer(UserId(1)).await.unwrap().unwrap();
        assert_eq!(latest.id, newest);
        assert!(store.latest_offer(UserId(9)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn prior_confirmed_offer_picks_newest_older_confirmed() {
        let (store, _dir) = temp_store().await;
        seed(&store).await;

        let a = store.insert_offer(&new_offer(1, "light")).await.unwrap();
        let b = store.insert_offer(&new_offer(1, "light")).await.unwrap();
        let c = store.insert_offer(&new_offer(1, "light")).await.unwrap();
        store.set_conn_string(a, Some("vless://a")).await.unwrap();
        store.set_conn_string(b, Some("vless://b")).await.unwrap();

        let prior = store
            .prior_confirmed_offer(UserId(1), c)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(prior.id, b);

        // Nothing confirmed before the oldest offer.
        assert!(store
            .prior_confirmed_offer(UserId(1), a)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn confirmed_paid_offer_ignores_free_tier_and_excluded_id() {
        let (store, _dir) = temp_store().await;
        seed(&store).await;

        let trial = store.insert_offer(&new_offer(1, Tier::FREE)).await.unwrap();
        store.set_conn_string(trial, Some("vless://t")).await.unwrap();
        assert!(store
            .confirmed_paid_offer(UserId(1), None)
            .await
            .unwrap()
            .is_none());

        let paid = store.insert_offer(&new_offer(1, "light")).await.unwrap();
        store.set_conn_string(paid, Some("vless://p")).await.unwrap();
        assert!(store
            .confirmed_paid_offer(UserId(1), None)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .confirmed_paid_offer(UserId(1), Some(paid))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn live_offers_filter_by_entitlement_end() {
        let (store, _dir) = temp_store().await;
        seed(&store).await;

        let live = store.insert_offer(&new_offer(1, "light")).await.unwrap();
        let mut expired = new_offer(1, "light");
        expired.end_time = 100;
        let expired = store.insert_offer(&expired).await.unwrap();
        let pending = store.insert_offer(&new_offer(1, "light")).await.unwrap();
        store.set_conn_string(live, Some("vless://a")).await.unwrap();
        store.set_conn_string(expired, Some("vless://b")).await.unwrap();

        let all = store.confirmed_offers().await.unwrap();
        assert_eq!(all.len(), 2);

        let now = 1_700_000_000;
        let live_now = store.live_offers(now).await.unwrap();
        assert_eq!(live_now.len(), 1);
        assert_eq!(live_now[0].id, live);

        let latest_live = store
            .latest_live_offer(UserId(1), now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest_live.id, live);
        let _ = pending;
    }

    #[tokio::test]
    async fn conn_string_sets_and_clears() {
        let (store, _dir) = temp_store().await;
        seed(&store).await;

        let id = store.insert_offer(&new_offer(1, "light")).await.unwrap();
        store.set_conn_string(id, Some("vless://x")).await.unwrap();
        let offer = store.offer(id).await.unwrap().unwrap();
        assert!(offer.is_confirmed());

        store.set_conn_string(id, None).await.unwrap();
        let offer = store.offer(id).await.unwrap().unwrap();
        assert!(!offer.is_confirmed());
    }
}
