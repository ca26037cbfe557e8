//! SQL statements for the SQLite backend.
//!
//! Statements are fixed strings with positional binds. Offer listings that
//! feed migration or status decisions order by id, so "latest" and "prior"
//! mean insertion order rather than wall-clock order.

// ============================================================================
// Users
// ============================================================================

pub const INSERT_USER: &str = "INSERT INTO users (id, handle, display_name, registered_at, invite_code, \
     invited_with_code, free_trial_used, invite_count) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?)";

pub const SELECT_USER: &str = "SELECT id, handle, display_name, registered_at, invite_code, \
     invited_with_code, free_trial_used, invite_count \
     FROM users WHERE id = ?";

pub const SELECT_USER_BY_INVITE_CODE: &str = "SELECT id, handle, display_name, registered_at, invite_code, \
     invited_with_code, free_trial_used, invite_count \
     FROM users WHERE invite_code = ?";

pub const SELECT_ALL_USERS: &str = "SELECT id, handle, display_name, registered_at, invite_code, \
     invited_with_code, free_trial_used, invite_count \
     FROM users ORDER BY id ASC";

pub const COUNT_USERS: &str = "SELECT COUNT(*) FROM users";

pub const MARK_TRIAL_USED: &str = "UPDATE users SET free_trial_used = 1 WHERE id = ?";

pub const RESET_INVITE_COUNT: &str = "UPDATE users SET invite_count = 0 WHERE id = ?";

pub const INCREMENT_INVITE_COUNT: &str =
    "UPDATE users SET invite_count = invite_count + 1 WHERE id = ?";

// ============================================================================
// Tiers and promo codes
// ============================================================================

pub const INSERT_TIER: &str = "INSERT INTO tiers (id, title, data_limit_gb, duration_secs, price, promo_eligible) \
     VALUES (?, ?, ?, ?, ?, ?)";

pub const SELECT_TIER: &str = "SELECT id, title, data_limit_gb, duration_secs, price, promo_eligible \
     FROM tiers WHERE id = ?";

pub const INSERT_PROMO: &str =
    "INSERT INTO promo_codes (id, title, discount_percent) VALUES (?, ?, ?)";

pub const SELECT_PROMO: &str =
    "SELECT id, title, discount_percent FROM promo_codes WHERE id = ?";

// ============================================================================
// Offers
// ============================================================================

pub const INSERT_OFFER: &str = "INSERT INTO offers (user_id, tier_id, promo_id, payment, discount_percent, \
     created_at, end_time, conn_string) \
     VALUES (?, ?, ?, ?, ?, ?, ?, NULL)";

pub const SELECT_OFFER: &str = "SELECT id, user_id, tier_id, promo_id, payment, discount_percent, \
     created_at, end_time, conn_string \
     FROM offers WHERE id = ?";

pub const SELECT_LATEST_OFFER: &str = "SELECT id, user_id, tier_id, promo_id, payment, discount_percent, \
     created_at, end_time, conn_string \
     FROM offers WHERE user_id = ? ORDER BY id DESC LIMIT 1";

pub const SELECT_LATEST_LIVE_OFFER: &str = "SELECT id, user_id, tier_id, promo_id, payment, discount_percent, \
     created_at, end_time, conn_string \
     FROM offers WHERE user_id = ? AND conn_string IS NOT NULL AND end_time > ? \
     ORDER BY id DESC LIMIT 1";

pub const SELECT_PRIOR_CONFIRMED_OFFER: &str = "SELECT id, user_id, tier_id, promo_id, payment, discount_percent, \
     created_at, end_time, conn_string \
     FROM offers WHERE user_id = ? AND id < ? AND conn_string IS NOT NULL \
     ORDER BY id DESC LIMIT 1";

pub const SELECT_CONFIRMED_PAID_OFFER: &str = "SELECT id, user_id, tier_id, promo_id, payment, discount_percent, \
     created_at, end_time, conn_string \
     FROM offers WHERE user_id = ? AND id <> ? AND conn_string IS NOT NULL AND tier_id <> ? \
     LIMIT 1";

pub const SELECT_CONFIRMED_OFFERS: &str = "SELECT id, user_id, tier_id, promo_id, payment, discount_percent, \
     created_at, end_time, conn_string \
     FROM offers WHERE conn_string IS NOT NULL ORDER BY id ASC";

pub const SELECT_LIVE_OFFERS: &str = "SELECT id, user_id, tier_id, promo_id, payment, discount_percent, \
     created_at, end_time, conn_string \
     FROM offers WHERE conn_string IS NOT NULL AND end_time > ? \
     ORDER BY id ASC";

pub const SET_CONN_STRING: &str = "UPDATE offers SET conn_string = ? WHERE id = ?";

pub const DELETE_OFFER: &str = "DELETE FROM offers WHERE id = ?";
