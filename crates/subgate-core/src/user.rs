//! Registered users and invite-code generation.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Alphabet of generated invite codes.
const INVITE_CODE_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of generated invite codes.
const INVITE_CODE_LEN: usize = 4;

/// A registered user of the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Platform-assigned identifier.
    pub id: UserId,
    /// Platform handle, without the leading `@`.
    pub handle: String,
    /// Display name as reported by the platform.
    pub display_name: String,
    /// Registration time, UNIX seconds.
    pub registered_at: i64,
    /// The user's own referral code. Unique across users.
    pub invite_code: String,
    /// Referral code the user signed up with, if any. A weak reference:
    /// the issuing user may no longer exist.
    pub invited_with_code: Option<String>,
    /// Set once the user's free-trial offer has been confirmed.
    pub free_trial_used: bool,
    /// Rewarded referrals since the user's last confirmed order.
    pub invite_count: i64,
}

/// Generates a fresh invite code: [`INVITE_CODE_LEN`] characters drawn from
/// `[a-z0-9]`.
///
/// Uniqueness is the store's concern; callers retry on collision.
#[must_use]
pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..INVITE_CODE_CHARS.len());
            INVITE_CODE_CHARS[idx] as char
        })
        .collect()
}
