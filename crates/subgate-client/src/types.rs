//! Request and response types for the subgate client.

use serde::{Deserialize, Serialize};

/// Request body for registering a user.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterUserRequest {
    /// Platform-assigned user ID.
    pub id: i64,
    /// Platform handle, without the leading `@`.
    pub handle: String,
    /// Display name as reported by the platform.
    pub display_name: String,
    /// Invite code the user signed up with (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invited_with_code: Option<String>,
}

/// Request body for placing an order.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOfferRequest {
    /// The ordering user.
    pub user_id: i64,
    /// Tier to order.
    pub tier_id: String,
    /// Promo code to apply; the default promo is used when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_id: Option<String>,
}

/// Priced order summary returned by offer creation and confirmation.
///
/// Free-trial offers omit the price breakdown and carry only the (zero)
/// amount to pay.
#[derive(Debug, Clone, Deserialize)]
pub struct OfferDetail {
    /// Offer ID.
    pub offer_id: i64,
    /// Human-readable tier name.
    pub tier_title: String,
    /// Human-readable name of the applied promo.
    pub promo_title: String,
    /// Amount to collect, minor currency units.
    pub to_pay: i64,
    /// Tier base price. Absent for free-trial offers.
    #[serde(default)]
    pub price: Option<i64>,
    /// Effective discount percentage. Absent for free-trial offers.
    #[serde(default)]
    pub discount_percent: Option<i64>,
    /// Rewarded referrals counted into the price. Absent for free-trial
    /// offers.
    #[serde(default)]
    pub invite_count: Option<i64>,
    /// Connection string. Present once the offer is confirmed.
    #[serde(default)]
    pub conn_string: Option<String>,
}

/// Subscription status view for a user's latest offer.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StatusView {
    /// The latest offer is awaiting confirmation.
    Waiting {
        /// Offer ID.
        offer_id: i64,
        /// Human-readable tier name.
        tier_title: String,
        /// Tier traffic quota in gigabytes. Zero means unlimited.
        data_limit_gb: i64,
        /// Tier entitlement duration in seconds.
        duration_secs: i64,
    },
    /// The latest offer is confirmed; traffic figures come from the live
    /// panel credential.
    Active {
        /// Human-readable tier name.
        tier_title: String,
        /// Traffic consumed so far, bytes.
        used_bytes: i64,
        /// Provisioned quota, bytes. Zero means unlimited.
        quota_bytes: i64,
        /// Tier traffic quota in gigabytes. Zero means unlimited.
        data_limit_gb: i64,
        /// Offer creation time, UNIX seconds.
        created_at: i64,
        /// Credential expiry, UNIX seconds.
        expires_at: i64,
        /// The user's own invite code.
        invite_code: String,
        /// Rewarded referrals since the last confirmed order.
        invite_count: i64,
        /// Discount percentage the referrals would earn on the next order.
        next_pay_discount: i64,
        /// Amount collected for this offer, minor currency units.
        price: i64,
        /// Connection string of the live credential.
        conn_string: String,
        /// Whether the provisioned quota differs from the tier quota.
        quota_drift: bool,
        /// Whether the credential has expired or exhausted its traffic.
        is_expired: bool,
    },
}

/// Request body for bulk credential re-provisioning.
#[derive(Debug, Clone, Serialize)]
pub struct RecreateRequest {
    /// Users whose live credentials should be recreated.
    pub users: Vec<i64>,
    /// Whether to notify each affected user.
    pub notify: bool,
}

/// Response from bulk credential re-provisioning.
#[derive(Debug, Clone, Deserialize)]
pub struct RecreateResponse {
    /// Number of credentials recreated.
    pub recreated: u64,
}

/// Runtime shop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopSettings {
    /// Whether new orders are accepted.
    pub accept_new_offers: bool,
    /// Message returned when ordering is paused.
    pub new_offers_message: String,
    /// Whether free-trial offers are confirmed immediately on creation.
    pub auto_accept_free_trial: bool,
    /// Maximum number of registered users. Zero means unlimited.
    pub total_participants_limit: i64,
    /// Message returned when the participant limit is reached.
    pub limit_participants_message: String,
    /// Message sent to newly registered users.
    pub welcome_message: String,
    /// Discount percentage granted per rewarded referral.
    pub invite_discount: i64,
    /// One-time discount percentage for invited users on their first paid
    /// order.
    pub for_invited_discount: i64,
    /// Message broadcast periodically to all users. Skipped when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcast_message: Option<String>,
}

/// API error response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorBody,
}

/// API error body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
    /// Additional details.
    pub details: Option<serde_json::Value>,
}
