//! Identifier newtypes.
//!
//! Users and offers are keyed by integers (platform-assigned and
//! store-assigned respectively); tiers and promo codes are keyed by
//! operator-chosen strings. All four serialize transparently.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform-assigned numeric identifier of a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Store-assigned identifier of an offer.
///
/// Assigned monotonically: a later offer always carries a larger id, and
/// ids are never reused. Credential migration relies on this ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferId(pub i64);

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for OfferId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Operator-chosen identifier of a subscription tier (for example `"light"`
/// or `"free"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierId(pub String);

impl TierId {
    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TierId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for TierId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Operator-chosen identifier of a promo code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromoId(pub String);

impl PromoId {
    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PromoId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for PromoId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
