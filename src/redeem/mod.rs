//! Coupon redemption: wire contract, client, and the self-hosted coupon book
//!
//! The client and the book share one JSON contract:
//!
//! ```text
//! POST /api/redeem
//! Authorization: Bearer <api key>
//! { "coupon": "K6GLNG7ABCDE", "product_id": "...", "plan_code": "..." }
//!
//! 200 { "code": 1022, "message": "Coupon applied successfully", "couponCode": "K6GLNG7ABCDE" }
//! 200 { "code": 1023, "message": "Maximum redemption limit reached for this coupon", ... }
//! 200 { "code": 1004, "message": "Invalid coupon code", ... }
//! 401 { "code": 401,  "message": "Unauthorized" }
//! ```

pub mod book;
pub mod client;

use serde::{Deserialize, Serialize};

pub use book::{BookStats, CouponBook};
pub use client::{RedeemOutcome, RedemptionClient};

/// Coupon accepted and applied
pub const CODE_APPLIED: u32 = 1022;

/// Coupon exists but has no redemptions left
pub const CODE_LIMIT_REACHED: u32 = 1023;

/// Coupon was never issued
pub const CODE_INVALID: u32 = 1004;

pub const MSG_APPLIED: &str = "Coupon applied successfully";
pub const MSG_LIMIT_REACHED: &str = "Maximum redemption limit reached for this coupon";
pub const MSG_INVALID: &str = "Invalid coupon code";

/// Redemption request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemRequest {
    pub coupon: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub plan_code: String,
}

/// Redemption response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemResponse {
    pub code: u32,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "couponCode", default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

impl RedeemResponse {
    pub fn new(code: u32, message: impl Into<String>, coupon: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            coupon_code: Some(coupon.into()),
        }
    }

    pub fn applied(coupon: impl Into<String>) -> Self {
        Self::new(CODE_APPLIED, MSG_APPLIED, coupon)
    }

    pub fn limit_reached(coupon: impl Into<String>) -> Self {
        Self::new(CODE_LIMIT_REACHED, MSG_LIMIT_REACHED, coupon)
    }

    pub fn invalid(coupon: impl Into<String>) -> Self {
        Self::new(CODE_INVALID, MSG_INVALID, coupon)
    }
}

/// Errors raised while talking to a redemption endpoint
#[derive(Debug, thiserror::Error)]
pub enum RedeemError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Server error: {0}")]
    ServerError(u16),

    #[error("Credentials rejected (HTTP {0})")]
    Unauthorized(u16),

    #[error("Unexpected status: {0}")]
    UnexpectedStatus(u16),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RedeemError {
    /// Whether the next attempt can be expected to behave differently
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Unauthorized(_) | Self::InvalidConfig(_))
    }
}
