//! HTTP client for the redemption endpoint
//!
//! One POST per candidate, fixed timeout, no retries. The client only sorts
//! transport-level results into [`RedeemOutcome`]; deciding whether a parsed
//! response counts as a hit is the worker's job.

use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use std::time::Duration;

use super::{RedeemError, RedeemRequest, RedeemResponse};
use crate::config::RedeemConfig;

/// Result of a single redemption call
#[derive(Debug)]
pub enum RedeemOutcome {
    /// The endpoint answered with a well-formed body
    Response(RedeemResponse),
    /// Network, timeout, decode, or 5xx failure; the next call may succeed
    Recoverable(RedeemError),
    /// Every following call would fail the same way
    Fatal(RedeemError),
}

impl RedeemOutcome {
    pub fn response(&self) -> Option<&RedeemResponse> {
        match self {
            Self::Response(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    fn from_error(err: RedeemError) -> Self {
        if err.is_recoverable() {
            Self::Recoverable(err)
        } else {
            Self::Fatal(err)
        }
    }
}

/// Client for the coupon book's `/api/redeem` route
pub struct RedemptionClient {
    client: Client,
    url: String,
    api_key: Option<String>,
    product_id: String,
    plan_code: String,
}

impl RedemptionClient {
    /// Create a client for `url` using the remaining settings in `config`
    ///
    /// # Errors
    ///
    /// Returns `RedeemError::InvalidConfig` for a non-HTTP URL and
    /// `RedeemError::Http` if the underlying client cannot be built.
    pub fn new(url: impl Into<String>, config: &RedeemConfig) -> Result<Self, RedeemError> {
        let url = url.into();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(RedeemError::InvalidConfig(format!(
                "Redeem URL must start with http:// or https://: {url}"
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url,
            api_key: config.api_key.clone(),
            product_id: config.product_id.clone(),
            plan_code: config.plan_code.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Submit one candidate code
    pub async fn redeem(&self, coupon: &str) -> RedeemOutcome {
        tracing::debug!(coupon = %coupon, url = %self.url, "Sending redemption request");

        match self.send(coupon).await {
            Ok(response) => {
                tracing::debug!(
                    coupon = %coupon,
                    code = response.code,
                    message = %response.message,
                    "Redemption response"
                );
                RedeemOutcome::Response(response)
            }
            Err(e) => {
                tracing::warn!(coupon = %coupon, error = %e, "Redemption request failed");
                RedeemOutcome::from_error(e)
            }
        }
    }

    async fn send(&self, coupon: &str) -> Result<RedeemResponse, RedeemError> {
        let body = RedeemRequest {
            coupon: coupon.to_string(),
            product_id: self.product_id.clone(),
            plan_code: self.plan_code.clone(),
        };

        let mut request = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json;charset=UTF-8")
            .json(&body);

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RedeemError::Unauthorized(status.as_u16()));
        }
        if status.is_server_error() {
            return Err(RedeemError::ServerError(status.as_u16()));
        }

        let text = response.text().await?;
        match serde_json::from_str::<RedeemResponse>(&text) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(RedeemError::UnexpectedStatus(status.as_u16())),
            Err(e) => Err(RedeemError::Decode(e.to_string())),
        }
    }
}
