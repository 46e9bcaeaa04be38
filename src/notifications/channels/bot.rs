//! Messaging bot channel
//!
//! Posts `chat_id` and `text` as a form to `{api_base}/bot{token}/sendMessage`.
//! One attempt per message; a non-2xx status is reported as a failure.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::config::NotifyConfig;

/// Bot API channel
pub struct BotChannel {
    client: Client,
    endpoint: String,
    chat_id: String,
}

impl BotChannel {
    /// Create a bot channel
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::InvalidConfig` when the token or chat id is
    /// missing, or the API base is not an HTTP URL.
    pub fn new(config: &NotifyConfig) -> ChannelResult<Self> {
        let token = config
            .bot_token
            .as_deref()
            .ok_or_else(|| ChannelError::InvalidConfig("bot token is not set".to_string()))?;
        let chat_id = config
            .chat_id
            .clone()
            .ok_or_else(|| ChannelError::InvalidConfig("chat id is not set".to_string()))?;

        let base = config.api_base.trim_end_matches('/');
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(ChannelError::InvalidConfig(format!(
                "API base must start with http:// or https://: {base}"
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{base}/bot{token}/sendMessage"),
            chat_id,
        })
    }

    async fn post(&self, text: &str) -> ChannelResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("chat_id", self.chat_id.as_str()), ("text", text)])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        Err(ChannelError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Channel for BotChannel {
    fn name(&self) -> &str {
        "bot"
    }

    async fn send(&self, text: &str) -> ChannelResult<DeliveryStatus> {
        match self.post(text).await {
            Ok(()) => Ok(DeliveryStatus::success("bot")),
            Err(e) => Ok(DeliveryStatus::failure("bot", e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> NotifyConfig {
        NotifyConfig {
            bot_token: Some("123:abc".to_string()),
            chat_id: Some("42".to_string()),
            api_base: server.uri(),
            timeout_secs: 2,
            ..NotifyConfig::default()
        }
    }

    #[test]
    fn test_requires_token_and_chat() {
        let missing = NotifyConfig::default();
        assert!(matches!(
            BotChannel::new(&missing),
            Err(ChannelError::InvalidConfig(_))
        ));

        let no_chat = NotifyConfig {
            bot_token: Some("t".to_string()),
            ..NotifyConfig::default()
        };
        assert!(BotChannel::new(&no_chat).is_err());
    }

    #[tokio::test]
    async fn test_send_posts_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_string_contains("chat_id=42"))
            .and(body_string_contains("K6GLNG7ABCDE"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let channel = BotChannel::new(&config_for(&server)).unwrap();
        let status = channel.send("Coupon K6GLNG7ABCDE applied").await.unwrap();
        assert!(status.success);
    }

    #[tokio::test]
    async fn test_rejection_is_reported_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("chat not found"))
            .expect(1)
            .mount(&server)
            .await;

        let channel = BotChannel::new(&config_for(&server)).unwrap();
        let status = channel.send("hi").await.unwrap();
        assert!(!status.success);
        assert!(status.message.unwrap().contains("chat not found"));
    }
}
