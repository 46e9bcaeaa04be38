//! Operator notifications
//!
//! [`Notifier`] wraps one [`Channel`] and never returns an error: delivery
//! failures are logged and reported through [`DeliveryStatus`] only.

pub mod channels;

use std::sync::Arc;

pub use channels::{Channel, ChannelError, DeliveryStatus, LogChannel};

use crate::config::NotifyConfig;
use channels::bot::BotChannel;

/// Fire-and-forget message sender
#[derive(Clone)]
pub struct Notifier {
    channel: Arc<dyn Channel>,
}

impl Notifier {
    pub fn new(channel: Arc<dyn Channel>) -> Self {
        Self { channel }
    }

    /// Pick a channel from configuration
    ///
    /// Falls back to [`LogChannel`] when the bot is not configured.
    pub fn from_config(config: &NotifyConfig) -> Self {
        match BotChannel::new(config) {
            Ok(bot) => Self::new(Arc::new(bot)),
            Err(e) => {
                tracing::warn!(error = %e, "Bot notifications disabled, logging only");
                Self::new(Arc::new(LogChannel))
            }
        }
    }

    pub fn channel_name(&self) -> &str {
        self.channel.name()
    }

    /// Send `text`, logging the outcome
    pub async fn notify(&self, text: &str) -> DeliveryStatus {
        let status = match self.channel.send(text).await {
            Ok(status) => status,
            Err(e) => DeliveryStatus::failure(self.channel.name(), e.to_string()),
        };

        if status.success {
            tracing::info!(channel = %status.channel, "Notification sent");
        } else {
            tracing::error!(
                channel = %status.channel,
                error = status.message.as_deref().unwrap_or("unknown"),
                "Notification failed"
            );
        }
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use channels::ChannelResult;

    struct BrokenChannel;

    #[async_trait]
    impl Channel for BrokenChannel {
        fn name(&self) -> &str {
            "broken"
        }

        async fn send(&self, _text: &str) -> ChannelResult<DeliveryStatus> {
            Err(ChannelError::InvalidConfig("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_channel_error_becomes_failure() {
        let notifier = Notifier::new(Arc::new(BrokenChannel));
        let status = notifier.notify("hello").await;
        assert!(!status.success);
        assert_eq!(status.channel, "broken");
    }

    #[test]
    fn test_from_config_without_token_logs_only() {
        let notifier = Notifier::from_config(&NotifyConfig::default());
        assert_eq!(notifier.channel_name(), "log");
    }
}
