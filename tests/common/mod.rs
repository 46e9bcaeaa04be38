//! Common test utilities

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use coupon_audit::config::RedeemConfig;
use coupon_audit::generator::{Alphabet, CodeGenerator};
use coupon_audit::notifications::channels::ChannelResult;
use coupon_audit::notifications::{Channel, DeliveryStatus, Notifier};
use coupon_audit::redeem::RedemptionClient;
use coupon_audit::storage::AttemptJournal;
use coupon_audit::worker::{DelayPolicy, SweepWorker};

/// Channel that keeps every message it is asked to send
#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<String>>,
}

impl RecordingChannel {
    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, text: &str) -> ChannelResult<DeliveryStatus> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(DeliveryStatus::success("recording"))
    }
}

/// Worker wired to `redeem_url` with a recording notifier and no delay
#[allow(dead_code)]
pub fn test_worker(
    redeem_url: &str,
    journal: Arc<AttemptJournal>,
) -> (SweepWorker, Arc<RecordingChannel>) {
    let channel = Arc::new(RecordingChannel::default());
    let config = RedeemConfig {
        api_key: Some("test-key".to_string()),
        timeout_secs: 2,
        ..RedeemConfig::default()
    };
    let client = RedemptionClient::new(redeem_url, &config).unwrap();

    let worker = SweepWorker::new(
        Arc::new(CodeGenerator::new("K6GLNG7", Alphabet::Upper, 5)),
        Arc::new(client),
        Notifier::new(channel.clone()),
        journal,
    )
    .with_delay(DelayPolicy::Fixed { ms: 0 });

    (worker, channel)
}
