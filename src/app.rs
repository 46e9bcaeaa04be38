//! Process lifecycle
//!
//! Wires the coupon book, status server and audit worker together:
//!
//! 1. issue the seed codes into the coupon book
//! 2. bind the status server (the coupon book lives on it)
//! 3. announce startup and spawn the worker, keeping its handle
//! 4. serve until the shutdown signal, then stop and join the worker

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::Result;
use crate::generator::CodeGenerator;
use crate::notifications::Notifier;
use crate::redeem::{CouponBook, RedemptionClient};
use crate::status::{AppState, StatusServer};
use crate::storage::AttemptJournal;
use crate::worker::{SweepWorker, WorkerStats, WorkerSummary};

pub struct App {
    config: Config,
    generator: Arc<CodeGenerator>,
    book: Arc<CouponBook>,
    journal: Arc<AttemptJournal>,
    stats: Arc<WorkerStats>,
    notifier: Notifier,
}

impl App {
    /// Validate `config` and build the shared components
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let generator = Arc::new(config.generator.build());
        let book = Arc::new(CouponBook::new(
            config.redeem.max_redemptions,
            config.redeem.api_key.clone(),
        ));
        let journal = Arc::new(AttemptJournal::new(config.logging.journal_path.clone()));
        let notifier = Notifier::from_config(&config.notify);

        Ok(Self {
            config,
            generator,
            book,
            journal,
            stats: Arc::new(WorkerStats::default()),
            notifier,
        })
    }

    /// Replace the configured notifier
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn book(&self) -> Arc<CouponBook> {
        self.book.clone()
    }

    pub fn journal(&self) -> Arc<AttemptJournal> {
        self.journal.clone()
    }

    pub fn stats(&self) -> Arc<WorkerStats> {
        self.stats.clone()
    }

    /// Issue the configured number of seed codes
    ///
    /// Seed codes use a separate, unseeded generator of the same shape so
    /// that a seeded worker does not replay the issuing sequence.
    pub async fn seed_book(&self) -> Vec<String> {
        let shape = CodeGenerator::new(
            self.generator.prefix(),
            self.generator.alphabet(),
            self.generator.suffix_len(),
        );
        self.book.issue_random(&shape, self.config.redeem.seed_codes).await
    }

    pub fn state(&self) -> AppState {
        AppState {
            book: self.book.clone(),
            journal: self.journal.clone(),
            stats: self.stats.clone(),
            notifier: self.notifier.clone(),
            owner_id: self.config.notify.owner_id.clone(),
            start_time: Instant::now(),
        }
    }

    /// Build a worker aimed at `redeem_url`
    pub fn worker(&self, redeem_url: impl Into<String>) -> Result<SweepWorker> {
        let client = RedemptionClient::new(redeem_url, &self.config.redeem)?;

        Ok(SweepWorker::new(
            self.generator.clone(),
            Arc::new(client),
            self.notifier.clone(),
            self.journal.clone(),
        )
        .with_delay(self.config.worker.delay)
        .with_max_attempts(self.config.worker.max_attempts)
        .with_stats(self.stats.clone()))
    }

    /// Run until `shutdown_signal` resolves
    pub async fn run(
        self,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> Result<Option<WorkerSummary>> {
        let issued = self.seed_book().await;
        tracing::info!(issued = issued.len(), "Coupon book ready");

        let server = StatusServer::new(self.config.server.clone(), self.state());
        let listener = server.bind().await?;
        let local_addr = listener.local_addr()?;
        let redeem_url = self.config.redeem.resolved_url(local_addr);

        let worker = self.worker(redeem_url)?;
        self.notifier
            .notify("Coupon audit started and running in background...")
            .await;
        let handle = worker.spawn();

        let served = server.serve_with_shutdown(listener, shutdown_signal).await;

        let summary = handle.shutdown().await;
        served?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Alphabet;

    fn config() -> Config {
        let dir = std::env::temp_dir().join(format!("coupon-audit-{}", uuid::Uuid::new_v4()));
        let mut config = Config::default();
        config.generator.prefix = "T".to_string();
        config.generator.alphabet = Alphabet::Upper;
        config.generator.suffix_len = 2;
        config.redeem.seed_codes = 5;
        config.logging.journal_path = dir.join("attempts.log");
        config
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = config();
        config.redeem.timeout_secs = 0;
        assert!(App::new(config).is_err());
    }

    #[tokio::test]
    async fn test_seed_book_issues_configured_count() {
        let app = App::new(config()).unwrap();
        let codes = app.seed_book().await;

        assert_eq!(codes.len(), 5);
        assert_eq!(app.book().stats().await.issued, 5);
        assert!(codes.iter().all(|c| c.starts_with('T') && c.len() == 3));
    }

    #[tokio::test]
    async fn test_run_stops_on_signal() {
        let mut config = config();
        config.server.bind_address = "127.0.0.1:0".parse().unwrap();
        config.server.enable_request_logging = false;

        let app = App::new(config).unwrap();
        let summary = app.run(async {}).await.unwrap();
        assert!(summary.is_some());
    }
}
