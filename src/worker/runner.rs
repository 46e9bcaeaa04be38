use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

use super::{DelayPolicy, Verdict};
use crate::generator::CodeGenerator;
use crate::notifications::Notifier;
use crate::redeem::{RedeemOutcome, RedemptionClient};
use crate::storage::{AttemptJournal, AttemptRecord};

// ============================================================================
// Shared Stats
// ============================================================================

/// Counters shared between the worker and the status server
#[derive(Debug, Default)]
pub struct WorkerStats {
    running: AtomicBool,
    attempts: AtomicU64,
    hits: AtomicU64,
    errors: AtomicU64,
    last_code: RwLock<Option<String>>,
}

/// Point-in-time copy of [`WorkerStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub running: bool,
    pub attempts: u64,
    pub hits: u64,
    pub errors: u64,
    pub last_code: Option<String>,
}

impl WorkerStats {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            running: self.is_running(),
            attempts: self.attempts(),
            hits: self.hits.load(Ordering::SeqCst),
            errors: self.errors.load(Ordering::SeqCst),
            last_code: self.last_code.read().await.clone(),
        }
    }
}

// ============================================================================
// Worker
// ============================================================================

/// Why the loop ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum StopReason {
    Shutdown,
    MaxAttempts,
    Fatal(String),
}

/// Totals reported when the loop ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerSummary {
    pub attempts: u64,
    pub hits: u64,
    pub errors: u64,
    pub stopped: StopReason,
}

/// Result of one iteration
#[derive(Debug)]
pub struct Attempt {
    pub record: AttemptRecord,
    pub verdict: Verdict,
    pub fatal: Option<String>,
}

/// Generate → redeem → classify → notify → journal
pub struct SweepWorker {
    generator: Arc<CodeGenerator>,
    client: Arc<RedemptionClient>,
    notifier: Notifier,
    journal: Arc<AttemptJournal>,
    delay: DelayPolicy,
    max_attempts: Option<u64>,
    stats: Arc<WorkerStats>,
}

impl SweepWorker {
    pub fn new(
        generator: Arc<CodeGenerator>,
        client: Arc<RedemptionClient>,
        notifier: Notifier,
        journal: Arc<AttemptJournal>,
    ) -> Self {
        Self {
            generator,
            client,
            notifier,
            journal,
            delay: DelayPolicy::default(),
            max_attempts: None,
            stats: Arc::new(WorkerStats::default()),
        }
    }

    pub fn with_delay(mut self, delay: DelayPolicy) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_max_attempts(mut self, max: Option<u64>) -> Self {
        self.max_attempts = max;
        self
    }

    pub fn with_stats(mut self, stats: Arc<WorkerStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> Arc<WorkerStats> {
        self.stats.clone()
    }

    /// Run a single iteration without sleeping
    pub async fn run_once(&self) -> Attempt {
        let code = self.generator.generate();
        tracing::info!(coupon = %code, "Generated candidate");

        let outcome = self.client.redeem(&code).await;
        let verdict = Verdict::classify(&outcome);

        let (message, fatal) = match &outcome {
            RedeemOutcome::Response(r) => (r.message.clone(), None),
            RedeemOutcome::Recoverable(e) => (e.to_string(), None),
            RedeemOutcome::Fatal(e) => (e.to_string(), Some(e.to_string())),
        };

        self.stats.attempts.fetch_add(1, Ordering::SeqCst);
        *self.stats.last_code.write().await = Some(code.clone());
        if verdict == Verdict::Failed {
            self.stats.errors.fetch_add(1, Ordering::SeqCst);
        }

        if verdict.is_hit() {
            self.stats.hits.fetch_add(1, Ordering::SeqCst);
            let reported = outcome
                .response()
                .and_then(|r| r.coupon_code.clone())
                .unwrap_or_else(|| code.clone());
            let status_code = outcome.response().map(|r| r.code).unwrap_or_default();

            tracing::info!(coupon = %code, verdict = %verdict, "Hit, notifying operator");
            self.notifier
                .notify(&hit_text(verdict, status_code, &reported, &message))
                .await;
        } else {
            tracing::info!(coupon = %code, verdict = %verdict, "No hit");
        }

        let record = AttemptRecord::new(code, verdict.is_hit(), message);
        if let Err(e) = self.journal.append(&record).await {
            tracing::error!(error = %e, "Failed to append attempt to journal");
        }

        Attempt {
            record,
            verdict,
            fatal,
        }
    }

    /// Loop until `shutdown` flips to true (or its sender is dropped)
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> WorkerSummary {
        tracing::info!(
            target_url = %self.client.url(),
            prefix = %self.generator.prefix(),
            keyspace = %self.generator.keyspace(),
            "Audit worker started"
        );
        self.stats.running.store(true, Ordering::SeqCst);

        let stopped = loop {
            let stop_requested = *shutdown.borrow();
            if stop_requested {
                break StopReason::Shutdown;
            }
            if self
                .max_attempts
                .is_some_and(|max| self.stats.attempts() >= max)
            {
                break StopReason::MaxAttempts;
            }

            let attempt = self.run_once().await;
            if let Some(reason) = attempt.fatal {
                tracing::error!(error = %reason, "Fatal redemption error, stopping worker");
                self.notifier
                    .notify(&format!("Coupon audit stopped: {reason}"))
                    .await;
                break StopReason::Fatal(reason);
            }

            let delay = self.delay.next_delay(&mut rand::thread_rng());
            tracing::debug!(?delay, "Waiting before next attempt");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => {
                    tracing::info!("Audit worker shutting down");
                    break StopReason::Shutdown;
                }
            }
        };

        self.stats.running.store(false, Ordering::SeqCst);
        let snapshot = self.stats.snapshot().await;
        let summary = WorkerSummary {
            attempts: snapshot.attempts,
            hits: snapshot.hits,
            errors: snapshot.errors,
            stopped,
        };
        tracing::info!(
            attempts = summary.attempts,
            hits = summary.hits,
            errors = summary.errors,
            stopped = ?summary.stopped,
            "Audit worker finished"
        );
        summary
    }

    /// Spawn the loop on the runtime and keep its handle
    pub fn spawn(self) -> WorkerHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let stats = self.stats.clone();
        let handle = tokio::spawn(self.run(shutdown_rx));

        WorkerHandle {
            handle,
            shutdown,
            stats,
        }
    }
}

fn hit_text(verdict: Verdict, status_code: u32, coupon: &str, message: &str) -> String {
    let headline = match verdict {
        Verdict::LimitReached => "Coupon found (redemption limit reached)",
        _ => "Coupon applied!",
    };
    format!("{headline}\nCode: {status_code}\nCoupon: {coupon}\nMessage: {message}")
}

// ============================================================================
// Worker Handle
// ============================================================================

/// Handle to the spawned worker task
pub struct WorkerHandle {
    handle: tokio::task::JoinHandle<WorkerSummary>,
    shutdown: watch::Sender<bool>,
    stats: Arc<WorkerStats>,
}

impl WorkerHandle {
    pub fn stats(&self) -> Arc<WorkerStats> {
        self.stats.clone()
    }

    /// Check if the task is still running
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Wait for the loop to end on its own
    pub async fn wait(self) -> Option<WorkerSummary> {
        match self.handle.await {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::error!(error = %e, "Audit worker task failed");
                None
            }
        }
    }

    /// Signal shutdown and wait for the loop to finish
    pub async fn shutdown(self) -> Option<WorkerSummary> {
        let _ = self.shutdown.send(true);
        self.wait().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_text_contains_coupon() {
        let text = hit_text(Verdict::Applied, 1022, "K6GLNG7ABCDE", "Coupon applied successfully");
        assert!(text.starts_with("Coupon applied!"));
        assert!(text.contains("Coupon: K6GLNG7ABCDE"));
        assert!(text.contains("Code: 1022"));

        let text = hit_text(Verdict::LimitReached, 1023, "K6GLNG7ABCDE", "Maximum redemption limit");
        assert!(text.contains("limit reached"));
    }

    #[tokio::test]
    async fn test_stats_snapshot_defaults() {
        let stats = WorkerStats::default();
        let snap = stats.snapshot().await;
        assert_eq!(snap, StatsSnapshot::default());
        assert!(!stats.is_running());
    }
}
