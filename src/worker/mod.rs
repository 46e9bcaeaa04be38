//! Audit worker loop
//!
//! ```text
//! generate ──▶ redeem ──▶ classify ──▶ (hit) notify ──▶ journal ──▶ sleep ─┐
//!    ▲                                                                     │
//!    └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The loop runs in one tokio task until its shutdown channel fires, a fatal
//! outcome is seen, or the optional attempt cap is reached.

mod runner;
mod verdict;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use runner::{Attempt, StatsSnapshot, StopReason, SweepWorker, WorkerHandle, WorkerStats, WorkerSummary};
pub use verdict::Verdict;

/// Pause between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DelayPolicy {
    Fixed { ms: u64 },
    Uniform { min_ms: u64, max_ms: u64 },
}

impl DelayPolicy {
    pub const DEFAULT_MIN_MS: u64 = 1_000;
    pub const DEFAULT_MAX_MS: u64 = 2_000;

    /// Draw the next pause
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        match *self {
            Self::Fixed { ms } => Duration::from_millis(ms),
            Self::Uniform { min_ms, max_ms } if min_ms >= max_ms => Duration::from_millis(min_ms),
            Self::Uniform { min_ms, max_ms } => Duration::from_millis(rng.gen_range(min_ms..=max_ms)),
        }
    }
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self::Uniform {
            min_ms: Self::DEFAULT_MIN_MS,
            max_ms: Self::DEFAULT_MAX_MS,
        }
    }
}
