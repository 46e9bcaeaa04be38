//! coupon-audit - promotion code guessability audit
//!
//! Issues a book of promotion codes, then runs a single background worker
//! that guesses codes of the same shape against that book, journals every
//! attempt, and notifies the operator through a messaging bot on a hit.
//!
//! # Architecture
//!
//! - [`generator`] - Candidate codes: fixed prefix + random suffix
//! - [`redeem`] - Redemption client and the self-hosted coupon book
//! - [`notifications`] - Operator notifications via a bot channel
//! - [`storage`] - Append-only attempt journal
//! - [`worker`] - The audit loop and its handle
//! - [`status`] - HTTP status endpoints (axum)
//! - [`config`] - Configuration from environment or TOML
//! - [`app`] - Process lifecycle
//!
//! # Example
//!
//! ```no_run
//! use coupon_audit::app::App;
//! use coupon_audit::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let app = App::new(config)?;
//!     app.run(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod generator;
pub mod notifications;
pub mod redeem;
pub mod status;
pub mod storage;
pub mod worker;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::App;
    pub use crate::config::Config;
    pub use crate::error::{AuditErrorTrait, Error, ErrorCategory, Result};
    pub use crate::generator::{Alphabet, CodeGenerator};
    pub use crate::notifications::Notifier;
    pub use crate::redeem::{CouponBook, RedeemOutcome, RedemptionClient};
    pub use crate::storage::{AttemptJournal, AttemptRecord};
    pub use crate::worker::{SweepWorker, Verdict, WorkerHandle};
}
