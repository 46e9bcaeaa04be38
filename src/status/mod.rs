//! HTTP status server
//!
//! # Routes
//!
//! ```text
//! GET  /             greeting
//! GET  /api/health   liveness + uptime
//! GET  /api/status   worker counters and coupon book stats
//! GET  /api/logs     last 50 attempt journal lines
//! GET  /api/start    owner-only welcome notification (X-Owner-Id header)
//! POST /api/redeem   coupon book redemption (Bearer API key)
//! ```

pub mod api;
pub mod server;

pub use api::create_router;
pub use server::{AppState, ServerError, StatusServer};
