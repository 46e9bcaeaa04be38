//! Self-hosted coupon book
//!
//! Issued codes with a per-code redemption limit. This is the service the
//! worker audits; it is mounted on the status server as `POST /api/redeem`.

use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::RedeemResponse;
use crate::generator::CodeGenerator;

#[derive(Debug, Default)]
struct Entry {
    redemptions: u32,
}

/// Issued coupon codes and their redemption counts
pub struct CouponBook {
    entries: RwLock<HashMap<String, Entry>>,
    max_redemptions: u32,
    api_key: Option<String>,
}

/// Coupon book counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookStats {
    pub issued: usize,
    pub redeemed: usize,
    pub exhausted: usize,
}

impl CouponBook {
    pub fn new(max_redemptions: u32, api_key: Option<String>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_redemptions: max_redemptions.max(1),
            api_key,
        }
    }

    /// Check a bearer token against the configured key
    ///
    /// A book without a key accepts every caller.
    pub fn authorize(&self, token: Option<&str>) -> bool {
        match &self.api_key {
            Some(key) => token == Some(key.as_str()),
            None => true,
        }
    }

    /// Issue a code; returns false if it was already issued
    pub async fn issue(&self, code: impl Into<String>) -> bool {
        let mut entries = self.entries.write().await;
        let code = code.into();
        if entries.contains_key(&code) {
            return false;
        }
        entries.insert(code, Entry::default());
        true
    }

    /// Issue `count` distinct random codes from `generator`
    ///
    /// Stops early if the generator's keyspace is smaller than `count`.
    pub async fn issue_random(&self, generator: &CodeGenerator, count: usize) -> Vec<String> {
        let target = count.min(usize::try_from(generator.keyspace()).unwrap_or(usize::MAX));
        let mut issued = Vec::with_capacity(target);
        let mut entries = self.entries.write().await;

        while issued.len() < target {
            let code = generator.generate();
            if entries.contains_key(&code) {
                continue;
            }
            entries.insert(code.clone(), Entry::default());
            issued.push(code);
        }

        tracing::info!(count = issued.len(), "Issued coupon codes");
        issued
    }

    /// Try to redeem one code
    pub async fn redeem(&self, code: &str) -> RedeemResponse {
        let mut entries = self.entries.write().await;
        match entries.get_mut(code) {
            None => RedeemResponse::invalid(code),
            Some(entry) if entry.redemptions >= self.max_redemptions => {
                RedeemResponse::limit_reached(code)
            }
            Some(entry) => {
                entry.redemptions += 1;
                tracing::info!(coupon = %code, redemptions = entry.redemptions, "Coupon redeemed");
                RedeemResponse::applied(code)
            }
        }
    }

    pub async fn contains(&self, code: &str) -> bool {
        self.entries.read().await.contains_key(code)
    }

    pub async fn stats(&self) -> BookStats {
        let entries = self.entries.read().await;
        BookStats {
            issued: entries.len(),
            redeemed: entries.values().filter(|e| e.redemptions > 0).count(),
            exhausted: entries
                .values()
                .filter(|e| e.redemptions >= self.max_redemptions)
                .count(),
        }
    }
}
