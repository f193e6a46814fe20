// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory TTL cache with codec deep copies.
//!
//! Values are stored as [`serde_json::Value`] produced by serialization, and
//! handed out as clones, so a caller can never mutate cached state through a
//! returned value. `get` purges expired entries on contact; the background
//! sweeper only reclaims memory for keys nobody touches.

use crate::error::CacheError;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

struct CacheEntry {
    value: serde_json::Value,
    /// None = never expires.
    expires_at: Option<Instant>,
}

/// Keyed store with per-entry expiry.
#[derive(Default)]
pub struct TtlCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key`. Expired entries are removed and read as absent.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some(entry) => entry.expires_at.is_some_and(|at| Instant::now() >= at),
            None => return None,
        };
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|e| e.value.clone())
    }

    /// Store a deep copy of `value` under `key`.
    ///
    /// A `ttl` of `None` (or zero) means the entry never expires. Empty keys
    /// and unserializable values are rejected, never silently stored.
    pub fn set(
        &self,
        key: &str,
        value: &impl Serialize,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey);
        }
        let value = serde_json::to_value(value).map_err(CacheError::NotSerializable)?;
        let expires_at = ttl.filter(|t| !t.is_zero()).map(|t| Instant::now() + t);
        self.entries.lock().insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    /// Remove `key`. Removing an absent key is fine.
    pub fn delete(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    /// Remove all entries.
    pub fn flush(&self) {
        self.entries.lock().clear();
    }

    /// Non-expired keys, in unspecified order.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.entries
            .lock()
            .iter()
            .filter(|(_, e)| e.expires_at.is_none_or(|at| now < at))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Drop expired entries; returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| e.expires_at.is_none_or(|at| now < at));
        before - entries.len()
    }

    /// Spawn the background sweeper. Runs until `cancel` fires.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = cache.sweep();
                        if removed > 0 {
                            tracing::debug!(removed, "cache sweep");
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
