// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result discovery: reconcile the in-memory artifact index with disk.
//!
//! Workers drop artifacts into the project tree on their own; the index here
//! is rebuilt on explicit `rescan_*` calls (and on single-entry misses), so
//! listings stay cheap between refreshes.

use crate::error::StorageError;
use crate::layout;
use crate::store::ArtifactStore;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Metadata extracted from a saved load profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileMeta {
    pub profile_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_time: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub years_generated: Vec<i32>,
    pub summary: serde_json::Value,
    pub size_bytes: u64,
}

/// Metadata for a discovered optimization network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMeta {
    pub scenario_name: String,
    pub rel_path: String,
    pub size_bytes: u64,
    pub modified_at_ms: u64,
}

/// Lazily refreshed index over the artifact directories.
pub struct ResultDiscovery {
    store: Arc<ArtifactStore>,
    profiles: RwLock<IndexMap<String, ProfileMeta>>,
    networks: RwLock<IndexMap<String, NetworkMeta>>,
}

impl ResultDiscovery {
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self {
            store,
            profiles: RwLock::new(IndexMap::new()),
            networks: RwLock::new(IndexMap::new()),
        }
    }

    /// Current profile listing (as of the last rescan).
    pub fn profiles(&self) -> Vec<ProfileMeta> {
        self.profiles.read().values().cloned().collect()
    }

    /// Look up one profile; rescans once on an index miss.
    pub fn profile(&self, profile_id: &str) -> Result<Option<ProfileMeta>, StorageError> {
        if let Some(meta) = self.profiles.read().get(profile_id) {
            return Ok(Some(meta.clone()));
        }
        self.rescan_profiles()?;
        Ok(self.profiles.read().get(profile_id).cloned())
    }

    /// Drop one profile from the index (after deletion).
    pub fn evict_profile(&self, profile_id: &str) {
        self.profiles.write().shift_remove(profile_id);
    }

    /// Rebuild the profile index from `results/load_profiles/*.json`.
    ///
    /// Unparseable files are logged and skipped; they never poison the scan.
    pub fn rescan_profiles(&self) -> Result<Vec<ProfileMeta>, StorageError> {
        let mut index = IndexMap::new();
        for name in self.store.list(layout::LOAD_PROFILES_DIR)? {
            let Some(profile_id) = name.strip_suffix(".json") else {
                continue;
            };
            let rel = layout::profile_path(profile_id);
            match self.read_profile_meta(profile_id, &rel) {
                Ok(meta) => {
                    index.insert(profile_id.to_string(), meta);
                }
                Err(e) => {
                    tracing::warn!(path = %rel, error = %e, "skipping unreadable profile");
                }
            }
        }
        index.sort_keys();
        let listing = index.values().cloned().collect();
        *self.profiles.write() = index;
        Ok(listing)
    }

    /// Current network listing (as of the last rescan).
    pub fn networks(&self) -> Vec<NetworkMeta> {
        self.networks.read().values().cloned().collect()
    }

    /// Rebuild the network index from `results/pypsa/<scenario>/<scenario>.nc`.
    pub fn rescan_networks(&self) -> Result<Vec<NetworkMeta>, StorageError> {
        let mut index = IndexMap::new();
        for scenario in self.store.list(layout::PYPSA_DIR)? {
            let rel = layout::network_path(&scenario);
            match self.store.stat(&rel) {
                Ok(stat) => {
                    index.insert(
                        scenario.clone(),
                        NetworkMeta {
                            scenario_name: scenario,
                            rel_path: rel,
                            size_bytes: stat.size_bytes,
                            modified_at_ms: stat.modified_at_ms,
                        },
                    );
                }
                // Directories without a solved network are not results yet.
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        index.sort_keys();
        let listing = index.values().cloned().collect();
        *self.networks.write() = index;
        Ok(listing)
    }

    fn read_profile_meta(&self, profile_id: &str, rel: &str) -> Result<ProfileMeta, StorageError> {
        let raw: serde_json::Value = self.store.read_json(rel)?;
        let stat = self.store.stat(rel)?;

        let summary = match raw.get("statistics") {
            Some(stats) if !stats.is_null() => stats.clone(),
            _ => compute_summary(raw.get("data")),
        };
        let years_generated = raw
            .get("years_generated")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        Ok(ProfileMeta {
            profile_id: profile_id.to_string(),
            method: raw.get("method").and_then(|v| v.as_str()).map(str::to_string),
            generation_time: raw
                .get("generation_time")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            years_generated,
            summary,
            size_bytes: stat.size_bytes,
        })
    }
}

/// Summary statistics over a profile's per-year series.
///
/// `data` is expected to be `{year: [numbers]}`; anything else summarizes as
/// an empty object.
fn compute_summary(data: Option<&serde_json::Value>) -> serde_json::Value {
    let mut count = 0usize;
    let mut sum = 0.0f64;
    let mut peak = f64::MIN;
    let mut min = f64::MAX;

    if let Some(serde_json::Value::Object(years)) = data {
        for series in years.values() {
            if let serde_json::Value::Array(points) = series {
                for point in points {
                    if let Some(v) = point.as_f64() {
                        count += 1;
                        sum += v;
                        peak = peak.max(v);
                        min = min.min(v);
                    }
                }
            }
        }
    }

    if count == 0 {
        return serde_json::json!({});
    }
    serde_json::json!({
        "peak_load": peak,
        "min_load": min,
        "avg_load": sum / count as f64,
    })
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
