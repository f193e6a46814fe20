// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk layout under the project root.
//!
//! ```text
//! <projectRoot>/results/load_profiles/<profileId>.json
//! <projectRoot>/results/pypsa/<scenario>/<scenario>.nc
//! <projectRoot>/storage/...   user uploads, templates
//! <projectRoot>/logs/...      operational logs
//! ```

/// Saved load profiles, one JSON file per profile.
pub const LOAD_PROFILES_DIR: &str = "results/load_profiles";

/// Solved optimization networks, one directory per scenario.
pub const PYPSA_DIR: &str = "results/pypsa";

/// User uploads and templates.
pub const STORAGE_DIR: &str = "storage";

/// Operational logs (rolling daemon log lives here).
pub const LOGS_DIR: &str = "logs";

/// Project-relative path of a saved load profile.
pub fn profile_path(profile_id: &str) -> String {
    format!("{LOAD_PROFILES_DIR}/{profile_id}.json")
}

/// Project-relative directory of an optimization scenario.
pub fn network_dir(scenario: &str) -> String {
    format!("{PYPSA_DIR}/{scenario}")
}

/// Project-relative path of a solved network file.
pub fn network_path(scenario: &str) -> String {
    format!("{PYPSA_DIR}/{scenario}/{scenario}.nc")
}
