// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structural and semantic validation of job configurations.
//!
//! Validation is pure: it inspects a config and an injected current year and
//! produces a [`Validation`] verdict without side effects. Closed
//! vocabularies (models, methods, modes) are enforced by the typed config
//! enums; [`validate_config`] folds those rejections into the same verdict
//! shape as the semantic rules below. The server feeds the real current
//! year; tests pin one.

use crate::config::{
    ForecastConfig, ModelKind, ProfileConfig, ProfileMethod, PypsaConfig, KNOWN_SOLVERS,
};
use crate::kind::JobKind;

/// How far into the future a forecast target year may lie.
pub const MAX_HORIZON_YEARS: i32 = 50;

/// Earliest year accepted anywhere (historical data floor).
pub const MIN_YEAR: i32 = 1990;

/// Outcome of validating a job configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Validation {
    pub fn ok() -> Self {
        Self { valid: true, errors: Vec::new() }
    }

    pub fn from_errors(errors: Vec<String>) -> Self {
        Self { valid: errors.is_empty(), errors }
    }
}

/// True for identifiers safe to embed in paths and room names:
/// non-empty, only letters, digits, `_`, `-`, `.`, and not a dot-only name
/// (`.` and `..` are path components, not identifiers).
pub fn valid_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !s.chars().all(|c| c == '.')
}

/// Validate a raw config payload for the given kind.
///
/// Structural problems (wrong shape, unknown vocabulary values) are reported
/// as validation errors so callers see a single failure shape.
pub fn validate_config(kind: JobKind, config: &serde_json::Value, current_year: i32) -> Validation {
    match kind {
        JobKind::Forecast => match serde_json::from_value::<ForecastConfig>(config.clone()) {
            Ok(cfg) => validate_forecast(&cfg, current_year),
            Err(e) => Validation::from_errors(vec![format!("invalid forecast config: {e}")]),
        },
        JobKind::Profile => match serde_json::from_value::<ProfileConfig>(config.clone()) {
            Ok(cfg) => validate_profile(&cfg, current_year),
            Err(e) => Validation::from_errors(vec![format!("invalid profile config: {e}")]),
        },
        JobKind::Pypsa => match serde_json::from_value::<PypsaConfig>(config.clone()) {
            Ok(cfg) => validate_pypsa(&cfg, current_year),
            Err(e) => Validation::from_errors(vec![format!("invalid optimization config: {e}")]),
        },
    }
}

/// Validate a demand-forecast configuration.
pub fn validate_forecast(cfg: &ForecastConfig, current_year: i32) -> Validation {
    let mut errors = Vec::new();

    if !valid_identifier(&cfg.scenario_name) {
        errors.push(format!(
            "scenario_name must be non-empty and contain only letters, digits, '_', '-', '.' (got {:?})",
            cfg.scenario_name
        ));
    }
    if cfg.target_year < current_year || cfg.target_year > current_year + MAX_HORIZON_YEARS {
        errors.push(format!(
            "target_year must be between {} and {} (got {})",
            current_year,
            current_year + MAX_HORIZON_YEARS,
            cfg.target_year
        ));
    }
    if cfg.sectors.is_empty() {
        errors.push("sectors must not be empty".to_string());
    }

    for (sector, sc) in &cfg.sectors {
        if sc.models.is_empty() {
            errors.push(format!("sector {sector:?}: models must not be empty"));
            continue;
        }
        if sc.models.contains(&ModelKind::Mlr) && sc.independent_variables.is_empty() {
            errors.push(format!("sector {sector:?}: MLR requires independent_variables"));
        }
        if sc.models.contains(&ModelKind::Wam) && sc.window_size.unwrap_or(0) == 0 {
            errors.push(format!("sector {sector:?}: WAM requires a positive window_size"));
        }
    }

    Validation::from_errors(errors)
}

/// Validate a load-profile configuration.
pub fn validate_profile(cfg: &ProfileConfig, current_year: i32) -> Validation {
    let mut errors = Vec::new();

    if cfg.start_year > cfg.end_year {
        errors.push(format!(
            "start_year ({}) must not exceed end_year ({})",
            cfg.start_year, cfg.end_year
        ));
    }
    if cfg.start_year < MIN_YEAR || cfg.end_year > current_year + MAX_HORIZON_YEARS {
        errors.push(format!(
            "year range must lie within {}..={} (got {}..={})",
            MIN_YEAR,
            current_year + MAX_HORIZON_YEARS,
            cfg.start_year,
            cfg.end_year
        ));
    }

    match cfg.method {
        ProfileMethod::BaseScaling => match cfg.base_year {
            None => errors.push("base_scaling requires base_year".to_string()),
            Some(y) if y < MIN_YEAR || y > current_year => errors.push(format!(
                "base_year must lie within the historical range {MIN_YEAR}..={current_year} (got {y})"
            )),
            Some(_) => {}
        },
        ProfileMethod::CustomTemplate => {
            if cfg.template_id.as_deref().map_or(true, |t| t.is_empty()) {
                errors.push("custom_template requires template_id".to_string());
            }
        }
        ProfileMethod::StlDecomposition | ProfileMethod::StatisticalSampling => {}
    }

    Validation::from_errors(errors)
}

/// Validate an optimization configuration.
pub fn validate_pypsa(cfg: &PypsaConfig, current_year: i32) -> Validation {
    let mut errors = Vec::new();

    if !valid_identifier(&cfg.scenario_name) {
        errors.push(format!(
            "scenario_name must be non-empty and contain only letters, digits, '_', '-', '.' (got {:?})",
            cfg.scenario_name
        ));
    }
    if cfg.base_year < MIN_YEAR || cfg.base_year > current_year + MAX_HORIZON_YEARS {
        errors.push(format!(
            "base_year must lie within {}..={} (got {})",
            MIN_YEAR,
            current_year + MAX_HORIZON_YEARS,
            cfg.base_year
        ));
    }
    if !KNOWN_SOLVERS.contains(&cfg.solver.name.as_str()) {
        errors.push(format!(
            "unknown solver {:?} (expected one of {KNOWN_SOLVERS:?})",
            cfg.solver.name
        ));
    }
    if cfg.solver.time_limit_secs == 0 {
        errors.push("solver time_limit_secs must be positive".to_string());
    }
    if cfg.solver.mip_gap <= 0.0 {
        errors.push("solver mip_gap must be positive".to_string());
    }

    Validation::from_errors(errors)
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
