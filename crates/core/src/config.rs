// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-kind job configuration payloads.
//!
//! Closed vocabularies (forecast models, profile methods, investment modes)
//! are typed enums with their wire spellings, so an unknown value is
//! rejected when the body is read; [`crate::validate`] reports that
//! rejection alongside the semantic rules. Solver names stay strings and
//! are validated against [`KNOWN_SOLVERS`], since the solver roster changes
//! with worker deployments rather than with this crate.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Solvers the optimization worker knows how to drive.
pub const KNOWN_SOLVERS: [&str; 4] = ["highs", "cbc", "glpk", "gurobi"];

/// Forecast models a sector may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    #[serde(rename = "SLR")]
    Slr,
    /// Requires `independent_variables` on the sector.
    #[serde(rename = "MLR")]
    Mlr,
    /// Requires a positive `window_size` on the sector.
    #[serde(rename = "WAM")]
    Wam,
    TimeSeries,
}

crate::simple_display! {
    ModelKind {
        Slr => "SLR",
        Mlr => "MLR",
        Wam => "WAM",
        TimeSeries => "TimeSeries",
    }
}

/// Load-profile generation methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileMethod {
    /// Scales a historical base year; requires `base_year`.
    BaseScaling,
    StlDecomposition,
    /// Applies a stored template; requires `template_id`.
    CustomTemplate,
    StatisticalSampling,
}

crate::simple_display! {
    ProfileMethod {
        BaseScaling => "base_scaling",
        StlDecomposition => "stl_decomposition",
        CustomTemplate => "custom_template",
        StatisticalSampling => "statistical_sampling",
    }
}

/// Optimization investment modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentMode {
    SingleYear,
    MultiYear,
}

crate::simple_display! {
    InvestmentMode {
        SingleYear => "single_year",
        MultiYear => "multi_year",
    }
}

/// Configuration for a demand-forecast job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub scenario_name: String,
    pub target_year: i32,
    /// Sector name → models and model parameters. Insertion order is
    /// preserved so workers process sectors in the order submitted.
    pub sectors: IndexMap<String, SectorConfig>,
    /// Per-request deadline override, clamped by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Models and model parameters for one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorConfig {
    pub models: Vec<ModelKind>,
    /// Required when `models` includes [`ModelKind::Mlr`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub independent_variables: Vec<String>,
    /// Moving-average window; required positive when `models` includes
    /// [`ModelKind::Wam`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_size: Option<u32>,
}

/// Configuration for a load-profile generation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub method: ProfileMethod,
    pub start_year: i32,
    pub end_year: i32,
    /// Historical base year; required by `base_scaling`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_year: Option<i32>,
    /// Stored template identifier; required by `custom_template`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Configuration for a power-system optimization job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PypsaConfig {
    pub scenario_name: String,
    pub base_year: i32,
    pub investment_mode: InvestmentMode,
    #[serde(default)]
    pub solver: SolverOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Solver selection and limits for optimization runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    #[serde(default = "default_solver")]
    pub name: String,
    #[serde(default = "default_time_limit")]
    pub time_limit_secs: u64,
    #[serde(default = "default_mip_gap")]
    pub mip_gap: f64,
}

fn default_solver() -> String {
    "highs".to_string()
}

fn default_time_limit() -> u64 {
    3600
}

fn default_mip_gap() -> f64 {
    0.01
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            name: default_solver(),
            time_limit_secs: default_time_limit(),
            mip_gap: default_mip_gap(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
