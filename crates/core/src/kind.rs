// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job kind vocabulary.

use crate::id::JobId;
use serde::{Deserialize, Serialize};

/// The three analytical job kinds the backend runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Demand forecast for a scenario across sectors.
    Forecast,
    /// Load-profile generation.
    Profile,
    /// Power-system optimization (PyPSA).
    Pypsa,
}

impl JobKind {
    pub const ALL: [JobKind; 3] = [JobKind::Forecast, JobKind::Profile, JobKind::Pypsa];

    /// Wire name used in room names and API payloads.
    pub fn wire_name(self) -> &'static str {
        match self {
            JobKind::Forecast => "forecast",
            JobKind::Profile => "profile",
            JobKind::Pypsa => "pypsa",
        }
    }

    /// Four-character prefix for minted job IDs.
    pub fn id_prefix(self) -> &'static str {
        match self {
            JobKind::Forecast => "fct-",
            JobKind::Profile => "prf-",
            JobKind::Pypsa => "psa-",
        }
    }

    /// Pub/sub room carrying this job's progress events.
    pub fn room(self, id: &JobId) -> String {
        format!("{}-job-{}", self.wire_name(), id)
    }
}

crate::simple_display! {
    JobKind {
        Forecast => "forecast",
        Profile => "profile",
        Pypsa => "pypsa",
    }
}

impl std::str::FromStr for JobKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forecast" => Ok(JobKind::Forecast),
            "profile" => Ok(JobKind::Profile),
            "pypsa" => Ok(JobKind::Pypsa),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

/// Error for unrecognized kind names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job kind: {0}")]
pub struct UnknownKind(pub String);

#[cfg(test)]
#[path = "kind_tests.rs"]
mod tests;
