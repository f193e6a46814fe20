// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker stdout wire protocol.
//!
//! A compute worker writes one JSON object per line to stdout. Progress lines
//! may appear any number of times; a result line is emitted at most once, as
//! the final line on success. Unknown type tags are tolerated so workers can
//! grow new event shapes without breaking older supervisors.

use serde::{Deserialize, Serialize};

/// One parsed line of worker stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerLine {
    /// Incremental progress report.
    Progress {
        progress: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sector: Option<String>,
    },
    /// Final kind-specific payload.
    Result {
        #[serde(flatten)]
        payload: serde_json::Value,
    },
    /// Unrecognized type tag; logged by callers and otherwise ignored.
    #[serde(other, skip_serializing)]
    Unknown,
}

/// Parse a single stdout line.
///
/// Lines that are not valid JSON (or not an object with a `type` tag) fail
/// with the underlying serde error; callers log and skip them.
pub fn parse_worker_line(line: &str) -> Result<WorkerLine, serde_json::Error> {
    serde_json::from_str(line)
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
