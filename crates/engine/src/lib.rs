// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! joule-engine: job registry, worker supervisor, and progress bus

pub mod bus;
pub mod command;
pub mod error;
pub mod registry;
pub mod supervisor;

pub use bus::{Envelope, ProgressBus, SessionQueue};
pub use command::WorkerCommand;
pub use error::{SupervisorError, WorkerOutcome};
pub use registry::{JobRegistry, JobSummary, RegistryCounts};
pub use supervisor::{
    run_oneshot, ResultWriter, StartOptions, SupervisorConfig, WorkerSupervisor,
};
