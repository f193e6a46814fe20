// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! joule-server: HTTP and WebSocket surface for the Joule backend

pub mod env;
pub mod error;
pub mod jobs;
pub mod routes;
pub mod state;

pub use env::Settings;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
