// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress sink abstraction.
//!
//! The supervisor publishes events through a sink injected at worker start,
//! keeping it decoupled from the progress bus and trivially testable.

use crate::event::JobEvent;

/// Receives events emitted on behalf of a running job.
///
/// `publish` must not block: implementations buffer per subscriber.
pub trait ProgressSink: Send + Sync {
    fn publish(&self, room: &str, event: JobEvent);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn publish(&self, _room: &str, _event: JobEvent) {}
}

/// Sink that records every published event, for tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct CapturingSink {
    events: parking_lot::Mutex<Vec<(String, JobEvent)>>,
}

#[cfg(any(test, feature = "test-support"))]
impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far.
    pub fn events(&self) -> Vec<(String, JobEvent)> {
        self.events.lock().clone()
    }

    /// Events published to one room, in publication order.
    pub fn room_events(&self, room: &str) -> Vec<JobEvent> {
        self.events
            .lock()
            .iter()
            .filter(|(r, _)| r == room)
            .map(|(_, e)| e.clone())
            .collect()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl ProgressSink for CapturingSink {
    fn publish(&self, room: &str, event: JobEvent) {
        self.events.lock().push((room.to_string(), event));
    }
}
