// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress bus: room-keyed fan-out to connected client sessions.
//!
//! Publishers never block. Each session owns a bounded outbound queue; when
//! a queue is full the oldest non-terminal event is evicted so terminal
//! events (completed/cancelled/error) always get through. A session whose
//! queue cannot absorb a terminal event is irrecoverably behind and gets
//! disconnected.

use joule_core::{JobEvent, ProgressSink, SessionId};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::Notify;

/// Default per-subscriber outbound queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Event envelope as delivered over the session transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub room: String,
    #[serde(flatten)]
    pub event: JobEvent,
}

enum Push {
    Queued,
    /// Dropped per overflow policy (non-terminal with nothing evictable).
    Dropped,
    /// Queue cannot absorb a terminal event; session must be disconnected.
    Behind,
}

struct QueueState {
    events: VecDeque<Envelope>,
    closed: bool,
}

/// Bounded outbound queue for one session.
///
/// `recv` is the consuming side, driven by the session's writer task.
pub struct SessionQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    capacity: usize,
}

impl SessionQueue {
    fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState { events: VecDeque::new(), closed: false }),
            notify: Notify::new(),
            capacity,
        }
    }

    fn push(&self, envelope: Envelope) -> Push {
        let mut state = self.state.lock();
        if state.closed {
            return Push::Queued;
        }
        if state.events.len() >= self.capacity {
            if let Some(oldest) = state.events.iter().position(|e| !e.event.kind.is_terminal()) {
                state.events.remove(oldest);
            } else if envelope.event.kind.is_terminal() {
                // Every buffered event is terminal and another terminal
                // arrived: the consumer is not keeping up at all.
                state.closed = true;
                self.notify.notify_waiters();
                return Push::Behind;
            } else {
                return Push::Dropped;
            }
        }
        state.events.push_back(envelope);
        self.notify.notify_one();
        Push::Queued
    }

    fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.events.clear();
        self.notify.notify_waiters();
    }

    /// Next envelope, or None once the session is closed.
    pub async fn recv(&self) -> Option<Envelope> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock();
                if let Some(envelope) = state.events.pop_front() {
                    return Some(envelope);
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Buffered event count (tests and health reporting).
    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

struct BusState {
    rooms: HashMap<String, HashSet<SessionId>>,
    sessions: HashMap<SessionId, Arc<SessionQueue>>,
}

/// Publish/subscribe hub; one room per job.
pub struct ProgressBus {
    state: Mutex<BusState>,
    queue_capacity: usize,
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl ProgressBus {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            state: Mutex::new(BusState { rooms: HashMap::new(), sessions: HashMap::new() }),
            queue_capacity,
        }
    }

    /// Register a session and hand back its outbound queue.
    pub fn register_session(&self, session: SessionId) -> Arc<SessionQueue> {
        let queue = Arc::new(SessionQueue::new(self.queue_capacity));
        self.state.lock().sessions.insert(session, Arc::clone(&queue));
        queue
    }

    /// Add a session to a room. Idempotent; unknown sessions are ignored.
    pub fn join(&self, session: &SessionId, room: &str) {
        let mut state = self.state.lock();
        if !state.sessions.contains_key(session) {
            tracing::warn!(%session, room, "join from unregistered session");
            return;
        }
        state.rooms.entry(room.to_string()).or_default().insert(session.clone());
    }

    /// Remove a session from a room. Idempotent.
    pub fn leave(&self, session: &SessionId, room: &str) {
        let mut state = self.state.lock();
        if let Some(members) = state.rooms.get_mut(room) {
            members.remove(session);
            if members.is_empty() {
                state.rooms.remove(room);
            }
        }
    }

    /// Remove the session from all rooms and drain its queue. In-flight
    /// events for it are discarded; publishers are not told.
    pub fn close_session(&self, session: &SessionId) {
        let mut state = self.state.lock();
        for members in state.rooms.values_mut() {
            members.remove(session);
        }
        state.rooms.retain(|_, members| !members.is_empty());
        if let Some(queue) = state.sessions.remove(session) {
            queue.close();
        }
    }

    /// Current member count of a room.
    pub fn room_size(&self, room: &str) -> usize {
        self.state.lock().rooms.get(room).map_or(0, HashSet::len)
    }
}

impl ProgressSink for ProgressBus {
    fn publish(&self, room: &str, event: JobEvent) {
        let mut state = self.state.lock();
        let Some(members) = state.rooms.get(room) else {
            return;
        };

        let mut behind = Vec::new();
        for session in members {
            let Some(queue) = state.sessions.get(session) else {
                continue;
            };
            let envelope = Envelope { room: room.to_string(), event: event.clone() };
            match queue.push(envelope) {
                Push::Queued => {}
                Push::Dropped => {
                    tracing::debug!(%session, room, "dropped progress event for slow subscriber");
                }
                Push::Behind => {
                    tracing::warn!(%session, room, "disconnecting subscriber that fell behind");
                    behind.push(session.clone());
                }
            }
        }

        for session in behind {
            for members in state.rooms.values_mut() {
                members.remove(&session);
            }
            state.rooms.retain(|_, members| !members.is_empty());
            if let Some(queue) = state.sessions.remove(&session) {
                queue.close();
            }
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
