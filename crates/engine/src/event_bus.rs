// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Event Bus (§4.1): a `runId → topic` registry. Subscribers are
//! ephemeral page views; the Run Store holds durable state, so the bus only
//! has to guarantee liveness of the *stream*, not durability — a stuck
//! subscriber is dropped rather than allowed to block the publisher.

use loadtest_core::{Clock, ProgressMetrics, RunId, RunSummary};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// An event published on a run's topic. The `type` tag matches the bus event
/// name a WebSocket frame carries (§6 Subscription surface).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    Progress(ProgressMetrics),
    Log { message: String, timestamp_ms: u64 },
    Completed(RunSummary),
    Failed { message: String },
    Stopped,
}

impl RunEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunEvent::Completed(_) | RunEvent::Failed { .. } | RunEvent::Stopped
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubscribeError {
    #[error("run not live")]
    RunNotLive,
}

struct Topic {
    subscribers: HashMap<u64, mpsc::Sender<RunEvent>>,
    /// Set exactly once, when the topic's terminal event is published.
    terminal: Option<(RunEvent, u64)>,
}

impl Topic {
    fn new() -> Self {
        Self { subscribers: HashMap::new(), terminal: None }
    }
}

/// `runId → topic`, guarded by a single `parking_lot::Mutex` (never
/// `std::sync`, to avoid poisoning on panic). Generic over `Clock` so tests
/// can drive a `FakeClock`.
pub struct EventBus<C: Clock> {
    topics: Mutex<HashMap<RunId, Topic>>,
    queue_capacity: usize,
    grace_ms: u64,
    clock: C,
    next_subscriber_id: AtomicU64,
}

/// A live handle returned by [`EventBus::subscribe`]. Dropping it is an
/// idempotent unsubscribe — the next publish attempt finds the channel
/// closed and removes it.
pub struct Subscription {
    pub run_id: RunId,
    subscriber_id: u64,
    pub receiver: mpsc::Receiver<RunEvent>,
}

impl<C: Clock> EventBus<C> {
    pub fn new(queue_capacity: usize, grace_ms: u64, clock: C) -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            queue_capacity,
            grace_ms,
            clock,
            next_subscriber_id: AtomicU64::new(1),
        }
    }

    /// Opens a topic for a run that is about to start. Called by the
    /// Orchestrator before the Supervisor is spawned so a subscriber racing
    /// the very first event still finds a live topic.
    pub fn register(&self, run_id: RunId) {
        self.topics.lock().entry(run_id).or_insert_with(Topic::new);
    }

    /// Enqueues `event` on `run_id`'s topic. Non-blocking: a subscriber whose
    /// buffer is full is dropped (never retried, never awaited).
    pub fn publish(&self, run_id: RunId, event: RunEvent) {
        let mut topics = self.topics.lock();
        self.sweep_expired(&mut topics);
        let Some(topic) = topics.get_mut(&run_id) else {
            tracing::warn!(run_id = %run_id, "publish to unknown topic, dropping event");
            return;
        };

        topic.subscribers.retain(|subscriber_id, sender| match sender.try_send(event.clone()) {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(run_id = %run_id, subscriber_id, "slow_subscriber, dropping");
                false
            }
        });

        if event.is_terminal() {
            topic.terminal = Some((event, self.clock.epoch_ms()));
            topic.subscribers.clear();
        }
    }

    /// Yields a lazy, finite event stream for `run_id`. If the topic has
    /// already emitted its terminal event within the grace window, the
    /// returned subscription yields exactly that event then closes. Beyond
    /// the grace window (or for a topic that was never registered),
    /// `subscribe` refuses — the caller must fall back to the Run Store.
    pub fn subscribe(&self, run_id: RunId) -> Result<Subscription, SubscribeError> {
        let mut topics = self.topics.lock();
        self.sweep_expired(&mut topics);
        let subscriber_id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);

        let topic = topics.get_mut(&run_id).ok_or(SubscribeError::RunNotLive)?;

        // `sweep_expired` above has already dropped any topic past its grace
        // window, so a topic found here with a terminal event is still
        // within grace.
        if let Some((event, _)) = topic.terminal.clone() {
            let (tx, rx) = mpsc::channel(1);
            // Channel is dropped (tx) right after this send, closing rx once
            // the one buffered terminal event is consumed.
            let _ = tx.try_send(event);
            return Ok(Subscription { run_id, subscriber_id, receiver: rx });
        }

        let (tx, rx) = mpsc::channel(self.queue_capacity);
        topic.subscribers.insert(subscriber_id, tx);
        Ok(Subscription { run_id, subscriber_id, receiver: rx })
    }

    /// Explicit release via `unsubscribe(handle)`. Dropping
    /// the [`Subscription`] has the same effect; this just makes it
    /// immediate instead of waiting for the next failed `try_send`.
    pub fn unsubscribe(&self, subscription: Subscription) {
        if let Some(topic) = self.topics.lock().get_mut(&subscription.run_id) {
            topic.subscribers.remove(&subscription.subscriber_id);
        }
    }

    /// Drops every topic whose terminal grace window has elapsed (§4.1: a
    /// topic is retained only while non-terminal, a subscriber is attached,
    /// or within the grace window). Nothing else ever reclaims a terminated
    /// topic's memory in a long-running process, so this runs opportunistically
    /// under the same lock at the top of every `publish`/`subscribe` rather
    /// than needing a dedicated reaper task.
    fn sweep_expired(&self, topics: &mut HashMap<RunId, Topic>) {
        let now = self.clock.epoch_ms();
        topics.retain(|_, topic| match &topic.terminal {
            Some((_, set_at)) => now.saturating_sub(*set_at) <= self.grace_ms,
            None => true,
        });
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
