// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Hot multi-subscriber broadcast with a replay cache.
//!
//! A [`Broadcast`] delivers every emitted value to every subscription attached
//! at emission time, in emission order. Late subscribers first receive the
//! replay snapshot (the last `replay` values).
//!
//! ```
//! use cascade_hot::{Broadcast, BroadcastConfig};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let prices = Broadcast::new(BroadcastConfig::with_replay(1));
//! prices.emit(101).await;
//! prices.emit(102).await;
//!
//! let late = prices.attach();
//! assert_eq!(late.try_next(), Some(102));
//! # }
//! ```

use crate::subscription::Subscription;
use crate::subscription_count::SubscriptionCount;
use async_trait::async_trait;
use cascade_core::{ExecutionContext, Flow, FlowSink, Result};
use event_listener::Event;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

/// What a bounded subscriber queue does when it is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Overflow {
    /// The emitter waits until every queue has room.
    #[default]
    Suspend,
    /// The oldest queued value of the full subscriber is discarded.
    DropOldest,
    /// The new value is not enqueued for the full subscriber.
    DropLatest,
}

/// Construction parameters of a [`Broadcast`].
///
/// The default keeps no replay and unbounded subscriber queues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// Number of most recent values handed to new subscribers.
    pub replay: usize,
    /// Per-subscriber queue bound; `None` is unbounded.
    pub capacity: Option<usize>,
    pub overflow: Overflow,
}

impl BroadcastConfig {
    #[must_use]
    pub fn with_replay(replay: usize) -> Self {
        Self {
            replay,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    #[must_use]
    pub const fn overflow(mut self, overflow: Overflow) -> Self {
        self.overflow = overflow;
        self
    }
}

pub(crate) struct Shared<T> {
    pub(crate) state: Mutex<State<T>>,
    pub(crate) config: BroadcastConfig,
    pub(crate) count: SubscriptionCount,
    /// Notified after every emission.
    pub(crate) data: Event,
    /// Notified whenever queue space may have been freed.
    pub(crate) space: Event,
}

pub(crate) struct State<T> {
    pub(crate) replay: VecDeque<T>,
    pub(crate) queues: BTreeMap<u64, VecDeque<T>>,
    next_id: u64,
}

enum Admission {
    Enqueued,
    Full,
}

impl<T: Clone> Shared<T> {
    fn is_blocked(&self, state: &State<T>) -> bool {
        match (self.config.overflow, self.config.capacity) {
            (Overflow::Suspend, Some(capacity)) => {
                state.queues.values().any(|queue| queue.len() >= capacity)
            }
            _ => false,
        }
    }

    /// Appends `value` everywhere, or reports that a suspending queue is full.
    fn admit(&self, state: &mut State<T>, value: T) -> Admission {
        if self.is_blocked(state) {
            return Admission::Full;
        }

        for queue in state.queues.values_mut() {
            match (self.config.capacity, self.config.overflow) {
                (Some(capacity), Overflow::DropOldest) if queue.len() >= capacity => {
                    queue.pop_front();
                    queue.push_back(value.clone());
                }
                (Some(capacity), Overflow::DropLatest) if queue.len() >= capacity => {}
                _ => queue.push_back(value.clone()),
            }
        }

        if self.config.replay > 0 {
            if state.replay.len() >= self.config.replay {
                state.replay.pop_front();
            }
            state.replay.push_back(value);
        }

        Admission::Enqueued
    }
}

/// Hot, cloneable broadcast handle.
///
/// All mutation happens under one internal lock, so concurrent emitters are
/// legal and every subscriber observes the same global order.
pub struct Broadcast<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Broadcast<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Default for Broadcast<T> {
    fn default() -> Self {
        Self::new(BroadcastConfig::default())
    }
}

impl<T: Clone + Send + 'static> Broadcast<T> {
    #[must_use]
    pub fn new(config: BroadcastConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    replay: VecDeque::with_capacity(config.replay),
                    queues: BTreeMap::new(),
                    next_id: 0,
                }),
                config,
                count: SubscriptionCount::new(),
                data: Event::new(),
                space: Event::new(),
            }),
        }
    }

    pub fn config(&self) -> BroadcastConfig {
        self.shared.config
    }

    /// Registers a new subscription seeded with the current replay snapshot.
    pub fn attach(&self) -> Subscription<T> {
        let id = {
            let mut state = self.shared.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            let seed = state.replay.iter().cloned().collect();
            state.queues.insert(id, seed);
            self.shared.count.increment();
            id
        };
        debug!("broadcast: subscription {id} attached");
        Subscription::new(id, self.shared.clone())
    }

    /// Delivers `value` to every live subscription and the replay cache.
    ///
    /// Suspends only while a bounded queue is full under [`Overflow::Suspend`].
    pub async fn emit(&self, value: T) {
        loop {
            let listener = {
                let mut state = self.shared.state.lock();
                if !self.shared.is_blocked(&state) {
                    self.shared.admit(&mut state, value);
                    drop(state);
                    self.shared.data.notify(usize::MAX);
                    return;
                }
                // Registered under the lock: a pop that frees space after
                // this point always reaches the listener
                self.shared.space.listen()
            };
            listener.await;
        }
    }

    /// Non-suspending [`emit`](Self::emit).
    ///
    /// Returns `false`, enqueuing nothing anywhere, when a bounded queue is
    /// full under [`Overflow::Suspend`].
    pub fn try_emit(&self, value: T) -> bool {
        let mut state = self.shared.state.lock();
        match self.shared.admit(&mut state, value) {
            Admission::Enqueued => {
                drop(state);
                self.shared.data.notify(usize::MAX);
                true
            }
            Admission::Full => false,
        }
    }

    /// Empties the replay cache; queued values of live subscribers are kept.
    pub fn reset_replay_cache(&self) {
        self.shared.state.lock().replay.clear();
    }

    pub fn replay_cache(&self) -> Vec<T> {
        self.shared.state.lock().replay.iter().cloned().collect()
    }

    pub fn subscription_count(&self) -> SubscriptionCount {
        self.shared.count.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.count.get()
    }

    /// A flow that attaches a fresh subscription on every run.
    ///
    /// The run never completes on its own; it ends when the consumer fails or
    /// the run future is dropped.
    pub fn as_flow(&self) -> BroadcastFlow<T> {
        BroadcastFlow {
            broadcast: self.clone(),
        }
    }
}

/// Flow view of a [`Broadcast`], see [`Broadcast::as_flow`].
pub struct BroadcastFlow<T> {
    broadcast: Broadcast<T>,
}

impl<T> Clone for BroadcastFlow<T> {
    fn clone(&self) -> Self {
        Self {
            broadcast: self.broadcast.clone(),
        }
    }
}

#[async_trait]
impl<T> Flow<T> for BroadcastFlow<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let subscription = self.broadcast.attach();
        subscription.run(ctx, sink).await
    }
}
