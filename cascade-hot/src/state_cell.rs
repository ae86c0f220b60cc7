// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Conflated, observable current value.
//!
//! A [`StateCell`] always holds a value. Watchers receive the current value
//! first and afterwards only the latest one whenever it changes; a slow
//! watcher skips intermediate values instead of accumulating a backlog.
//!
//! ```
//! use cascade_hot::StateCell;
//!
//! let temperature = StateCell::new(20);
//! temperature.set(21);
//! assert!(temperature.compare_and_set(&21, 22));
//! assert!(!temperature.compare_and_set(&21, 23));
//! temperature.update(|t| t + 1);
//! assert_eq!(temperature.get(), 23);
//! ```

use crate::subscription_count::SubscriptionCount;
use async_trait::async_trait;
use cascade_core::{ExecutionContext, Flow, FlowSink, Result};
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use event_listener::{Event, EventListener};
use futures::Stream;
use parking_lot::Mutex;
use std::sync::Arc;

struct CellShared<T> {
    state: Mutex<Versioned<T>>,
    changed: Event,
    count: SubscriptionCount,
}

struct Versioned<T> {
    value: T,
    version: u64,
}

impl<T: PartialEq> Versioned<T> {
    /// Stores `value` and reports whether it differs from the previous one.
    fn replace(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.version += 1;
        true
    }
}

/// Cloneable handle to a mutable current value.
pub struct StateCell<T> {
    shared: Arc<CellShared<T>>,
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> StateCell<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        Self {
            shared: Arc::new(CellShared {
                state: Mutex::new(Versioned {
                    value: initial,
                    version: 0,
                }),
                changed: Event::new(),
                count: SubscriptionCount::new(),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.shared.state.lock().value.clone()
    }

    /// Replaces the value; a no-op when it equals the current one.
    pub fn set(&self, value: T) {
        let changed = self.shared.state.lock().replace(value);
        if changed {
            self.shared.changed.notify(usize::MAX);
        }
    }

    /// Atomically replaces the value if it currently equals `expected`.
    pub fn compare_and_set(&self, expected: &T, new: T) -> bool {
        let mut state = self.shared.state.lock();
        if state.value != *expected {
            return false;
        }
        let changed = state.replace(new);
        drop(state);

        if changed {
            self.shared.changed.notify(usize::MAX);
        }
        true
    }

    /// Atomically replaces the value with `f(current)` and returns the result.
    ///
    /// `f` runs under the cell's lock and must not touch the cell itself.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> T {
        let mut state = self.shared.state.lock();
        let next = f(&state.value);
        let changed = state.replace(next.clone());
        drop(state);

        if changed {
            self.shared.changed.notify(usize::MAX);
        }
        next
    }

    /// Starts observing the cell; the first value is the current one.
    pub fn watch(&self) -> StateSubscription<T> {
        self.shared.count.increment();
        StateSubscription {
            shared: self.shared.clone(),
            last_version: None,
            last_value: None,
            listener: None,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.count.get()
    }

    pub fn subscription_count(&self) -> SubscriptionCount {
        self.shared.count.clone()
    }

    /// A flow that watches the cell on every run. Never completes on its own.
    pub fn as_flow(&self) -> StateCellFlow<T> {
        StateCellFlow { cell: self.clone() }
    }
}

/// Conflating watcher of a [`StateCell`].
pub struct StateSubscription<T> {
    shared: Arc<CellShared<T>>,
    last_version: Option<u64>,
    last_value: Option<T>,
    listener: Option<EventListener>,
}

impl<T> StateSubscription<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Returns the current value if this watcher has not seen it yet.
    ///
    /// A value equal to the last delivered one is skipped even when the
    /// cell went through other values in between.
    pub fn try_next(&mut self) -> Option<T> {
        let state = self.shared.state.lock();
        if self.last_version == Some(state.version) {
            return None;
        }
        self.last_version = Some(state.version);

        if self.last_value.as_ref() == Some(&state.value) {
            return None;
        }
        let value = state.value.clone();
        drop(state);

        self.last_value = Some(value.clone());
        Some(value)
    }

    /// Waits until the cell holds a value this watcher has not delivered.
    pub async fn next(&mut self) -> T {
        futures::future::poll_fn(|cx| self.poll_value(cx)).await
    }

    fn poll_value(&mut self, cx: &mut Context<'_>) -> Poll<T> {
        loop {
            if let Some(value) = self.try_next() {
                self.listener = None;
                return Poll::Ready(value);
            }

            match self.listener.as_mut() {
                Some(listener) => {
                    if Pin::new(listener).poll(cx).is_pending() {
                        return Poll::Pending;
                    }
                    self.listener = None;
                }
                None => self.listener = Some(self.shared.changed.listen()),
            }
        }
    }
}

impl<T> Drop for StateSubscription<T> {
    fn drop(&mut self) {
        self.shared.count.decrement();
    }
}

impl<T> Stream for StateSubscription<T>
where
    T: Clone + PartialEq + Send + Sync + Unpin + 'static,
{
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.poll_value(cx).map(Some)
    }
}

/// Flow view of a [`StateCell`], see [`StateCell::as_flow`].
pub struct StateCellFlow<T> {
    cell: StateCell<T>,
}

impl<T> Clone for StateCellFlow<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

#[async_trait]
impl<T> Flow<T> for StateCellFlow<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let mut watcher = self.cell.watch();
        loop {
            let value = watcher.next().await;
            sink.accept(ctx, value).await?;
        }
    }
}
