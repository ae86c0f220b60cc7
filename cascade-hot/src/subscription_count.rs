// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Observable number of live subscriptions of a hot object.

use async_trait::async_trait;
use cascade_core::{ExecutionContext, Flow, FlowSink, Result};
use event_listener::Event;
use parking_lot::Mutex;
use std::sync::Arc;

/// Current subscriber count plus change notification.
///
/// Clones observe the same counter. As a [`Flow`] it emits the current value
/// and then every change it observes; bursts of changes may be conflated.
#[derive(Clone, Debug, Default)]
pub struct SubscriptionCount {
    inner: Arc<CountInner>,
}

#[derive(Debug, Default)]
struct CountInner {
    state: Mutex<CountSnapshot>,
    changed: Event,
}

/// Count together with the number of attaches ever made.
///
/// The attach total lets an observer notice a subscriber that came and went
/// between two looks at the count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct CountSnapshot {
    pub(crate) value: usize,
    pub(crate) attaches: u64,
}

impl CountSnapshot {
    /// Returns `true` if a subscriber attached since `earlier` and is gone again.
    pub(crate) const fn missed_attach(self, earlier: Self) -> bool {
        self.value == 0 && self.attaches != earlier.attaches
    }
}

impl SubscriptionCount {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn increment(&self) {
        {
            let mut state = self.inner.state.lock();
            state.value += 1;
            state.attaches += 1;
        }
        self.inner.changed.notify(usize::MAX);
    }

    pub(crate) fn decrement(&self) {
        self.inner.state.lock().value -= 1;
        self.inner.changed.notify(usize::MAX);
    }

    pub fn get(&self) -> usize {
        self.inner.state.lock().value
    }

    pub(crate) fn snapshot(&self) -> CountSnapshot {
        *self.inner.state.lock()
    }

    /// Waits until the count differs from `last` and returns the new value.
    pub async fn changed(&self, last: usize) -> usize {
        loop {
            let current = self.get();
            if current != last {
                return current;
            }

            let listener = self.inner.changed.listen();
            let current = self.get();
            if current != last {
                return current;
            }
            listener.await;
        }
    }

    /// Waits for any attach or detach after `last`, including ones that
    /// cancelled each other out.
    pub(crate) async fn transition(&self, last: CountSnapshot) -> CountSnapshot {
        loop {
            let current = self.snapshot();
            if current != last {
                return current;
            }

            let listener = self.inner.changed.listen();
            let current = self.snapshot();
            if current != last {
                return current;
            }
            listener.await;
        }
    }

    /// Waits until `predicate` holds for the count and returns that value.
    pub async fn wait_for(&self, predicate: impl Fn(usize) -> bool + Send) -> usize {
        let mut current = self.get();
        while !predicate(current) {
            current = self.changed(current).await;
        }
        current
    }
}

#[async_trait]
impl Flow<usize> for SubscriptionCount {
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<usize>) -> Result<()> {
        let mut last = self.get();
        sink.accept(ctx, last).await?;
        loop {
            last = self.changed(last).await;
            sink.accept(ctx, last).await?;
        }
    }
}
