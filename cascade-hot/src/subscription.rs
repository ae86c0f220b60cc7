// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::broadcast::Shared;
use async_trait::async_trait;
use cascade_core::{ExecutionContext, Flow, FlowSink, Result};
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use event_listener::EventListener;
use futures::Stream;
use std::sync::Arc;

/// One subscriber's queue on a [`Broadcast`](crate::Broadcast).
///
/// Dropping (or [`detach`](Self::detach)ing) removes the queue, decrements
/// the subscription count and wakes emitters waiting for queue space. It
/// never affects production.
pub struct Subscription<T> {
    id: u64,
    shared: Arc<Shared<T>>,
    listener: Option<EventListener>,
}

impl<T: Clone + Send + 'static> Subscription<T> {
    pub(crate) fn new(id: u64, shared: Arc<Shared<T>>) -> Self {
        Self {
            id,
            shared,
            listener: None,
        }
    }

    /// Takes the next queued value without waiting.
    pub fn try_next(&self) -> Option<T> {
        let value = self
            .shared
            .state
            .lock()
            .queues
            .get_mut(&self.id)
            .and_then(|queue| queue.pop_front());

        if value.is_some() && self.shared.config.capacity.is_some() {
            self.shared.space.notify(usize::MAX);
        }
        value
    }

    /// Waits for the next value. Hot sources never end, so this only
    /// resolves with a value.
    pub async fn next(&self) -> T {
        loop {
            if let Some(value) = self.try_next() {
                return value;
            }

            let listener = self.shared.data.listen();
            if let Some(value) = self.try_next() {
                return value;
            }
            listener.await;
        }
    }

    /// Number of values waiting in this subscription's queue.
    pub fn pending(&self) -> usize {
        self.shared
            .state
            .lock()
            .queues
            .get(&self.id)
            .map_or(0, |queue| queue.len())
    }

    /// Same as dropping the subscription.
    pub fn detach(self) {
        drop(self);
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        let removed = self.shared.state.lock().queues.remove(&self.id).is_some();
        if removed {
            self.shared.count.decrement();
            self.shared.space.notify(usize::MAX);
            debug!("broadcast: subscription {} detached", self.id);
        }
    }
}

impl<T: Clone + Send + 'static> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        loop {
            if let Some(value) = self.try_next() {
                self.listener = None;
                return Poll::Ready(Some(value));
            }

            match self.listener.as_mut() {
                Some(listener) => {
                    if Pin::new(listener).poll(cx).is_pending() {
                        return Poll::Pending;
                    }
                    self.listener = None;
                }
                None => self.listener = Some(self.shared.data.listen()),
            }
        }
    }
}

/// Drains this subscription into `sink` until the sink fails or the run is
/// dropped. Concurrent runs on one subscription split its values.
#[async_trait]
impl<T> Flow<T> for Subscription<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        loop {
            let value = self.next().await;
            sink.accept(ctx, value).await?;
        }
    }
}
