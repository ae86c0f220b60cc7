// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Upstream-only context override.
//!
//! [`flow_on`](FlowOnExt::flow_on) runs its upstream with
//! `ctx.merged(&overlay)` while its downstream sink keeps receiving the
//! caller's context. When the overlay asks for [`Worker::Spawned`], the
//! upstream is moved onto a spawned task that feeds a bounded queue; this is
//! the only way production changes worker.
//!
//! A spawned upstream is dropped on the consumer's side as soon as the run
//! fails or is dropped, so its `on_completion` hooks and `await_close`
//! callbacks have run before the failure is returned or the drop finishes.

use crate::util::ChannelSink;
use async_trait::async_trait;
use cascade_core::{
    CascadeError, CascadeTask, ExecutionContext, Flow, FlowSink, Result, Worker,
    DEFAULT_BUFFER_CAPACITY,
};
use core::future::Future;
use core::marker::PhantomData;
use core::task::{Context, Poll};
use futures::future::{poll_fn, BoxFuture};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Extension trait providing the [`flow_on`](Self::flow_on) operator.
pub trait FlowOnExt<T>: Flow<T> + Sized + 'static
where
    T: Send + 'static,
{
    /// Runs the upstream under `overlay` merged into the caller's context.
    ///
    /// ```
    /// use cascade_core::{ExecutionContext, Worker};
    /// use cascade_exec::TerminalExt;
    /// use cascade_stream::prelude::*;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> cascade_core::Result<()> {
    /// let io = ExecutionContext::named("io").with_worker(Worker::Spawned);
    /// let offloaded = flow_of([1, 2, 3]).flow_on(io);
    ///
    /// assert_eq!(offloaded.to_vec().await?, vec![1, 2, 3]);
    /// # Ok(())
    /// # }
    /// ```
    fn flow_on(self, overlay: ExecutionContext) -> FlowOn<Self, T> {
        FlowOn {
            upstream: Arc::new(self),
            overlay,
            capacity: DEFAULT_BUFFER_CAPACITY,
            _marker: PhantomData,
        }
    }
}

impl<T, F> FlowOnExt<T> for F
where
    T: Send + 'static,
    F: Flow<T> + 'static,
{
}

pub struct FlowOn<F, T> {
    upstream: Arc<F>,
    overlay: ExecutionContext,
    capacity: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<F, T> FlowOn<F, T> {
    /// Queue capacity used when the upstream runs on a spawned worker.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }
}

/// Hands values downstream under the caller's context.
struct RestoreContextSink<'a, T>
where
    T: Send + 'static,
{
    downstream: &'a mut dyn FlowSink<T>,
    ctx: &'a ExecutionContext,
}

#[async_trait]
impl<T> FlowSink<T> for RestoreContextSink<'_, T>
where
    T: Send + 'static,
{
    async fn accept(&mut self, _upstream_ctx: &ExecutionContext, value: T) -> Result<()> {
        self.downstream.accept(self.ctx, value).await
    }
}

#[async_trait]
impl<F, T> Flow<T> for FlowOn<F, T>
where
    T: Send + 'static,
    F: Flow<T> + 'static,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let upstream_ctx = ctx.merged(&self.overlay);

        if self.overlay.worker() != Worker::Spawned {
            let mut restore = RestoreContextSink {
                downstream: sink,
                ctx,
            };
            return self.upstream.run(&upstream_ctx, &mut restore).await;
        }

        let flow = Arc::clone(&self.upstream);
        let (tx, mut rx) = mpsc::channel(self.capacity);
        let run: BoxFuture<'static, Result<()>> = Box::pin(async move {
            let mut queue = ChannelSink::new(tx);
            flow.run(&upstream_ctx, &mut queue).await
        });
        let slot: RunSlot = Arc::new(Mutex::new(Some(run)));
        let _stop = StopOnDrop(Arc::clone(&slot));
        let worker = CascadeTask::spawn(move |_| poll_fn(move |cx| poll_slot(&slot, cx)));

        while let Some(value) = rx.recv().await {
            sink.accept(ctx, value).await?;
        }

        match worker.join().await? {
            Some(result) => result,
            None => Err(CascadeError::cancelled("flow_on worker cancelled")),
        }
    }
}

/// Upstream run shared between the worker that polls it and the consumer
/// that may drop it.
type RunSlot = Arc<Mutex<Option<BoxFuture<'static, Result<()>>>>>;

fn poll_slot(slot: &RunSlot, cx: &mut Context<'_>) -> Poll<Result<()>> {
    let mut run = slot.lock();
    match run.as_mut() {
        Some(future) => {
            let polled = future.as_mut().poll(cx);
            if polled.is_ready() {
                *run = None;
            }
            polled
        }
        None => Poll::Ready(Err(CascadeError::cancelled("flow_on run stopped"))),
    }
}

/// Drops a still-running upstream on the consumer's thread, so its
/// completion hooks have run by the time the consumer's run is gone.
struct StopOnDrop(RunSlot);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        let run = self.0.lock().take();
        drop(run);
    }
}
