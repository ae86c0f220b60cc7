// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::util::ChannelSink;
use async_trait::async_trait;
use cascade_core::{CascadeError, ExecutionContext, Flow, FlowSink, Result};
use core::marker::PhantomData;
use futures::future::try_join;
use tokio::sync::mpsc;

/// Extension trait providing the [`buffer`](Self::buffer) operator.
pub trait BufferExt<T>: Flow<T> + Sized
where
    T: Send + 'static,
{
    /// Lets the upstream run up to `capacity` values ahead of the downstream.
    ///
    /// Both sides stay on the current task; the upstream suspends when the
    /// queue is full. An upstream failure ends the run immediately, dropping
    /// whatever was still queued.
    ///
    /// ```
    /// use cascade_exec::TerminalExt;
    /// use cascade_stream::prelude::*;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> cascade_core::Result<()> {
    /// let decoupled = flow_of([1, 2, 3]).buffer(2);
    /// assert_eq!(decoupled.to_vec().await?, vec![1, 2, 3]);
    /// # Ok(())
    /// # }
    /// ```
    fn buffer(self, capacity: usize) -> Buffer<Self, T> {
        Buffer {
            upstream: self,
            capacity: capacity.max(1),
            _marker: PhantomData,
        }
    }
}

impl<T, F> BufferExt<T> for F
where
    T: Send + 'static,
    F: Flow<T>,
{
}

pub struct Buffer<F, T> {
    upstream: F,
    capacity: usize,
    _marker: PhantomData<fn() -> T>,
}

#[async_trait]
impl<F, T> Flow<T> for Buffer<F, T>
where
    T: Send + 'static,
    F: Flow<T>,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let (tx, mut rx) = mpsc::channel(self.capacity);

        let producer = async move {
            let mut queue = ChannelSink::new(tx);
            self.upstream.run(ctx, &mut queue).await
        };
        let consumer = async {
            while let Some(value) = rx.recv().await {
                sink.accept(ctx, value).await?;
            }
            Ok::<_, CascadeError>(())
        };

        try_join(producer, consumer).await.map(|_| ())
    }
}
