// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Bounded concurrent flattening.
//!
//! One run of [`flat_map_merge`](FlatMapMergeExt::flat_map_merge) is three
//! cooperating branches of the same task:
//!
//! - the launcher runs the upstream; each value takes a permit and becomes an
//!   inner flow, so the upstream suspends while every permit is in use
//! - the runner drives the inner flows, each holding its permit until done
//! - the consumer forwards inner values to the downstream sink
//!
//! The first error from any branch drops the other two.

use crate::util::ChannelSink;
use async_trait::async_trait;
use cascade_core::{
    default_concurrency, CascadeError, ExecutionContext, Flow, FlowSink, Result,
};
use core::marker::PhantomData;
use futures::future::try_join3;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::{mpsc, Semaphore, SemaphorePermit};

/// Extension trait providing [`flat_map_merge`](Self::flat_map_merge).
pub trait FlatMapMergeExt<T>: Flow<T> + Sized
where
    T: Send + 'static,
{
    /// Runs up to `concurrency` inner flows at once, forwarding their values
    /// interleaved as they arrive. A `concurrency` of zero is treated as one.
    ///
    /// ```
    /// use cascade_exec::TerminalExt;
    /// use cascade_stream::prelude::*;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> cascade_core::Result<()> {
    /// let expanded = flow_of([1, 2, 3]).flat_map_merge(|n| flow_of([n; 2]), 2);
    ///
    /// let mut values = expanded.to_vec().await?;
    /// values.sort_unstable();
    /// assert_eq!(values, vec![1, 1, 2, 2, 3, 3]);
    /// # Ok(())
    /// # }
    /// ```
    fn flat_map_merge<U, G, M>(self, f: M, concurrency: usize) -> FlatMapMerge<Self, M, T, U>
    where
        U: Send + 'static,
        G: Flow<U>,
        M: Fn(T) -> G + Send + Sync,
    {
        FlatMapMerge {
            upstream: self,
            f,
            concurrency: Some(concurrency),
            _marker: PhantomData,
        }
    }

    /// Like [`flat_map_merge`](Self::flat_map_merge) with the process-wide
    /// default concurrency, resolved when the flow runs.
    fn flat_map_merge_default<U, G, M>(self, f: M) -> FlatMapMerge<Self, M, T, U>
    where
        U: Send + 'static,
        G: Flow<U>,
        M: Fn(T) -> G + Send + Sync,
    {
        FlatMapMerge {
            upstream: self,
            f,
            concurrency: None,
            _marker: PhantomData,
        }
    }
}

impl<T, F> FlatMapMergeExt<T> for F
where
    T: Send + 'static,
    F: Flow<T>,
{
}

pub struct FlatMapMerge<F, M, T, U> {
    upstream: F,
    f: M,
    concurrency: Option<usize>,
    _marker: PhantomData<fn(T) -> U>,
}

impl<F, M, T, U> FlatMapMerge<F, M, T, U> {
    /// Concurrency this flow runs with.
    pub fn concurrency(&self) -> usize {
        self.concurrency
            .unwrap_or_else(default_concurrency)
            .max(1)
    }
}

struct LaunchSink<'a, M, G, U> {
    f: &'a M,
    permits: &'a Semaphore,
    jobs: mpsc::Sender<(G, SemaphorePermit<'a>)>,
    _marker: PhantomData<fn() -> U>,
}

#[async_trait]
impl<T, U, G, M> FlowSink<T> for LaunchSink<'_, M, G, U>
where
    T: Send + 'static,
    U: Send + 'static,
    G: Flow<U>,
    M: Fn(T) -> G + Send + Sync,
{
    async fn accept(&mut self, _ctx: &ExecutionContext, value: T) -> Result<()> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| CascadeError::cancelled("flat_map_merge permits closed"))?;
        let inner = (self.f)(value);
        self.jobs
            .send((inner, permit))
            .await
            .map_err(|_| CascadeError::cancelled("flat_map_merge runner stopped"))
    }
}

async fn drive_inner<U, G>(
    inner: G,
    permit: SemaphorePermit<'_>,
    tx: mpsc::Sender<U>,
    ctx: &ExecutionContext,
) -> Result<()>
where
    U: Send + 'static,
    G: Flow<U>,
{
    let mut inner_sink = ChannelSink::new(tx);
    let result = inner.run(ctx, &mut inner_sink).await;
    drop(permit);
    result
}

#[async_trait]
impl<F, M, T, U, G> Flow<U> for FlatMapMerge<F, M, T, U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Flow<T>,
    G: Flow<U>,
    M: Fn(T) -> G + Send + Sync,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<U>) -> Result<()> {
        let concurrency = self.concurrency();
        let permits = Semaphore::new(concurrency);
        let (job_tx, mut job_rx) = mpsc::channel(1);
        let (out_tx, mut out_rx) = mpsc::channel::<U>(concurrency);

        let launcher = async {
            let mut launch = LaunchSink {
                f: &self.f,
                permits: &permits,
                jobs: job_tx,
                _marker: PhantomData,
            };
            self.upstream.run(ctx, &mut launch).await
        };

        let runner = async move {
            let mut running = FuturesUnordered::new();
            let mut upstream_done = false;
            loop {
                tokio::select! {
                    job = job_rx.recv(), if !upstream_done => match job {
                        Some((inner, permit)) => {
                            running.push(drive_inner(inner, permit, out_tx.clone(), ctx));
                        }
                        None => upstream_done = true,
                    },
                    Some(result) = running.next(), if !running.is_empty() => result?,
                    else => break,
                }
            }
            Ok::<_, CascadeError>(())
        };

        let consumer = async {
            while let Some(value) = out_rx.recv().await {
                sink.accept(ctx, value).await?;
            }
            Ok::<_, CascadeError>(())
        };

        try_join3(launcher, runner, consumer).await.map(|_| ())
    }
}
