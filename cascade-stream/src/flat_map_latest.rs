// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Switching to the latest inner flow.
//!
//! Each upstream value bumps a generation counter and replaces the running
//! inner flow, which is dropped (and thereby cancelled). Inner values are
//! tagged with their generation; anything from an outdated generation that is
//! still queued is discarded before it reaches the downstream sink.

use async_trait::async_trait;
use cascade_core::{CascadeError, ExecutionContext, Flow, FlowSink, Result};
use core::marker::PhantomData;
use core::sync::atomic::{AtomicU64, Ordering};
use futures::future::try_join3;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::mpsc;

/// Extension trait providing the [`flat_map_latest`](Self::flat_map_latest) operator.
pub trait FlatMapLatestExt<T>: Flow<T> + Sized
where
    T: Send + 'static,
{
    /// Maps each value to an inner flow, cancelling the previous inner flow
    /// whenever a new upstream value arrives.
    ///
    /// ```
    /// use cascade_exec::TerminalExt;
    /// use cascade_stream::prelude::*;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> cascade_core::Result<()> {
    /// let latest = flow_of([1, 2, 3]).flat_map_latest(|n| flow_of([n * 100]));
    ///
    /// let values = latest.to_vec().await?;
    /// assert_eq!(values.last(), Some(&300));
    /// # Ok(())
    /// # }
    /// ```
    fn flat_map_latest<U, G, M>(self, f: M) -> FlatMapLatest<Self, M, T, U>
    where
        U: Send + 'static,
        G: Flow<U>,
        M: Fn(T) -> G + Send + Sync,
    {
        FlatMapLatest {
            upstream: self,
            f,
            _marker: PhantomData,
        }
    }
}

impl<T, F> FlatMapLatestExt<T> for F
where
    T: Send + 'static,
    F: Flow<T>,
{
}

pub struct FlatMapLatest<F, M, T, U> {
    upstream: F,
    f: M,
    _marker: PhantomData<fn(T) -> U>,
}

struct SwitchSink<'a, M, G, U> {
    f: &'a M,
    generation: &'a AtomicU64,
    jobs: mpsc::Sender<(u64, G)>,
    _marker: PhantomData<fn() -> U>,
}

#[async_trait]
impl<T, U, G, M> FlowSink<T> for SwitchSink<'_, M, G, U>
where
    T: Send + 'static,
    U: Send + 'static,
    G: Flow<U>,
    M: Fn(T) -> G + Send + Sync,
{
    async fn accept(&mut self, _ctx: &ExecutionContext, value: T) -> Result<()> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let inner = (self.f)(value);
        self.jobs
            .send((generation, inner))
            .await
            .map_err(|_| CascadeError::cancelled("flat_map_latest runner stopped"))
    }
}

struct GenerationSink<U> {
    tx: mpsc::Sender<(u64, U)>,
    generation: u64,
}

#[async_trait]
impl<U> FlowSink<U> for GenerationSink<U>
where
    U: Send + 'static,
{
    async fn accept(&mut self, _ctx: &ExecutionContext, value: U) -> Result<()> {
        self.tx
            .send((self.generation, value))
            .await
            .map_err(|_| CascadeError::cancelled("flat_map_latest consumer stopped"))
    }
}

async fn drive_inner<U, G>(
    inner: G,
    generation: u64,
    tx: mpsc::Sender<(u64, U)>,
    ctx: &ExecutionContext,
) -> Result<()>
where
    U: Send + 'static,
    G: Flow<U>,
{
    let mut inner_sink = GenerationSink { tx, generation };
    inner.run(ctx, &mut inner_sink).await
}

#[async_trait]
impl<F, M, T, U, G> Flow<U> for FlatMapLatest<F, M, T, U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Flow<T>,
    G: Flow<U>,
    M: Fn(T) -> G + Send + Sync,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<U>) -> Result<()> {
        let generation = AtomicU64::new(0);
        let (job_tx, mut job_rx) = mpsc::channel(1);
        let (out_tx, mut out_rx) = mpsc::channel::<(u64, U)>(1);

        let launcher = async {
            let mut switch = SwitchSink {
                f: &self.f,
                generation: &generation,
                jobs: job_tx,
                _marker: PhantomData,
            };
            self.upstream.run(ctx, &mut switch).await
        };

        let runner = async move {
            // Holds at most one inner run: pushing a new one drops the previous
            let mut current = FuturesUnordered::new();
            let mut upstream_done = false;
            loop {
                tokio::select! {
                    job = job_rx.recv(), if !upstream_done => match job {
                        Some((id, inner)) => {
                            current.clear();
                            current.push(drive_inner(inner, id, out_tx.clone(), ctx));
                        }
                        None => upstream_done = true,
                    },
                    Some(result) = current.next(), if !current.is_empty() => result?,
                    else => break,
                }
            }
            Ok::<_, CascadeError>(())
        };

        let consumer = async {
            while let Some((id, value)) = out_rx.recv().await {
                if id == generation.load(Ordering::Acquire) {
                    sink.accept(ctx, value).await?;
                }
            }
            Ok::<_, CascadeError>(())
        };

        try_join3(launcher, runner, consumer).await.map(|_| ())
    }
}
