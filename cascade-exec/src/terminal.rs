// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Terminal consumption: the operations that actually run a flow.
//!
//! Every method takes `&self`, so the same flow can be consumed again; each
//! call is an independent execution with its own [`ExecutionContext`].

use async_trait::async_trait;
use cascade_core::{AbortOwner, CascadeError, ExecutionContext, Flow, FlowSink, FnSink, Result};
use core::future::Future;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::mpsc;

/// Extension trait providing terminal operations for every [`Flow`].
///
/// # Examples
///
/// ```
/// use cascade_exec::TerminalExt;
/// use cascade_stream::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() -> cascade_core::Result<()> {
/// let numbers = flow_of([1, 2, 3, 4]);
///
/// assert_eq!(numbers.fold(0, |acc, n| acc + n * n).await?, 30);
/// assert_eq!(numbers.fold(1, |acc, n| acc * n * n).await?, 576);
/// assert_eq!(numbers.count().await?, 4);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait TerminalExt<T>: Flow<T> + Sized
where
    T: Send + 'static,
{
    /// Collects every value into a `Vec`.
    ///
    /// # Errors
    /// Returns the first error raised while running the flow.
    async fn to_vec(&self) -> Result<Vec<T>>;

    /// Like [`to_vec`](Self::to_vec), running with the given context.
    ///
    /// # Errors
    /// Returns the first error raised while running the flow.
    async fn to_vec_in(&self, ctx: &ExecutionContext) -> Result<Vec<T>>;

    /// Runs the flow with an accumulating sink and returns the final accumulator.
    ///
    /// # Errors
    /// Returns the first error raised while running the flow.
    async fn fold<A, O>(&self, initial: A, op: O) -> Result<A>
    where
        A: Send + 'static,
        O: Fn(A, T) -> A + Send + Sync;

    /// Folds without an initial value; `None` for an empty flow.
    ///
    /// # Errors
    /// Returns the first error raised while running the flow.
    async fn reduce<O>(&self, op: O) -> Result<Option<T>>
    where
        O: Fn(T, T) -> T + Send + Sync;

    /// Number of values delivered.
    ///
    /// # Errors
    /// Returns the first error raised while running the flow.
    async fn count(&self) -> Result<usize>;

    /// The first value, stopping production right after it.
    ///
    /// Upstream completion hooks observe a cancellation once the value is taken.
    ///
    /// # Errors
    /// Returns an error raised before the first value was produced.
    async fn first(&self) -> Result<Option<T>>;

    /// Runs `handler` for every value, in order.
    ///
    /// A handler error stops production and is returned.
    ///
    /// # Errors
    /// Returns the first error raised by the flow or the handler.
    async fn for_each<H, Fut>(&self, handler: H) -> Result<()>
    where
        H: FnMut(T) -> Fut + Send,
        Fut: Future<Output = Result<()>> + Send;

    /// Like [`for_each`](Self::for_each), running with the given context.
    ///
    /// # Errors
    /// Returns the first error raised by the flow or the handler.
    async fn for_each_in<H, Fut>(&self, ctx: &ExecutionContext, handler: H) -> Result<()>
    where
        H: FnMut(T) -> Fut + Send,
        Fut: Future<Output = Result<()>> + Send;

    /// Runs `handler` for the latest value only.
    ///
    /// A new value cancels the handler still running for the previous one.
    /// Production is never held back by a slow handler. Returns after the
    /// flow completed and the handler for its last value finished.
    ///
    /// # Errors
    /// Returns the first error raised by the flow or by a handler that ran
    /// to completion.
    async fn collect_latest<H, Fut>(&self, handler: H) -> Result<()>
    where
        H: Fn(T) -> Fut + Send + Sync,
        Fut: Future<Output = Result<()>> + Send;
}

struct FoldSink<'a, A, O> {
    acc: Option<A>,
    op: &'a O,
}

#[async_trait]
impl<T, A, O> FlowSink<T> for FoldSink<'_, A, O>
where
    T: Send + 'static,
    A: Send,
    O: Fn(A, T) -> A + Send + Sync,
{
    async fn accept(&mut self, _ctx: &ExecutionContext, value: T) -> Result<()> {
        if let Some(acc) = self.acc.take() {
            self.acc = Some((self.op)(acc, value));
        }
        Ok(())
    }
}

struct ReduceSink<'a, T, O> {
    acc: Option<T>,
    op: &'a O,
}

#[async_trait]
impl<T, O> FlowSink<T> for ReduceSink<'_, T, O>
where
    T: Send + 'static,
    O: Fn(T, T) -> T + Send + Sync,
{
    async fn accept(&mut self, _ctx: &ExecutionContext, value: T) -> Result<()> {
        self.acc = Some(match self.acc.take() {
            Some(acc) => (self.op)(acc, value),
            None => value,
        });
        Ok(())
    }
}

#[derive(Default)]
struct CountSink {
    count: usize,
}

#[async_trait]
impl<T> FlowSink<T> for CountSink
where
    T: Send + 'static,
{
    async fn accept(&mut self, _ctx: &ExecutionContext, _value: T) -> Result<()> {
        self.count += 1;
        Ok(())
    }
}

struct FirstSink<T> {
    slot: Option<T>,
    owner: AbortOwner,
}

#[async_trait]
impl<T> FlowSink<T> for FirstSink<T>
where
    T: Send + 'static,
{
    async fn accept(&mut self, _ctx: &ExecutionContext, value: T) -> Result<()> {
        self.slot = Some(value);
        Err(self.owner.signal())
    }
}

struct LatestSink<T> {
    tx: mpsc::Sender<T>,
}

#[async_trait]
impl<T> FlowSink<T> for LatestSink<T>
where
    T: Send + 'static,
{
    async fn accept(&mut self, _ctx: &ExecutionContext, value: T) -> Result<()> {
        self.tx
            .send(value)
            .await
            .map_err(|_| CascadeError::cancelled("collect_latest handler loop stopped"))
    }
}

#[async_trait]
impl<F, T> TerminalExt<T> for F
where
    F: Flow<T>,
    T: Send + 'static,
{
    async fn to_vec(&self) -> Result<Vec<T>> {
        self.to_vec_in(&ExecutionContext::new()).await
    }

    async fn to_vec_in(&self, ctx: &ExecutionContext) -> Result<Vec<T>> {
        let mut values = Vec::new();
        {
            let mut sink = FnSink::new(|value: T| {
                values.push(value);
                async { Ok::<_, CascadeError>(()) }
            });
            self.run(ctx, &mut sink).await?;
        }
        Ok(values)
    }

    async fn fold<A, O>(&self, initial: A, op: O) -> Result<A>
    where
        A: Send + 'static,
        O: Fn(A, T) -> A + Send + Sync,
    {
        let mut sink = FoldSink {
            acc: Some(initial),
            op: &op,
        };
        self.run(&ExecutionContext::new(), &mut sink).await?;
        sink.acc
            .ok_or_else(|| CascadeError::stream_error("fold accumulator lost"))
    }

    async fn reduce<O>(&self, op: O) -> Result<Option<T>>
    where
        O: Fn(T, T) -> T + Send + Sync,
    {
        let mut sink = ReduceSink { acc: None, op: &op };
        self.run(&ExecutionContext::new(), &mut sink).await?;
        Ok(sink.acc)
    }

    async fn count(&self) -> Result<usize> {
        let mut sink = CountSink::default();
        self.run(&ExecutionContext::new(), &mut sink).await?;
        Ok(sink.count)
    }

    async fn first(&self) -> Result<Option<T>> {
        let owner = AbortOwner::new();
        let mut sink = FirstSink { slot: None, owner };
        owner.absorb(self.run(&ExecutionContext::new(), &mut sink).await)?;
        Ok(sink.slot)
    }

    async fn for_each<H, Fut>(&self, handler: H) -> Result<()>
    where
        H: FnMut(T) -> Fut + Send,
        Fut: Future<Output = Result<()>> + Send,
    {
        self.for_each_in(&ExecutionContext::new(), handler).await
    }

    async fn for_each_in<H, Fut>(&self, ctx: &ExecutionContext, handler: H) -> Result<()>
    where
        H: FnMut(T) -> Fut + Send,
        Fut: Future<Output = Result<()>> + Send,
    {
        let mut sink = FnSink::new(handler);
        self.run(ctx, &mut sink).await
    }

    async fn collect_latest<H, Fut>(&self, handler: H) -> Result<()>
    where
        H: Fn(T) -> Fut + Send + Sync,
        Fut: Future<Output = Result<()>> + Send,
    {
        let ctx = ExecutionContext::new();
        let (tx, mut rx) = mpsc::channel::<T>(1);

        let producer = async {
            let mut sink = LatestSink { tx };
            self.run(&ctx, &mut sink).await
        };

        let consumer = async {
            // At most one handler in flight: pushing a new one drops the old
            let mut current = FuturesUnordered::new();
            let mut upstream_done = false;
            loop {
                tokio::select! {
                    value = rx.recv(), if !upstream_done => match value {
                        Some(value) => {
                            current.clear();
                            current.push(handler(value));
                        }
                        None => upstream_done = true,
                    },
                    Some(result) = current.next(), if !current.is_empty() => result?,
                    else => break,
                }
            }
            Ok::<_, CascadeError>(())
        };

        futures::future::try_join(producer, consumer)
            .await
            .map(|_| ())
    }
}
