// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Cold flow sources.
//!
//! Every source re-creates its production state on each `run`: a literal
//! source replays its values, a stream or future factory is invoked again.
//!
//! ```
//! use cascade_exec::TerminalExt;
//! use cascade_stream::builders::{flow_fn, flow_of};
//! use cascade_stream::try_stream;
//!
//! # #[tokio::main]
//! # async fn main() -> cascade_core::Result<()> {
//! let literal = flow_of([1, 2, 3]);
//! assert_eq!(literal.to_vec().await?, vec![1, 2, 3]);
//! assert_eq!(literal.to_vec().await?, vec![1, 2, 3]);
//!
//! let generated = flow_fn(|| {
//!     try_stream! {
//!         for n in 0..3u32 {
//!             yield n * 10;
//!         }
//!     }
//! });
//! assert_eq!(generated.to_vec().await?, vec![0, 10, 20]);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use cascade_core::{ExecutionContext, Flow, FlowSink, Result};
use core::future::Future;
use core::marker::PhantomData;
use futures::{pin_mut, Stream, StreamExt};

/// Source that replays a cloneable iterable on every run.
#[derive(Clone, Debug)]
pub struct FromIter<I> {
    iter: I,
}

#[async_trait]
impl<I> Flow<I::Item> for FromIter<I>
where
    I: IntoIterator + Clone + Send + Sync,
    I::IntoIter: Send,
    I::Item: Send + 'static,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<I::Item>) -> Result<()> {
        for value in self.iter.clone() {
            sink.accept(ctx, value).await?;
        }
        Ok(())
    }
}

/// Finite literal source.
pub fn flow_of<T, const N: usize>(values: [T; N]) -> FromIter<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    FromIter {
        iter: Vec::from(values),
    }
}

/// Source over any cloneable iterable; the iterable is cloned per run.
pub fn from_iter<I>(iter: I) -> FromIter<I>
where
    I: IntoIterator + Clone + Send + Sync,
    I::IntoIter: Send,
    I::Item: Send + 'static,
{
    FromIter { iter }
}

/// Source that drains a fresh `futures::Stream` on every run.
pub struct FromStream<F> {
    factory: F,
}

#[async_trait]
impl<T, F, S> Flow<T> for FromStream<F>
where
    T: Send + 'static,
    F: Fn() -> S + Send + Sync,
    S: Stream<Item = T> + Send,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let stream = (self.factory)();
        pin_mut!(stream);
        while let Some(value) = stream.next().await {
            sink.accept(ctx, value).await?;
        }
        Ok(())
    }
}

pub fn from_stream<T, F, S>(factory: F) -> FromStream<F>
where
    T: Send + 'static,
    F: Fn() -> S + Send + Sync,
    S: Stream<Item = T> + Send,
{
    FromStream { factory }
}

/// Source whose body is a fallible generator, usually written with
/// [`try_stream!`](crate::try_stream).
///
/// The first `Err` item ends the run with that error.
pub struct FlowFn<F> {
    factory: F,
}

#[async_trait]
impl<T, F, S> Flow<T> for FlowFn<F>
where
    T: Send + 'static,
    F: Fn() -> S + Send + Sync,
    S: Stream<Item = Result<T>> + Send,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let stream = (self.factory)();
        pin_mut!(stream);
        while let Some(item) = stream.next().await {
            sink.accept(ctx, item?).await?;
        }
        Ok(())
    }
}

pub fn flow_fn<T, F, S>(factory: F) -> FlowFn<F>
where
    T: Send + 'static,
    F: Fn() -> S + Send + Sync,
    S: Stream<Item = Result<T>> + Send,
{
    FlowFn { factory }
}

/// Single deferred computation, evaluated again on every run.
pub struct FromFuture<F> {
    factory: F,
}

#[async_trait]
impl<T, F, Fut> Flow<T> for FromFuture<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T>> + Send,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let value = (self.factory)().await?;
        sink.accept(ctx, value).await
    }
}

pub fn from_future<T, F, Fut>(factory: F) -> FromFuture<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T>> + Send,
{
    FromFuture { factory }
}

/// Completes immediately without values.
#[derive(Debug)]
pub struct Empty<T> {
    _marker: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T> Flow<T> for Empty<T>
where
    T: Send + 'static,
{
    async fn run(&self, _ctx: &ExecutionContext, _sink: &mut dyn FlowSink<T>) -> Result<()> {
        Ok(())
    }
}

pub fn empty<T: Send + 'static>() -> Empty<T> {
    Empty {
        _marker: PhantomData,
    }
}

/// Never emits and never completes; ends only when its run is dropped.
#[derive(Debug)]
pub struct Never<T> {
    _marker: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T> Flow<T> for Never<T>
where
    T: Send + 'static,
{
    async fn run(&self, _ctx: &ExecutionContext, _sink: &mut dyn FlowSink<T>) -> Result<()> {
        futures::future::pending::<()>().await;
        Ok(())
    }
}

pub fn never<T: Send + 'static>() -> Never<T> {
    Never {
        _marker: PhantomData,
    }
}
