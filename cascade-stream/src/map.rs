// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Value transformation: [`map`](MapExt::map) and [`map_async`](MapExt::map_async).
//!
//! ```
//! use cascade_exec::TerminalExt;
//! use cascade_stream::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> cascade_core::Result<()> {
//! let squares = flow_of([1, 2, 3, 4]).map(|x| x * x);
//! assert_eq!(squares.to_vec().await?, vec![1, 4, 9, 16]);
//!
//! let parsed = flow_of(["1", "2"]).map_async(|s| async move {
//!     s.parse::<i32>()
//!         .map_err(|e| cascade_core::CascadeError::stream_error(e.to_string()))
//! });
//! assert_eq!(parsed.to_vec().await?, vec![1, 2]);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use cascade_core::{ExecutionContext, Flow, FlowSink, Result};
use core::future::Future;
use core::marker::PhantomData;

/// Extension trait providing [`map`](Self::map) and [`map_async`](Self::map_async).
pub trait MapExt<T>: Flow<T> + Sized
where
    T: Send + 'static,
{
    /// Transforms each value with a synchronous function.
    fn map<U, M>(self, f: M) -> Map<Self, M, T, U>
    where
        U: Send + 'static,
        M: Fn(T) -> U + Send + Sync,
    {
        Map {
            upstream: self,
            f,
            _marker: PhantomData,
        }
    }

    /// Transforms each value with a function that may suspend and fail.
    ///
    /// An error returned by `f` becomes the error of the run.
    fn map_async<U, M, Fut>(self, f: M) -> MapAsync<Self, M, T, U>
    where
        U: Send + 'static,
        M: Fn(T) -> Fut + Send + Sync,
        Fut: Future<Output = Result<U>> + Send,
    {
        MapAsync {
            upstream: self,
            f,
            _marker: PhantomData,
        }
    }
}

impl<T, F> MapExt<T> for F
where
    T: Send + 'static,
    F: Flow<T>,
{
}

pub struct Map<F, M, T, U> {
    upstream: F,
    f: M,
    _marker: PhantomData<fn(T) -> U>,
}

struct MapSink<'a, M, U>
where
    U: Send + 'static,
{
    downstream: &'a mut dyn FlowSink<U>,
    f: &'a M,
}

#[async_trait]
impl<T, U, M> FlowSink<T> for MapSink<'_, M, U>
where
    T: Send + 'static,
    U: Send + 'static,
    M: Fn(T) -> U + Send + Sync,
{
    async fn accept(&mut self, ctx: &ExecutionContext, value: T) -> Result<()> {
        let mapped = (self.f)(value);
        self.downstream.accept(ctx, mapped).await
    }
}

#[async_trait]
impl<F, M, T, U> Flow<U> for Map<F, M, T, U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Flow<T>,
    M: Fn(T) -> U + Send + Sync,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<U>) -> Result<()> {
        let mut adapted = MapSink {
            downstream: sink,
            f: &self.f,
        };
        self.upstream.run(ctx, &mut adapted).await
    }
}

pub struct MapAsync<F, M, T, U> {
    upstream: F,
    f: M,
    _marker: PhantomData<fn(T) -> U>,
}

struct MapAsyncSink<'a, M, U>
where
    U: Send + 'static,
{
    downstream: &'a mut dyn FlowSink<U>,
    f: &'a M,
}

#[async_trait]
impl<T, U, M, Fut> FlowSink<T> for MapAsyncSink<'_, M, U>
where
    T: Send + 'static,
    U: Send + 'static,
    M: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<U>> + Send,
{
    async fn accept(&mut self, ctx: &ExecutionContext, value: T) -> Result<()> {
        let mapped = (self.f)(value).await?;
        self.downstream.accept(ctx, mapped).await
    }
}

#[async_trait]
impl<F, M, T, U, Fut> Flow<U> for MapAsync<F, M, T, U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Flow<T>,
    M: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<U>> + Send,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<U>) -> Result<()> {
        let mut adapted = MapAsyncSink {
            downstream: sink,
            f: &self.f,
        };
        self.upstream.run(ctx, &mut adapted).await
    }
}
