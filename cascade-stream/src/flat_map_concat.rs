// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use async_trait::async_trait;
use cascade_core::{ExecutionContext, Flow, FlowSink, Result};
use core::marker::PhantomData;

/// Extension trait providing the [`flat_map_concat`](Self::flat_map_concat) operator.
pub trait FlatMapConcatExt<T>: Flow<T> + Sized
where
    T: Send + 'static,
{
    /// Maps each value to an inner flow and drains it completely before the
    /// next upstream value is requested.
    ///
    /// ```
    /// use cascade_exec::TerminalExt;
    /// use cascade_stream::prelude::*;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> cascade_core::Result<()> {
    /// let expanded = flow_of([1, 2]).flat_map_concat(|n| flow_of([n, n * 10]));
    /// assert_eq!(expanded.to_vec().await?, vec![1, 10, 2, 20]);
    /// # Ok(())
    /// # }
    /// ```
    fn flat_map_concat<U, G, M>(self, f: M) -> FlatMapConcat<Self, M, T, U>
    where
        U: Send + 'static,
        G: Flow<U>,
        M: Fn(T) -> G + Send + Sync,
    {
        FlatMapConcat {
            upstream: self,
            f,
            _marker: PhantomData,
        }
    }
}

impl<T, F> FlatMapConcatExt<T> for F
where
    T: Send + 'static,
    F: Flow<T>,
{
}

pub struct FlatMapConcat<F, M, T, U> {
    upstream: F,
    f: M,
    _marker: PhantomData<fn(T) -> U>,
}

struct ConcatSink<'a, M, U>
where
    U: Send + 'static,
{
    downstream: &'a mut dyn FlowSink<U>,
    f: &'a M,
}

#[async_trait]
impl<T, U, G, M> FlowSink<T> for ConcatSink<'_, M, U>
where
    T: Send + 'static,
    U: Send + 'static,
    G: Flow<U>,
    M: Fn(T) -> G + Send + Sync,
{
    async fn accept(&mut self, ctx: &ExecutionContext, value: T) -> Result<()> {
        let inner = (self.f)(value);
        inner.run(ctx, &mut *self.downstream).await
    }
}

#[async_trait]
impl<F, M, T, U, G> Flow<U> for FlatMapConcat<F, M, T, U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Flow<T>,
    G: Flow<U>,
    M: Fn(T) -> G + Send + Sync,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<U>) -> Result<()> {
        let mut adapted = ConcatSink {
            downstream: sink,
            f: &self.f,
        };
        self.upstream.run(ctx, &mut adapted).await
    }
}
