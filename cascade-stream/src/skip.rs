// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use async_trait::async_trait;
use cascade_core::{ExecutionContext, Flow, FlowSink, Result};
use core::marker::PhantomData;

/// Extension trait providing the [`skip`](Self::skip) operator.
pub trait SkipExt<T>: Flow<T> + Sized
where
    T: Send + 'static,
{
    /// Discards the first `count` values and forwards the rest.
    ///
    /// ```
    /// use cascade_exec::TerminalExt;
    /// use cascade_stream::prelude::*;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> cascade_core::Result<()> {
    /// let tail = flow_of([1, 2, 3, 4]).skip(3);
    /// assert_eq!(tail.to_vec().await?, vec![4]);
    /// # Ok(())
    /// # }
    /// ```
    fn skip(self, count: usize) -> Skip<Self, T> {
        Skip {
            upstream: self,
            count,
            _marker: PhantomData,
        }
    }
}

impl<T, F> SkipExt<T> for F
where
    T: Send + 'static,
    F: Flow<T>,
{
}

pub struct Skip<F, T> {
    upstream: F,
    count: usize,
    _marker: PhantomData<fn(T)>,
}

struct SkipSink<'a, T>
where
    T: Send + 'static,
{
    downstream: &'a mut dyn FlowSink<T>,
    remaining: usize,
}

#[async_trait]
impl<T> FlowSink<T> for SkipSink<'_, T>
where
    T: Send + 'static,
{
    async fn accept(&mut self, ctx: &ExecutionContext, value: T) -> Result<()> {
        if self.remaining > 0 {
            self.remaining -= 1;
            return Ok(());
        }
        self.downstream.accept(ctx, value).await
    }
}

#[async_trait]
impl<F, T> Flow<T> for Skip<F, T>
where
    T: Send + 'static,
    F: Flow<T>,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let mut adapted = SkipSink {
            downstream: sink,
            remaining: self.count,
        };
        self.upstream.run(ctx, &mut adapted).await
    }
}
