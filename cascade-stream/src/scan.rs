// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use async_trait::async_trait;
use cascade_core::{ExecutionContext, Flow, FlowSink, Result};
use core::marker::PhantomData;

/// Extension trait providing the [`scan`](Self::scan) operator.
pub trait ScanExt<T>: Flow<T> + Sized
where
    T: Send + 'static,
{
    /// Emits `initial` as soon as the run starts, then the new accumulator
    /// after every upstream value.
    ///
    /// ```
    /// use cascade_exec::TerminalExt;
    /// use cascade_stream::prelude::*;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> cascade_core::Result<()> {
    /// let running = flow_of([1, 2, 3]).scan(0, |acc, x| acc + x);
    /// assert_eq!(running.to_vec().await?, vec![0, 1, 3, 6]);
    /// # Ok(())
    /// # }
    /// ```
    fn scan<A, O>(self, initial: A, op: O) -> Scan<Self, A, O, T>
    where
        A: Clone + Send + Sync + 'static,
        O: Fn(&A, T) -> A + Send + Sync,
    {
        Scan {
            upstream: self,
            initial,
            op,
            _marker: PhantomData,
        }
    }
}

impl<T, F> ScanExt<T> for F
where
    T: Send + 'static,
    F: Flow<T>,
{
}

pub struct Scan<F, A, O, T> {
    upstream: F,
    initial: A,
    op: O,
    _marker: PhantomData<fn(T)>,
}

struct ScanSink<'a, A, O>
where
    A: Send + 'static,
{
    downstream: &'a mut dyn FlowSink<A>,
    acc: A,
    op: &'a O,
}

#[async_trait]
impl<T, A, O> FlowSink<T> for ScanSink<'_, A, O>
where
    T: Send + 'static,
    A: Clone + Send + Sync + 'static,
    O: Fn(&A, T) -> A + Send + Sync,
{
    async fn accept(&mut self, ctx: &ExecutionContext, value: T) -> Result<()> {
        self.acc = (self.op)(&self.acc, value);
        let emitted = self.acc.clone();
        self.downstream.accept(ctx, emitted).await
    }
}

#[async_trait]
impl<F, A, O, T> Flow<A> for Scan<F, A, O, T>
where
    T: Send + 'static,
    A: Clone + Send + Sync + 'static,
    F: Flow<T>,
    O: Fn(&A, T) -> A + Send + Sync,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<A>) -> Result<()> {
        sink.accept(ctx, self.initial.clone()).await?;
        let mut adapted = ScanSink {
            downstream: sink,
            acc: self.initial.clone(),
            op: &self.op,
        };
        self.upstream.run(ctx, &mut adapted).await
    }
}
