// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use async_trait::async_trait;
use cascade_core::{AbortOwner, ExecutionContext, Flow, FlowSink, Result};
use core::marker::PhantomData;

/// Extension trait providing the [`take_while`](Self::take_while) operator.
pub trait TakeWhileExt<T>: Flow<T> + Sized
where
    T: Send + 'static,
{
    /// Forwards values while `predicate` holds; the first failing value is
    /// discarded and the upstream is stopped. Downstream sees normal completion.
    ///
    /// ```
    /// use cascade_exec::TerminalExt;
    /// use cascade_stream::prelude::*;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> cascade_core::Result<()> {
    /// let small = flow_of([1, 2, 10, 3]).take_while(|x| *x < 5);
    /// assert_eq!(small.to_vec().await?, vec![1, 2]);
    /// # Ok(())
    /// # }
    /// ```
    fn take_while<P>(self, predicate: P) -> TakeWhile<Self, P, T>
    where
        P: Fn(&T) -> bool + Send + Sync,
    {
        TakeWhile {
            upstream: self,
            predicate,
            _marker: PhantomData,
        }
    }
}

impl<T, F> TakeWhileExt<T> for F
where
    T: Send + 'static,
    F: Flow<T>,
{
}

pub struct TakeWhile<F, P, T> {
    upstream: F,
    predicate: P,
    _marker: PhantomData<fn(T)>,
}

struct TakeWhileSink<'a, P, T>
where
    T: Send + 'static,
{
    downstream: &'a mut dyn FlowSink<T>,
    predicate: &'a P,
    owner: AbortOwner,
}

#[async_trait]
impl<T, P> FlowSink<T> for TakeWhileSink<'_, P, T>
where
    T: Send + 'static,
    P: Fn(&T) -> bool + Send + Sync,
{
    async fn accept(&mut self, ctx: &ExecutionContext, value: T) -> Result<()> {
        if (self.predicate)(&value) {
            self.downstream.accept(ctx, value).await
        } else {
            Err(self.owner.signal())
        }
    }
}

#[async_trait]
impl<F, P, T> Flow<T> for TakeWhile<F, P, T>
where
    T: Send + 'static,
    F: Flow<T>,
    P: Fn(&T) -> bool + Send + Sync,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let owner = AbortOwner::new();
        let mut adapted = TakeWhileSink {
            downstream: sink,
            predicate: &self.predicate,
            owner,
        };
        owner.absorb(self.upstream.run(ctx, &mut adapted).await)
    }
}
