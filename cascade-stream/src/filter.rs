// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use async_trait::async_trait;
use cascade_core::{ExecutionContext, Flow, FlowSink, Result};
use core::marker::PhantomData;

/// Extension trait providing the [`filter`](Self::filter) operator.
pub trait FilterExt<T>: Flow<T> + Sized
where
    T: Send + 'static,
{
    /// Forwards only values for which `predicate` returns `true`.
    ///
    /// ```
    /// use cascade_exec::TerminalExt;
    /// use cascade_stream::prelude::*;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> cascade_core::Result<()> {
    /// let even = flow_of([1, 2, 3, 4]).filter(|x| x % 2 == 0);
    /// assert_eq!(even.to_vec().await?, vec![2, 4]);
    /// # Ok(())
    /// # }
    /// ```
    fn filter<P>(self, predicate: P) -> Filter<Self, P, T>
    where
        P: Fn(&T) -> bool + Send + Sync,
    {
        Filter {
            upstream: self,
            predicate,
            _marker: PhantomData,
        }
    }
}

impl<T, F> FilterExt<T> for F
where
    T: Send + 'static,
    F: Flow<T>,
{
}

pub struct Filter<F, P, T> {
    upstream: F,
    predicate: P,
    _marker: PhantomData<fn(T)>,
}

struct FilterSink<'a, P, T>
where
    T: Send + 'static,
{
    downstream: &'a mut dyn FlowSink<T>,
    predicate: &'a P,
}

#[async_trait]
impl<T, P> FlowSink<T> for FilterSink<'_, P, T>
where
    T: Send + 'static,
    P: Fn(&T) -> bool + Send + Sync,
{
    async fn accept(&mut self, ctx: &ExecutionContext, value: T) -> Result<()> {
        if (self.predicate)(&value) {
            self.downstream.accept(ctx, value).await
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<F, P, T> Flow<T> for Filter<F, P, T>
where
    T: Send + 'static,
    F: Flow<T>,
    P: Fn(&T) -> bool + Send + Sync,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let mut adapted = FilterSink {
            downstream: sink,
            predicate: &self.predicate,
        };
        self.upstream.run(ctx, &mut adapted).await
    }
}
