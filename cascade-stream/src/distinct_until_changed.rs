// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use async_trait::async_trait;
use cascade_core::{ExecutionContext, Flow, FlowSink, Result};
use core::marker::PhantomData;

/// Extension trait providing the [`distinct_until_changed`](Self::distinct_until_changed) operator.
pub trait DistinctUntilChangedExt<T>: Flow<T> + Sized
where
    T: Clone + PartialEq + Send + 'static,
{
    /// Drops values equal to the one forwarded just before them.
    ///
    /// ```
    /// use cascade_exec::TerminalExt;
    /// use cascade_stream::prelude::*;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> cascade_core::Result<()> {
    /// let changes = flow_of([1, 1, 2, 2, 1]).distinct_until_changed();
    /// assert_eq!(changes.to_vec().await?, vec![1, 2, 1]);
    /// # Ok(())
    /// # }
    /// ```
    fn distinct_until_changed(self) -> DistinctUntilChanged<Self, T> {
        DistinctUntilChanged {
            upstream: self,
            _marker: PhantomData,
        }
    }
}

impl<T, F> DistinctUntilChangedExt<T> for F
where
    T: Clone + PartialEq + Send + 'static,
    F: Flow<T>,
{
}

pub struct DistinctUntilChanged<F, T> {
    upstream: F,
    _marker: PhantomData<fn(T)>,
}

struct DistinctSink<'a, T>
where
    T: Send + 'static,
{
    downstream: &'a mut dyn FlowSink<T>,
    last: Option<T>,
}

#[async_trait]
impl<T> FlowSink<T> for DistinctSink<'_, T>
where
    T: Clone + PartialEq + Send + 'static,
{
    async fn accept(&mut self, ctx: &ExecutionContext, value: T) -> Result<()> {
        if self.last.as_ref() == Some(&value) {
            return Ok(());
        }
        self.last = Some(value.clone());
        self.downstream.accept(ctx, value).await
    }
}

#[async_trait]
impl<F, T> Flow<T> for DistinctUntilChanged<F, T>
where
    T: Clone + PartialEq + Send + 'static,
    F: Flow<T>,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let mut adapted = DistinctSink {
            downstream: sink,
            last: None,
        };
        self.upstream.run(ctx, &mut adapted).await
    }
}
