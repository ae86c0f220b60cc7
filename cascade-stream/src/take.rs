// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Early termination after a fixed number of values.
//!
//! Once `n` values have been forwarded, [`take`](TakeExt::take) returns an
//! abort signal from its sink. The producer stops, its completion hooks see a
//! cancellation, and the operator turns the signal back into normal completion.

use async_trait::async_trait;
use cascade_core::{AbortOwner, ExecutionContext, Flow, FlowSink, Result};
use core::marker::PhantomData;

/// Extension trait providing the [`take`](Self::take) operator.
pub trait TakeExt<T>: Flow<T> + Sized
where
    T: Send + 'static,
{
    /// Forwards the first `count` values, then stops the upstream.
    ///
    /// `take(0)` completes without running the upstream at all.
    ///
    /// ```
    /// use cascade_exec::TerminalExt;
    /// use cascade_stream::prelude::*;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> cascade_core::Result<()> {
    /// let first_two = flow_of([1, 2, 3]).take(2);
    /// assert_eq!(first_two.to_vec().await?, vec![1, 2]);
    /// # Ok(())
    /// # }
    /// ```
    fn take(self, count: usize) -> Take<Self, T> {
        Take {
            upstream: self,
            count,
            _marker: PhantomData,
        }
    }
}

impl<T, F> TakeExt<T> for F
where
    T: Send + 'static,
    F: Flow<T>,
{
}

pub struct Take<F, T> {
    upstream: F,
    count: usize,
    _marker: PhantomData<fn(T)>,
}

struct TakeSink<'a, T>
where
    T: Send + 'static,
{
    downstream: &'a mut dyn FlowSink<T>,
    remaining: usize,
    owner: AbortOwner,
}

#[async_trait]
impl<T> FlowSink<T> for TakeSink<'_, T>
where
    T: Send + 'static,
{
    async fn accept(&mut self, ctx: &ExecutionContext, value: T) -> Result<()> {
        if self.remaining == 0 {
            return Err(self.owner.signal());
        }
        self.downstream.accept(ctx, value).await?;
        self.remaining -= 1;
        if self.remaining == 0 {
            Err(self.owner.signal())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<F, T> Flow<T> for Take<F, T>
where
    T: Send + 'static,
    F: Flow<T>,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        if self.count == 0 {
            return Ok(());
        }
        let owner = AbortOwner::new();
        let mut adapted = TakeSink {
            downstream: sink,
            remaining: self.count,
            owner,
        };
        owner.absorb(self.upstream.run(ctx, &mut adapted).await)
    }
}
