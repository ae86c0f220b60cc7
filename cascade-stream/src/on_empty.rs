// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::util::{emit_all, TrackingSink};
use async_trait::async_trait;
use cascade_core::{ExecutionContext, Flow, FlowSink, Result};
use core::future::Future;
use core::marker::PhantomData;

/// Extension trait providing the [`on_empty`](Self::on_empty) operator.
pub trait OnEmptyExt<T>: Flow<T> + Sized
where
    T: Send + 'static,
{
    /// Runs `action` when the upstream completes normally without having
    /// delivered a single value; the values it returns are forwarded instead.
    ///
    /// ```
    /// use cascade_exec::TerminalExt;
    /// use cascade_stream::prelude::*;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> cascade_core::Result<()> {
    /// let fallback = empty::<i32>().on_empty(|| async { Ok(vec![-1]) });
    /// assert_eq!(fallback.to_vec().await?, vec![-1]);
    /// # Ok(())
    /// # }
    /// ```
    fn on_empty<A, Fut>(self, action: A) -> OnEmpty<Self, A, T>
    where
        A: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<Vec<T>>> + Send,
    {
        OnEmpty {
            upstream: self,
            action,
            _marker: PhantomData,
        }
    }
}

impl<T, F> OnEmptyExt<T> for F
where
    T: Send + 'static,
    F: Flow<T>,
{
}

pub struct OnEmpty<F, A, T> {
    upstream: F,
    action: A,
    _marker: PhantomData<fn() -> T>,
}

#[async_trait]
impl<F, A, Fut, T> Flow<T> for OnEmpty<F, A, T>
where
    T: Send + 'static,
    F: Flow<T>,
    A: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<T>>> + Send,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let mut counting = TrackingSink::new(sink);
        self.upstream.run(ctx, &mut counting).await?;
        if counting.delivered() > 0 {
            return Ok(());
        }

        let substitutes = (self.action)().await?;
        emit_all(ctx, sink, substitutes).await
    }
}
