// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Hooks that run before the upstream is asked for values.

use crate::util::emit_all;
use async_trait::async_trait;
use cascade_core::{ExecutionContext, Flow, FlowSink, Result};
use core::future::Future;
use core::marker::PhantomData;

/// Extension trait providing [`on_start`](Self::on_start) and [`start_with`](Self::start_with).
pub trait OnStartExt<T>: Flow<T> + Sized
where
    T: Send + 'static,
{
    /// Runs `action` once per run, before the upstream starts. Values it
    /// returns are forwarded ahead of any upstream value; an error it returns
    /// ends the run without starting the upstream.
    ///
    /// ```
    /// use cascade_exec::TerminalExt;
    /// use cascade_stream::prelude::*;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> cascade_core::Result<()> {
    /// let with_header = flow_of([1, 2]).on_start(|| async { Ok(vec![0]) });
    /// assert_eq!(with_header.to_vec().await?, vec![0, 1, 2]);
    /// # Ok(())
    /// # }
    /// ```
    fn on_start<A, Fut>(self, action: A) -> OnStart<Self, A, T>
    where
        A: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<Vec<T>>> + Send,
    {
        OnStart {
            upstream: self,
            action,
            _marker: PhantomData,
        }
    }

    /// Emits `values` before the upstream's own values on every run.
    fn start_with(self, values: Vec<T>) -> StartWith<Self, T>
    where
        T: Clone + Sync,
    {
        StartWith {
            upstream: self,
            values,
        }
    }
}

impl<T, F> OnStartExt<T> for F
where
    T: Send + 'static,
    F: Flow<T>,
{
}

pub struct OnStart<F, A, T> {
    upstream: F,
    action: A,
    _marker: PhantomData<fn() -> T>,
}

#[async_trait]
impl<F, A, Fut, T> Flow<T> for OnStart<F, A, T>
where
    T: Send + 'static,
    F: Flow<T>,
    A: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<T>>> + Send,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let initial = (self.action)().await?;
        emit_all(ctx, sink, initial).await?;
        self.upstream.run(ctx, sink).await
    }
}

pub struct StartWith<F, T> {
    upstream: F,
    values: Vec<T>,
}

#[async_trait]
impl<F, T> Flow<T> for StartWith<F, T>
where
    T: Clone + Send + Sync + 'static,
    F: Flow<T>,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        emit_all(ctx, sink, self.values.clone()).await?;
        self.upstream.run(ctx, sink).await
    }
}
