// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Side-effect operator for observing values without changing them.

use async_trait::async_trait;
use cascade_core::{ExecutionContext, Flow, FlowSink, Result};
use core::marker::PhantomData;

/// Extension trait providing the [`tap`](Self::tap) operator.
pub trait TapExt<T>: Flow<T> + Sized
where
    T: Send + 'static,
{
    /// Invokes `f` with a reference to each value, then forwards the value unchanged.
    ///
    /// ```
    /// use cascade_exec::TerminalExt;
    /// use cascade_stream::prelude::*;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> cascade_core::Result<()> {
    /// let seen = Arc::new(AtomicUsize::new(0));
    /// let counter = seen.clone();
    ///
    /// let tapped = flow_of([1, 2, 3]).tap(move |_| {
    ///     counter.fetch_add(1, Ordering::Relaxed);
    /// });
    ///
    /// assert_eq!(tapped.to_vec().await?, vec![1, 2, 3]);
    /// assert_eq!(seen.load(Ordering::Relaxed), 3);
    /// # Ok(())
    /// # }
    /// ```
    fn tap<G>(self, f: G) -> Tap<Self, G, T>
    where
        G: Fn(&T) + Send + Sync,
    {
        Tap {
            upstream: self,
            f,
            _marker: PhantomData,
        }
    }
}

impl<T, F> TapExt<T> for F
where
    T: Send + 'static,
    F: Flow<T>,
{
}

pub struct Tap<F, G, T> {
    upstream: F,
    f: G,
    _marker: PhantomData<fn(T)>,
}

struct TapSink<'a, G, T>
where
    T: Send + 'static,
{
    downstream: &'a mut dyn FlowSink<T>,
    f: &'a G,
}

#[async_trait]
impl<T, G> FlowSink<T> for TapSink<'_, G, T>
where
    T: Send + 'static,
    G: Fn(&T) + Send + Sync,
{
    async fn accept(&mut self, ctx: &ExecutionContext, value: T) -> Result<()> {
        (self.f)(&value);
        self.downstream.accept(ctx, value).await
    }
}

#[async_trait]
impl<F, G, T> Flow<T> for Tap<F, G, T>
where
    T: Send + 'static,
    F: Flow<T>,
    G: Fn(&T) + Send + Sync,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let mut adapted = TapSink {
            downstream: sink,
            f: &self.f,
        };
        self.upstream.run(ctx, &mut adapted).await
    }
}
