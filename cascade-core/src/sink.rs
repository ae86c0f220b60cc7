// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{ExecutionContext, Result};
use async_trait::async_trait;
use core::future::Future;

/// Single-value delivery target: "what happens to a value next".
///
/// `accept` may suspend (backpressure) and may fail. A failing `accept` makes
/// the producing `run` return that same error.
#[async_trait]
pub trait FlowSink<T>: Send
where
    T: Send + 'static,
{
    /// Delivers one value.
    ///
    /// # Errors
    /// Returns an error to stop the producing flow.
    async fn accept(&mut self, ctx: &ExecutionContext, value: T) -> Result<()>;
}

#[async_trait]
impl<T, S> FlowSink<T> for &mut S
where
    T: Send + 'static,
    S: FlowSink<T> + ?Sized,
{
    async fn accept(&mut self, ctx: &ExecutionContext, value: T) -> Result<()> {
        (**self).accept(ctx, value).await
    }
}

#[async_trait]
impl<T, S> FlowSink<T> for Box<S>
where
    T: Send + 'static,
    S: FlowSink<T> + ?Sized,
{
    async fn accept(&mut self, ctx: &ExecutionContext, value: T) -> Result<()> {
        (**self).accept(ctx, value).await
    }
}

/// Sink backed by an async closure; the usual terminal consumer.
///
/// ```
/// use cascade_core::{ExecutionContext, FlowSink, FnSink};
///
/// # #[tokio::main]
/// # async fn main() -> cascade_core::Result<()> {
/// let mut seen = Vec::new();
/// {
///     let mut sink = FnSink::new(|v: i32| {
///         seen.push(v);
///         async { Ok::<_, cascade_core::CascadeError>(()) }
///     });
///     sink.accept(&ExecutionContext::new(), 7).await?;
/// }
/// assert_eq!(seen, vec![7]);
/// # Ok(())
/// # }
/// ```
pub struct FnSink<F> {
    f: F,
}

impl<F> FnSink<F> {
    pub const fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<T, F, Fut> FlowSink<T> for FnSink<F>
where
    T: Send + 'static,
    F: FnMut(T) -> Fut + Send,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn accept(&mut self, _ctx: &ExecutionContext, value: T) -> Result<()> {
        (self.f)(value).await
    }
}
