// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The cold flow contract.
//!
//! A [`Flow`] is an immutable description of how to produce values into a
//! [`FlowSink`]. Nothing happens until `run` is awaited, and every `run` is an
//! independent execution with fresh state.
//!
//! Operators are flows that wrap another flow and hand it an adapted sink:
//!
//! ```text
//! op(upstream).run(ctx, sink) == upstream.run(ctx, adapted(sink))
//! ```
//!
//! That single law is the only execution machinery operators need.
//!
//! # Implementing a source
//!
//! ```
//! use async_trait::async_trait;
//! use cascade_core::{ExecutionContext, Flow, FlowSink, Result};
//!
//! struct Countdown(u32);
//!
//! #[async_trait]
//! impl Flow<u32> for Countdown {
//!     async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<u32>) -> Result<()> {
//!         for n in (1..=self.0).rev() {
//!             sink.accept(ctx, n).await?;
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use crate::{ExecutionContext, FlowSink, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// A cold, pull-driven sequence of values.
///
/// `run` delivers zero or more values to `sink` in order and then returns
/// `Ok(())`, or returns the first error raised by production or by the sink.
/// Dropping the returned future cancels the execution.
#[async_trait]
pub trait Flow<T>: Send + Sync
where
    T: Send + 'static,
{
    /// Executes the flow, delivering every value to `sink`.
    ///
    /// # Errors
    /// Returns the producer's error, or the error returned by `sink.accept`.
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()>;
}

/// Type-erased, shareable flow.
pub type BoxFlow<T> = Arc<dyn Flow<T>>;

#[async_trait]
impl<T, F> Flow<T> for Arc<F>
where
    T: Send + 'static,
    F: Flow<T> + ?Sized,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        (**self).run(ctx, sink).await
    }
}

#[async_trait]
impl<T, F> Flow<T> for Box<F>
where
    T: Send + 'static,
    F: Flow<T> + ?Sized,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        (**self).run(ctx, sink).await
    }
}

/// Conversion into a [`BoxFlow`].
pub trait IntoBoxFlow<T: Send + 'static>: Flow<T> + Sized + 'static {
    /// Erases the concrete flow type.
    fn boxed(self) -> BoxFlow<T> {
        Arc::new(self)
    }
}

impl<T, F> IntoBoxFlow<T> for F
where
    T: Send + 'static,
    F: Flow<T> + 'static,
{
}
