// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error interception for failures raised upstream.
//!
//! [`catch`](CatchExt::catch) only sees errors produced by the flows it wraps.
//! An error returned by a sink downstream of it (another operator placed after
//! `catch`, or the terminal consumer) travels back through the upstream
//! producer and out of `catch` unchanged: the operator remembers that the
//! failure came from downstream and lets it pass. Cancellation and abort
//! signals are never handed to the handler either.
//!
//! ```
//! use cascade_core::CascadeError;
//! use cascade_exec::TerminalExt;
//! use cascade_stream::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> cascade_core::Result<()> {
//! let flaky = flow_of([1, 2, 3]).map_async(|n| async move {
//!     if n == 3 {
//!         Err(CascadeError::stream_error("sensor offline"))
//!     } else {
//!         Ok(n)
//!     }
//! });
//!
//! let recovered = flaky.catch(|_err| async { Ok(vec![0]) });
//! assert_eq!(recovered.to_vec().await?, vec![1, 2, 0]);
//! # Ok(())
//! # }
//! ```

use crate::util::{emit_all, TrackingSink};
use async_trait::async_trait;
use cascade_core::{CascadeError, ExecutionContext, Flow, FlowSink, Result};
use core::future::Future;
use core::marker::PhantomData;

/// Extension trait providing the [`catch`](Self::catch) operator.
pub trait CatchExt<T>: Flow<T> + Sized
where
    T: Send + 'static,
{
    /// Handles an upstream failure.
    ///
    /// The handler may swallow the error (`Ok(vec![])`), emit replacement
    /// values (`Ok(values)`) or rethrow (`Err(e)`). After a successful handler
    /// the run completes normally.
    fn catch<H, Fut>(self, handler: H) -> Catch<Self, H, T>
    where
        H: Fn(CascadeError) -> Fut + Send + Sync,
        Fut: Future<Output = Result<Vec<T>>> + Send,
    {
        Catch {
            upstream: self,
            handler,
            _marker: PhantomData,
        }
    }
}

impl<T, F> CatchExt<T> for F
where
    T: Send + 'static,
    F: Flow<T>,
{
}

pub struct Catch<F, H, T> {
    upstream: F,
    handler: H,
    _marker: PhantomData<fn() -> T>,
}

#[async_trait]
impl<F, H, Fut, T> Flow<T> for Catch<F, H, T>
where
    T: Send + 'static,
    F: Flow<T>,
    H: Fn(CascadeError) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<T>>> + Send,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let mut tracking = TrackingSink::new(sink);
        let result = self.upstream.run(ctx, &mut tracking).await;
        let from_downstream = tracking.downstream_failed();

        match result {
            Ok(()) => Ok(()),
            Err(e) if from_downstream || e.is_cancellation() => Err(e),
            Err(e) => {
                let replacements = (self.handler)(e).await?;
                emit_all(ctx, sink, replacements).await
            }
        }
    }
}
