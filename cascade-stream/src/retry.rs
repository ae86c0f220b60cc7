// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::util::TrackingSink;
use async_trait::async_trait;
use cascade_core::{CascadeError, ExecutionContext, Flow, FlowSink, Result};
use core::marker::PhantomData;

/// Extension trait providing the [`retry`](Self::retry) operator.
pub trait RetryExt<T>: Flow<T> + Sized
where
    T: Send + 'static,
{
    /// Re-runs the upstream from scratch after an upstream failure accepted by
    /// `predicate`, at most `attempts` times.
    ///
    /// Values delivered before a failure are not retracted. Errors raised
    /// downstream, cancellations and aborts are never retried.
    ///
    /// ```
    /// use cascade_core::CascadeError;
    /// use cascade_exec::TerminalExt;
    /// use cascade_stream::prelude::*;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> cascade_core::Result<()> {
    /// let calls = Arc::new(AtomicUsize::new(0));
    /// let counter = calls.clone();
    ///
    /// let eventually = from_future(move || {
    ///     let attempt = counter.fetch_add(1, Ordering::SeqCst);
    ///     async move {
    ///         if attempt < 2 {
    ///             Err(CascadeError::stream_error("busy"))
    ///         } else {
    ///             Ok(attempt)
    ///         }
    ///     }
    /// })
    /// .retry(3, |_| true);
    ///
    /// assert_eq!(eventually.to_vec().await?, vec![2]);
    /// # Ok(())
    /// # }
    /// ```
    fn retry<P>(self, attempts: usize, predicate: P) -> Retry<Self, P, T>
    where
        P: Fn(&CascadeError) -> bool + Send + Sync,
    {
        Retry {
            upstream: self,
            attempts,
            predicate,
            _marker: PhantomData,
        }
    }
}

impl<T, F> RetryExt<T> for F
where
    T: Send + 'static,
    F: Flow<T>,
{
}

pub struct Retry<F, P, T> {
    upstream: F,
    attempts: usize,
    predicate: P,
    _marker: PhantomData<fn() -> T>,
}

#[async_trait]
impl<F, P, T> Flow<T> for Retry<F, P, T>
where
    T: Send + 'static,
    F: Flow<T>,
    P: Fn(&CascadeError) -> bool + Send + Sync,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let mut remaining = self.attempts;
        loop {
            let mut tracking = TrackingSink::new(&mut *sink);
            let result = self.upstream.run(ctx, &mut tracking).await;
            let from_downstream = tracking.downstream_failed();

            match result {
                Err(e)
                    if remaining > 0
                        && !from_downstream
                        && e.is_failure()
                        && (self.predicate)(&e) =>
                {
                    remaining -= 1;
                    warn!("retrying upstream after error ({remaining} attempts left): {e}");
                }
                other => return other,
            }
        }
    }
}
