// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Completion hook with exactly-once delivery.
//!
//! The hook is armed for the whole upstream run. A run that returns invokes it
//! with the outcome; a run whose future is dropped invokes it from the guard's
//! destructor with [`Termination::Cancelled`], synchronously, before the drop
//! returns.

use async_trait::async_trait;
use cascade_core::{ExecutionContext, Flow, FlowSink, Result, Termination};
use core::marker::PhantomData;

/// Extension trait providing the [`on_completion`](Self::on_completion) operator.
pub trait OnCompletionExt<T>: Flow<T> + Sized
where
    T: Send + 'static,
{
    /// Calls `action` exactly once per run with how the run ended.
    ///
    /// Errors raised downstream of this operator are reported as
    /// [`Termination::Failed`] too, since they end the run.
    ///
    /// ```
    /// use cascade_exec::TerminalExt;
    /// use cascade_stream::prelude::*;
    /// use std::sync::atomic::{AtomicBool, Ordering};
    /// use std::sync::Arc;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> cascade_core::Result<()> {
    /// let completed = Arc::new(AtomicBool::new(false));
    /// let flag = completed.clone();
    ///
    /// let flow = flow_of([1, 2]).on_completion(move |t| {
    ///     flag.store(t.is_completed(), Ordering::SeqCst);
    /// });
    ///
    /// flow.to_vec().await?;
    /// assert!(completed.load(Ordering::SeqCst));
    /// # Ok(())
    /// # }
    /// ```
    fn on_completion<A>(self, action: A) -> OnCompletion<Self, A, T>
    where
        A: Fn(Termination<'_>) + Send + Sync,
    {
        OnCompletion {
            upstream: self,
            action,
            _marker: PhantomData,
        }
    }
}

impl<T, F> OnCompletionExt<T> for F
where
    T: Send + 'static,
    F: Flow<T>,
{
}

pub struct OnCompletion<F, A, T> {
    upstream: F,
    action: A,
    _marker: PhantomData<fn(T)>,
}

struct CompletionGuard<'a, A>
where
    A: Fn(Termination<'_>),
{
    action: &'a A,
    armed: bool,
}

impl<A> CompletionGuard<'_, A>
where
    A: Fn(Termination<'_>),
{
    fn finish(mut self, result: &Result<()>) {
        self.armed = false;
        (self.action)(Termination::from_result(result));
    }
}

impl<A> Drop for CompletionGuard<'_, A>
where
    A: Fn(Termination<'_>),
{
    fn drop(&mut self) {
        if self.armed {
            (self.action)(Termination::Cancelled);
        }
    }
}

#[async_trait]
impl<F, A, T> Flow<T> for OnCompletion<F, A, T>
where
    T: Send + 'static,
    F: Flow<T>,
    A: Fn(Termination<'_>) + Send + Sync,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let guard = CompletionGuard {
            action: &self.action,
            armed: true,
        };
        let result = self.upstream.run(ctx, sink).await;
        guard.finish(&result);
        result
    }
}
