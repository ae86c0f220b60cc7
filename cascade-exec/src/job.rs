// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Running a flow as a background job inside a [`CascadeScope`].

use async_trait::async_trait;
use cascade_core::{
    CascadeError, CascadeScope, CascadeTask, ExecutionContext, Flow, FlowSink, Result,
};
use core::marker::PhantomData;
use core::time::Duration;

/// Extension trait providing [`launch_in`](Self::launch_in).
pub trait LaunchExt<T>: Flow<T> + Sized + 'static
where
    T: Send + 'static,
{
    /// Runs the flow on a spawned task belonging to `scope`, discarding values.
    ///
    /// The flow is run for its side effects (`tap`, `on_completion`, ...).
    /// Dropping the returned [`Job`] or cancelling the scope cancels it.
    ///
    /// ```
    /// use cascade_core::CascadeScope;
    /// use cascade_exec::LaunchExt;
    /// use cascade_stream::prelude::*;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> cascade_core::Result<()> {
    /// let seen = Arc::new(AtomicUsize::new(0));
    /// let counter = seen.clone();
    /// let scope = CascadeScope::new();
    ///
    /// let job = flow_of([1, 2, 3])
    ///     .tap(move |_| {
    ///         counter.fetch_add(1, Ordering::SeqCst);
    ///     })
    ///     .launch_in(&scope);
    ///
    /// job.join().await?;
    /// assert_eq!(seen.load(Ordering::SeqCst), 3);
    /// # Ok(())
    /// # }
    /// ```
    fn launch_in(self, scope: &CascadeScope) -> Job {
        self.launch_in_with(scope, ExecutionContext::new())
    }

    /// Like [`launch_in`](Self::launch_in), running with the given context.
    fn launch_in_with(self, scope: &CascadeScope, ctx: ExecutionContext) -> Job {
        let task = scope.spawn(move |_cancel| async move {
            let mut sink = DiscardSink(PhantomData);
            let result = self.run(&ctx, &mut sink).await;
            if let Err(e) = &result {
                if e.is_failure() {
                    error!("job {} failed: {e}", ctx.name().unwrap_or("<unnamed>"));
                }
            }
            result
        });
        debug!("job launched");
        Job { task }
    }
}

impl<T, F> LaunchExt<T> for F
where
    T: Send + 'static,
    F: Flow<T> + 'static,
{
}

struct DiscardSink<T>(PhantomData<fn(T)>);

#[async_trait]
impl<T> FlowSink<T> for DiscardSink<T>
where
    T: Send + 'static,
{
    async fn accept(&mut self, _ctx: &ExecutionContext, _value: T) -> Result<()> {
        Ok(())
    }
}

/// Handle to a launched flow.
///
/// Dropping the handle cancels the job.
#[derive(Debug)]
pub struct Job {
    task: CascadeTask<Result<()>>,
}

impl Job {
    /// Requests cancellation without waiting.
    pub fn cancel(&self) {
        self.task.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.task.is_cancelled()
    }

    /// `true` once the flow finished or was dropped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the flow to end and returns its outcome.
    ///
    /// # Errors
    /// Returns the flow's error, or a cancellation error if the job was
    /// cancelled before it finished.
    pub async fn join(self) -> Result<()> {
        match self.task.join().await? {
            Some(result) => result,
            None => Err(CascadeError::cancelled("job cancelled")),
        }
    }

    /// Cancels the job and waits until its run future has been dropped.
    ///
    /// # Errors
    /// Returns a failure the flow produced before the cancellation took effect.
    pub async fn cancel_and_join(self) -> Result<()> {
        match self.task.cancel_and_join().await? {
            Some(Err(e)) if e.is_failure() => Err(e),
            _ => Ok(()),
        }
    }

    /// Like [`join`](Self::join), cancelling the job if it does not finish in time.
    ///
    /// # Errors
    /// Returns [`CascadeError::TimeoutError`] when `timeout` elapses first.
    pub async fn join_timeout(self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.join()).await {
            Ok(result) => result,
            Err(_) => Err(CascadeError::timeout_error(format!(
                "job did not finish within {timeout:?}"
            ))),
        }
    }
}
