// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Spawned worker tasks with cooperative cancellation.

use crate::{CancellationToken, CascadeError, Result};
use core::future::Future;
use futures::future::{select, Either};
use futures::pin_mut;
use tokio::task::JoinHandle;

/// Task handle with automatic cancellation on drop.
///
/// `CascadeTask` spawns a future on the Tokio runtime and races it against a
/// [`CancellationToken`]. Cancelling the token (explicitly, through a parent
/// token, or by dropping the handle) drops the future at its next suspension
/// point, which runs every drop guard it owns.
///
/// # Example
///
/// ```rust
/// use cascade_core::CascadeTask;
///
/// # #[tokio::main]
/// # async fn main() {
/// let task = CascadeTask::spawn(|_cancel| async move { 40 + 2 });
/// assert_eq!(task.join().await.unwrap(), Some(42));
///
/// let stuck = CascadeTask::spawn(|_cancel| futures::future::pending::<()>());
/// assert_eq!(stuck.cancel_and_join().await.unwrap(), None);
/// # }
/// ```
#[derive(Debug)]
pub struct CascadeTask<O = ()> {
    cancel: CancellationToken,
    handle: Option<JoinHandle<Option<O>>>,
}

impl<O: Send + 'static> CascadeTask<O> {
    /// Spawn a task with a fresh cancellation token.
    ///
    /// The closure receives the token, for bodies that want to observe
    /// cancellation themselves.
    pub fn spawn<F, Fut>(f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = O> + Send + 'static,
    {
        Self::spawn_with_token(CancellationToken::new(), f)
    }

    /// Spawn a task controlled by an existing token (typically a child token).
    pub fn spawn_with_token<F, Fut>(cancel: CancellationToken, f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = O> + Send + 'static,
    {
        let future = f(cancel.clone());
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let cancelled = token.cancelled();
            pin_mut!(future, cancelled);
            match select(future, cancelled).await {
                Either::Left((output, _)) => Some(output),
                Either::Right(((), _)) => None,
            }
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Signal the task to stop; does not wait for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns `true` if the task has run to an end (normally or cancelled).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the task. `Ok(None)` means it was cancelled before finishing.
    ///
    /// # Errors
    /// Returns an error if the task panicked.
    pub async fn join(mut self) -> Result<Option<O>> {
        match self.handle.take() {
            Some(handle) => handle
                .await
                .map_err(|e| CascadeError::stream_error(format!("task failed: {e}"))),
            None => Ok(None),
        }
    }

    /// Cancel the task and wait until its future has been dropped.
    ///
    /// # Errors
    /// Returns an error if the task panicked.
    pub async fn cancel_and_join(self) -> Result<Option<O>> {
        self.cancel();
        self.join().await
    }
}

impl<O> Drop for CascadeTask<O> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
