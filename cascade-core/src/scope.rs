// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Owning scope for background work.
//!
//! Hot adapters and launched jobs belong to a [`CascadeScope`]. Tearing the
//! scope down (explicitly or by dropping the last handle) cancels all of them;
//! objects they were feeding (broadcasts, state cells) stay alive.

use crate::{CancellationToken, CascadeTask};
use core::future::Future;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle to a cancellation scope.
///
/// ```
/// use cascade_core::CascadeScope;
///
/// # #[tokio::main]
/// # async fn main() {
/// let scope = CascadeScope::new();
/// scope.spawn_owned(|_| futures::future::pending::<()>());
///
/// scope.cancel_and_join().await;
/// assert!(scope.is_cancelled());
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct CascadeScope {
    inner: Arc<ScopeInner>,
}

#[derive(Debug, Default)]
struct ScopeInner {
    token: CancellationToken,
    owned: Mutex<Vec<CascadeTask>>,
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl CascadeScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A nested scope, cancelled together with this one.
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                token: self.inner.token.child_token(),
                owned: Mutex::new(Vec::new()),
            }),
        }
    }

    /// A token cancelled when this scope is torn down.
    pub fn child_token(&self) -> CancellationToken {
        self.inner.token.child_token()
    }

    /// Spawn a task that the caller holds; it also stops when the scope is cancelled.
    pub fn spawn<O, F, Fut>(&self, f: F) -> CascadeTask<O>
    where
        O: Send + 'static,
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = O> + Send + 'static,
    {
        CascadeTask::spawn_with_token(self.child_token(), f)
    }

    /// Spawn a task owned by the scope itself; it runs until the scope is cancelled.
    pub fn spawn_owned<F, Fut>(&self, f: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task = CascadeTask::spawn_with_token(self.child_token(), f);
        let mut owned = self.inner.owned.lock();
        owned.retain(|t| !t.is_finished());
        owned.push(task);
    }

    pub fn cancel(&self) {
        self.inner.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Cancel the scope and wait until every owned task has stopped.
    pub async fn cancel_and_join(&self) {
        self.cancel();
        let owned = core::mem::take(&mut *self.inner.owned.lock());
        for task in owned {
            if let Err(e) = task.join().await {
                error!("scope task ended abnormally: {e}");
            }
        }
    }
}
