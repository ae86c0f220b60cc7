// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Cancellation token shared between a task and whoever may stop it.
//!
//! Tokens form a tree: cancelling a token cancels every child created with
//! [`CancellationToken::child_token`], which is how a [`CascadeScope`](crate::CascadeScope)
//! stops every job and adapter it owns.

use core::future::Future;
use core::pin::Pin;
use core::sync::atomic::{AtomicBool, Ordering};
use core::task::{Context, Poll};
use event_listener::{Event, EventListener};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Cloneable cancellation handle.
///
/// When `cancel()` is called on any clone, all waiters on `cancelled()` are
/// woken and every child token is cancelled as well.
///
/// # Example
///
/// ```
/// use cascade_core::CancellationToken;
///
/// let parent = CancellationToken::new();
/// let child = parent.child_token();
///
/// parent.cancel();
/// assert!(child.is_cancelled());
/// ```
#[derive(Clone, Debug)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    event: Event,
    children: Mutex<Vec<Weak<Inner>>>,
}

impl Inner {
    fn new(cancelled: bool) -> Self {
        Self {
            cancelled: AtomicBool::new(cancelled),
            event: Event::new(),
            children: Mutex::new(Vec::new()),
        }
    }

    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.event.notify(usize::MAX);

        let children = core::mem::take(&mut *self.children.lock());
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }
}

impl CancellationToken {
    /// Create a new, uncancelled token.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner::new(false)),
        }
    }

    /// Create a token that is cancelled together with `self`.
    ///
    /// Cancelling the child does not affect the parent.
    pub fn child_token(&self) -> Self {
        let mut children = self.inner.children.lock();
        let cancelled = self.is_cancelled();
        let child = Arc::new(Inner::new(cancelled));
        if !cancelled {
            children.retain(|weak| weak.strong_count() > 0);
            children.push(Arc::downgrade(&child));
        }
        Self { inner: child }
    }

    /// Cancel the token, waking all listeners. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Check if the token has been cancelled (non-blocking).
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Wait until the token is cancelled; returns immediately if it already is.
    pub fn cancelled(&self) -> Cancelled<'_> {
        Cancelled {
            token: self,
            listener: None,
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`CancellationToken::cancelled()`].
pub struct Cancelled<'a> {
    token: &'a CancellationToken,
    listener: Option<EventListener>,
}

impl Future for Cancelled<'_> {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        loop {
            if self.token.is_cancelled() {
                return Poll::Ready(());
            }

            match self.listener.as_mut() {
                Some(listener) => {
                    if Pin::new(listener).poll(cx).is_pending() {
                        return Poll::Pending;
                    }
                    self.listener = None;
                }
                // Re-checked at the top of the loop after registering, so a
                // cancel() racing with listen() is never missed
                None => self.listener = Some(self.token.inner.event.listen()),
            }
        }
    }
}
