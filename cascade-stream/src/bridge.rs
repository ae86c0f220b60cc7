// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Bridge flows: concurrent production feeding a pull-driven consumer.
//!
//! Each run of a [`BridgeFlow`] creates a bounded queue and starts the body
//! with a [`Producer`] for it, concurrently with a loop that pulls the queue
//! into the downstream sink. The body and the loop are branches of the same
//! task, so the body lives exactly as long as the run:
//!
//! - the consumer fails or the run is dropped: the body is dropped, queued
//!   values are discarded and every later send returns [`SendError::Closed`]
//! - the body fails, or a producer calls [`Producer::cancel`]: the loop stops
//!   and the error is the run's outcome
//! - a producer calls [`Producer::close`], or the body returns: queued values
//!   are still delivered, then the run completes
//!
//! # Wrapping callback APIs
//!
//! [`callback_flow`] is meant for sources that register a callback. The body
//! registers, then parks in [`Producer::await_close`], whose release action
//! runs exactly once however the run ends:
//!
//! ```
//! use cascade_exec::TerminalExt;
//! use cascade_stream::prelude::*;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> cascade_core::Result<()> {
//! let released = Arc::new(AtomicUsize::new(0));
//! let counter = released.clone();
//!
//! let ticks = callback_flow(8, move |producer| {
//!     let counter = counter.clone();
//!     async move {
//!         // stands in for registering with an external source
//!         for tick in 0..3 {
//!             producer.try_send(tick)?;
//!         }
//!         producer.close();
//!         producer
//!             .await_close(move || {
//!                 counter.fetch_add(1, Ordering::SeqCst);
//!             })
//!             .await;
//!         Ok(())
//!     }
//! });
//!
//! assert_eq!(ticks.to_vec().await?, vec![0, 1, 2]);
//! assert_eq!(released.load(Ordering::SeqCst), 1);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use cascade_core::{
    CascadeError, ExecutionContext, Flow, FlowSink, Result, SendError, DEFAULT_BUFFER_CAPACITY,
};
use core::future::Future;
use core::marker::PhantomData;
use event_listener::Event;
use futures::future::try_join;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

#[derive(Debug, Default)]
struct ControlState {
    closed: bool,
    failure: Option<CascadeError>,
    close_awaited: bool,
}

/// Shared close/failure state of one bridge run.
#[derive(Debug, Default)]
struct BridgeControl {
    state: Mutex<ControlState>,
    event: Event,
}

impl BridgeControl {
    /// Returns `false` if the bridge was already closed.
    fn close(&self) -> bool {
        {
            let mut state = self.state.lock();
            if state.closed {
                return false;
            }
            state.closed = true;
        }
        self.event.notify(usize::MAX);
        true
    }

    fn fail(&self, cause: CascadeError) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.failure = Some(cause);
        }
        self.event.notify(usize::MAX);
    }

    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn take_failure(&self) -> Option<CascadeError> {
        self.state.lock().failure.take()
    }

    fn mark_close_awaited(&self) {
        self.state.lock().close_awaited = true;
    }

    fn close_awaited(&self) -> bool {
        self.state.lock().close_awaited
    }

    async fn closed(&self) {
        loop {
            if self.is_closed() {
                return;
            }
            let listener = self.event.listen();
            if self.is_closed() {
                return;
            }
            listener.await;
        }
    }
}

/// Closes the bridge when its run ends, however it ends.
struct Teardown(Arc<BridgeControl>);

impl Drop for Teardown {
    fn drop(&mut self) {
        if self.0.close() {
            debug!("bridge torn down by its consumer");
        }
    }
}

/// Runs a release action when dropped.
struct OnClose<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> Drop for OnClose<F> {
    fn drop(&mut self) {
        if let Some(release) = self.0.take() {
            release();
        }
    }
}

/// Sending half of a bridge run.
///
/// Cheap to clone, `Send + Sync`, and usable from any thread or task.
#[derive(Debug)]
pub struct Producer<T> {
    tx: mpsc::Sender<T>,
    control: Arc<BridgeControl>,
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            control: Arc::clone(&self.control),
        }
    }
}

impl<T: Send + 'static> Producer<T> {
    /// Enqueues a value, suspending while the queue is full.
    ///
    /// # Errors
    /// Returns [`SendError::Closed`] with the value once the bridge is closed.
    pub async fn send(&self, value: T) -> core::result::Result<(), SendError<T>> {
        if self.control.is_closed() {
            return Err(SendError::Closed(value));
        }
        self.tx.send(value).await.map_err(|e| SendError::Closed(e.0))
    }

    /// Enqueues a value without suspending.
    ///
    /// # Errors
    /// Returns [`SendError::Full`] when the queue is full and
    /// [`SendError::Closed`] once the bridge is closed.
    pub fn try_send(&self, value: T) -> core::result::Result<(), SendError<T>> {
        if self.control.is_closed() {
            return Err(SendError::Closed(value));
        }
        self.tx.try_send(value).map_err(|e| match e {
            TrySendError::Full(v) => SendError::Full(v),
            TrySendError::Closed(v) => SendError::Closed(v),
        })
    }

    /// Ends production normally; values already queued are still delivered.
    pub fn close(&self) {
        self.control.close();
    }

    /// Ends the run with `cause` as its error.
    pub fn cancel(&self, cause: CascadeError) {
        self.control.fail(cause);
    }

    pub fn is_closed(&self) -> bool {
        self.control.is_closed() || self.tx.is_closed()
    }

    /// Suspends until the bridge is closed from either side, then runs
    /// `on_close`.
    ///
    /// `on_close` also runs if this future is dropped first, which is what
    /// happens when the consuming run fails or is cancelled.
    pub async fn await_close<F>(&self, on_close: F)
    where
        F: FnOnce() + Send,
    {
        self.control.mark_close_awaited();
        let _release = OnClose(Some(on_close));
        self.control.closed().await;
    }
}

/// Flow whose values come from a body running alongside the consumer.
pub struct BridgeFlow<B, T> {
    body: B,
    capacity: usize,
    require_await_close: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<B, T> BridgeFlow<B, T> {
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Bridge flow whose body returning ends production.
pub fn channel_flow<T, B, Fut>(capacity: usize, body: B) -> BridgeFlow<B, T>
where
    T: Send + 'static,
    B: Fn(Producer<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    BridgeFlow {
        body,
        capacity: capacity.max(1),
        require_await_close: false,
        _marker: PhantomData,
    }
}

/// [`channel_flow`] with the default queue capacity.
pub fn channel_flow_default<T, B, Fut>(body: B) -> BridgeFlow<B, T>
where
    T: Send + 'static,
    B: Fn(Producer<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    channel_flow(DEFAULT_BUFFER_CAPACITY, body)
}

/// Bridge flow for callback registrations.
///
/// A body that returns without having called [`Producer::await_close`] fails
/// the run, since its registration would otherwise never be released.
pub fn callback_flow<T, B, Fut>(capacity: usize, body: B) -> BridgeFlow<B, T>
where
    T: Send + 'static,
    B: Fn(Producer<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    BridgeFlow {
        body,
        capacity: capacity.max(1),
        require_await_close: true,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<B, Fut, T> Flow<T> for BridgeFlow<B, T>
where
    T: Send + 'static,
    B: Fn(Producer<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let (tx, mut rx) = mpsc::channel(self.capacity);
        let control = Arc::new(BridgeControl::default());
        let _teardown = Teardown(Arc::clone(&control));
        let producer = Producer {
            tx,
            control: Arc::clone(&control),
        };

        let body = async {
            (self.body)(producer).await?;
            if self.require_await_close && !control.close_awaited() {
                return Err(CascadeError::stream_error(
                    "callback_flow body returned without calling await_close; \
                     the registration it made would leak",
                ));
            }
            control.close();
            Ok::<_, CascadeError>(())
        };

        let pump = async {
            loop {
                tokio::select! {
                    received = rx.recv() => match received {
                        Some(value) => sink.accept(ctx, value).await?,
                        None => break,
                    },
                    () = control.closed() => break,
                }
            }

            if let Some(cause) = control.take_failure() {
                return Err(cause);
            }
            rx.close();
            while let Some(value) = rx.recv().await {
                sink.accept(ctx, value).await?;
            }
            Ok::<_, CascadeError>(())
        };

        try_join(body, pump).await.map(|_| ())
    }
}
