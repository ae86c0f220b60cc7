// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Pairwise combination of two flows by position.

use async_trait::async_trait;
use cascade_core::{AbortOwner, CascadeError, ExecutionContext, Flow, FlowSink, Result};
use core::marker::PhantomData;
use core::sync::atomic::{AtomicBool, Ordering};
use event_listener::Event;
use futures::future::{select, Either};
use futures::pin_mut;
use tokio::sync::mpsc;

/// Pairs the i-th value of `left` with the i-th value of `right`.
///
/// The run completes normally as soon as either side completes, even if the
/// other side is suspended; its unpaired tail is discarded and its
/// production stopped.
///
/// ```
/// use cascade_exec::TerminalExt;
/// use cascade_stream::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() -> cascade_core::Result<()> {
/// let pairs = zip(flow_of([1, 2, 3]), flow_of(["a", "b"]), |n, s| format!("{n}{s}"));
/// assert_eq!(pairs.to_vec().await?, vec!["1a", "2b"]);
/// # Ok(())
/// # }
/// ```
pub fn zip<A, B, L, R, Z, U>(left: L, right: R, combine: Z) -> Zip<L, R, Z, A, B, U>
where
    A: Send + 'static,
    B: Send + 'static,
    U: Send + 'static,
    L: Flow<A>,
    R: Flow<B>,
    Z: Fn(A, B) -> U + Send + Sync,
{
    Zip {
        left,
        right,
        combine,
        _marker: PhantomData,
    }
}

/// Extension trait providing the [`zip_with`](Self::zip_with) operator.
pub trait ZipExt<A>: Flow<A> + Sized
where
    A: Send + 'static,
{
    /// Method form of [`zip`].
    fn zip_with<B, R, Z, U>(self, other: R, combine: Z) -> Zip<Self, R, Z, A, B, U>
    where
        B: Send + 'static,
        U: Send + 'static,
        R: Flow<B>,
        Z: Fn(A, B) -> U + Send + Sync,
    {
        zip(self, other, combine)
    }
}

impl<A, F> ZipExt<A> for F
where
    A: Send + 'static,
    F: Flow<A>,
{
}

pub struct Zip<L, R, Z, A, B, U> {
    left: L,
    right: R,
    combine: Z,
    _marker: PhantomData<fn(A, B) -> U>,
}

struct ZipSink<'a, Z, B, U>
where
    U: Send + 'static,
{
    downstream: &'a mut dyn FlowSink<U>,
    right: mpsc::Receiver<B>,
    combine: &'a Z,
    owner: AbortOwner,
    pairing: &'a Pairing,
}

/// Tracks whether the left side is inside `accept`, pairing or delivering.
#[derive(Default)]
struct Pairing {
    busy: AtomicBool,
    idle: Event,
}

impl Pairing {
    fn enter(&self) {
        self.busy.store(true, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.busy.store(false, Ordering::SeqCst);
        self.idle.notify(usize::MAX);
    }

    /// Resolves once no pair is being formed or delivered.
    async fn wait_idle(&self) {
        loop {
            if !self.busy.load(Ordering::SeqCst) {
                return;
            }
            let listener = self.idle.listen();
            if !self.busy.load(Ordering::SeqCst) {
                return;
            }
            listener.await;
        }
    }
}

#[async_trait]
impl<A, B, U, Z> FlowSink<A> for ZipSink<'_, Z, B, U>
where
    A: Send + 'static,
    B: Send + 'static,
    U: Send + 'static,
    Z: Fn(A, B) -> U + Send + Sync,
{
    async fn accept(&mut self, ctx: &ExecutionContext, value: A) -> Result<()> {
        self.pairing.enter();
        let outcome = match self.right.recv().await {
            Some(other) => {
                let zipped = (self.combine)(value, other);
                self.downstream.accept(ctx, zipped).await
            }
            // The right side completed: no partner will ever arrive
            None => Err(self.owner.signal()),
        };
        self.pairing.leave();
        outcome
    }
}

/// Hands each right value over one at a time.
///
/// `accept` returns only after the left side has taken the value, so once
/// the right run completes nothing is left queued.
struct HandOffSink<B> {
    tx: mpsc::Sender<B>,
}

#[async_trait]
impl<B> FlowSink<B> for HandOffSink<B>
where
    B: Send + 'static,
{
    async fn accept(&mut self, _ctx: &ExecutionContext, value: B) -> Result<()> {
        self.tx
            .send(value)
            .await
            .map_err(|_| CascadeError::cancelled("zip left side finished"))?;
        self.tx
            .reserve()
            .await
            .map(drop)
            .map_err(|_| CascadeError::cancelled("zip left side finished"))
    }
}

#[async_trait]
impl<L, R, Z, A, B, U> Flow<U> for Zip<L, R, Z, A, B, U>
where
    A: Send + 'static,
    B: Send + 'static,
    U: Send + 'static,
    L: Flow<A>,
    R: Flow<B>,
    Z: Fn(A, B) -> U + Send + Sync,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<U>) -> Result<()> {
        let owner = AbortOwner::new();
        let pairing = Pairing::default();
        let (tx, rx) = mpsc::channel(1);

        let right = async move {
            let mut right_sink = HandOffSink { tx };
            self.right.run(ctx, &mut right_sink).await
        };
        let left = async {
            let mut zip_sink = ZipSink {
                downstream: sink,
                right: rx,
                combine: &self.combine,
                owner,
                pairing: &pairing,
            };
            self.left.run(ctx, &mut zip_sink).await
        };
        pin_mut!(left, right);

        let outcome = match select(left, right).await {
            Either::Left((result, _)) => result,
            // Right finished first: let an in-flight pair reach downstream,
            // then stop the left side wherever it is suspended
            Either::Right((Ok(()), left)) => {
                let idle = pairing.wait_idle();
                pin_mut!(idle);
                match select(left, idle).await {
                    Either::Left((result, _)) => result,
                    Either::Right(((), _)) => Ok(()),
                }
            }
            Either::Right((Err(e), _)) => Err(e),
        };
        owner.absorb(outcome)
    }
}
