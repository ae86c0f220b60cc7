// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Latest-value combination of two flows.

use crate::util::TaggedSink;
use async_trait::async_trait;
use cascade_core::{CascadeError, ExecutionContext, Flow, FlowSink, Result};
use core::marker::PhantomData;
use futures::future::{try_join, Either};
use tokio::sync::mpsc;

/// Combines the latest value of each side whenever either side emits.
///
/// Nothing is emitted until both sides have produced at least once during the
/// current run; every run starts with no remembered values. The run completes
/// when both sides have completed.
///
/// ```
/// use cascade_exec::TerminalExt;
/// use cascade_stream::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() -> cascade_core::Result<()> {
/// let sums = combine(flow_of([1]), flow_of([10, 20]), |a, b| a + b);
///
/// let values = sums.to_vec().await?;
/// assert!(!values.is_empty());
/// assert_eq!(values.last(), Some(&21));
/// # Ok(())
/// # }
/// ```
pub fn combine<A, B, L, R, C, U>(left: L, right: R, combine: C) -> Combine<L, R, C, A, B, U>
where
    A: Send + 'static,
    B: Send + 'static,
    U: Send + 'static,
    L: Flow<A>,
    R: Flow<B>,
    C: Fn(&A, &B) -> U + Send + Sync,
{
    Combine {
        left,
        right,
        combine,
        _marker: PhantomData,
    }
}

/// Extension trait providing the [`combine_with`](Self::combine_with) operator.
pub trait CombineExt<A>: Flow<A> + Sized
where
    A: Send + 'static,
{
    /// Method form of [`combine`].
    fn combine_with<B, R, C, U>(self, other: R, f: C) -> Combine<Self, R, C, A, B, U>
    where
        B: Send + 'static,
        U: Send + 'static,
        R: Flow<B>,
        C: Fn(&A, &B) -> U + Send + Sync,
    {
        combine(self, other, f)
    }
}

impl<A, F> CombineExt<A> for F
where
    A: Send + 'static,
    F: Flow<A>,
{
}

pub struct Combine<L, R, C, A, B, U> {
    left: L,
    right: R,
    combine: C,
    _marker: PhantomData<fn(A, B) -> U>,
}

#[async_trait]
impl<L, R, C, A, B, U> Flow<U> for Combine<L, R, C, A, B, U>
where
    A: Send + 'static,
    B: Send + 'static,
    U: Send + 'static,
    L: Flow<A>,
    R: Flow<B>,
    C: Fn(&A, &B) -> U + Send + Sync,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<U>) -> Result<()> {
        let (tx, mut rx) = mpsc::channel::<Either<A, B>>(2);
        let left_tx = tx.clone();
        let right_tx = tx;

        let left = async move {
            let mut tagged = TaggedSink::new(left_tx, Either::Left);
            self.left.run(ctx, &mut tagged).await
        };
        let right = async move {
            let mut tagged = TaggedSink::new(right_tx, Either::Right);
            self.right.run(ctx, &mut tagged).await
        };

        let drain = async {
            let mut latest_left: Option<A> = None;
            let mut latest_right: Option<B> = None;

            while let Some(update) = rx.recv().await {
                match update {
                    Either::Left(a) => latest_left = Some(a),
                    Either::Right(b) => latest_right = Some(b),
                }
                let combined = match (&latest_left, &latest_right) {
                    (Some(a), Some(b)) => Some((self.combine)(a, b)),
                    _ => None,
                };
                if let Some(value) = combined {
                    sink.accept(ctx, value).await?;
                }
            }
            Ok::<_, CascadeError>(())
        };

        try_join(try_join(left, right), drain).await.map(|_| ())
    }
}
