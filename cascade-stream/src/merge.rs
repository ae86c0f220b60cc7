// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Concurrent merging of several flows.
//!
//! Every input runs as a branch of the same task, feeding one queue that is
//! drained into the downstream sink. Values are forwarded as they are
//! produced; there is no ordering across inputs. The merged run completes once
//! every input has completed. The first failure drops all other branches and
//! becomes the run's error.

use crate::util::ChannelSink;
use async_trait::async_trait;
use cascade_core::{
    BoxFlow, CascadeError, ExecutionContext, Flow, FlowSink, IntoBoxFlow, Result,
};
use futures::future::try_join;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::mpsc;

/// Merges any number of flows of the same type.
///
/// ```
/// use cascade_exec::TerminalExt;
/// use cascade_stream::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() -> cascade_core::Result<()> {
/// let merged = merge([flow_of([1, 2]).boxed(), flow_of([3]).boxed()]);
///
/// let mut values = merged.to_vec().await?;
/// values.sort_unstable();
/// assert_eq!(values, vec![1, 2, 3]);
/// # Ok(())
/// # }
/// ```
pub fn merge<T, I>(flows: I) -> Merge<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = BoxFlow<T>>,
{
    Merge {
        flows: flows.into_iter().collect(),
    }
}

/// Extension trait providing the [`merge_with`](Self::merge_with) operator.
pub trait MergeWithExt<T>: Flow<T> + Sized + 'static
where
    T: Send + 'static,
{
    /// Runs `self` and `other` concurrently, forwarding values from both.
    fn merge_with<G>(self, other: G) -> Merge<T>
    where
        G: Flow<T> + 'static,
    {
        Merge {
            flows: vec![self.boxed(), other.boxed()],
        }
    }
}

impl<T, F> MergeWithExt<T> for F
where
    T: Send + 'static,
    F: Flow<T> + 'static,
{
}

pub struct Merge<T> {
    flows: Vec<BoxFlow<T>>,
}

impl<T: Send + 'static> Merge<T> {
    /// Adds another input to the merge.
    #[must_use]
    pub fn with(mut self, flow: BoxFlow<T>) -> Self {
        self.flows.push(flow);
        self
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

#[async_trait]
impl<T> Flow<T> for Merge<T>
where
    T: Send + 'static,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let (tx, mut rx) = mpsc::channel(self.flows.len().max(1));

        let producers = async move {
            let mut branches: FuturesUnordered<_> = self
                .flows
                .iter()
                .map(|flow| {
                    let mut branch_sink = ChannelSink::new(tx.clone());
                    async move { flow.run(ctx, &mut branch_sink).await }
                })
                .collect();
            drop(tx);

            while let Some(result) = branches.next().await {
                result?;
            }
            Ok::<_, CascadeError>(())
        };

        let drain = async {
            while let Some(value) = rx.recv().await {
                sink.accept(ctx, value).await?;
            }
            Ok::<_, CascadeError>(())
        };

        try_join(producers, drain).await.map(|_| ())
    }
}
