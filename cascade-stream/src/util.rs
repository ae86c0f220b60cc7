// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Sink adapters shared by several operators.

use async_trait::async_trait;
use cascade_core::{CascadeError, ExecutionContext, FlowSink, Result};
use tokio::sync::mpsc;

/// Forwards every value into a bounded queue.
///
/// Used by the concurrent operators: each branch runs with its own
/// `ChannelSink` while one drain loop feeds the real downstream sink.
pub(crate) struct ChannelSink<T> {
    tx: mpsc::Sender<T>,
}

impl<T> ChannelSink<T> {
    pub(crate) const fn new(tx: mpsc::Sender<T>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl<T> FlowSink<T> for ChannelSink<T>
where
    T: Send + 'static,
{
    async fn accept(&mut self, _ctx: &ExecutionContext, value: T) -> Result<()> {
        self.tx
            .send(value)
            .await
            .map_err(|_| CascadeError::cancelled("downstream queue closed"))
    }
}

/// Like [`ChannelSink`], but wraps each value before queueing it.
pub(crate) struct TaggedSink<T, E> {
    tx: mpsc::Sender<E>,
    tag: fn(T) -> E,
}

impl<T, E> TaggedSink<T, E> {
    pub(crate) const fn new(tx: mpsc::Sender<E>, tag: fn(T) -> E) -> Self {
        Self { tx, tag }
    }
}

#[async_trait]
impl<T, E> FlowSink<T> for TaggedSink<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    async fn accept(&mut self, _ctx: &ExecutionContext, value: T) -> Result<()> {
        self.tx
            .send((self.tag)(value))
            .await
            .map_err(|_| CascadeError::cancelled("downstream queue closed"))
    }
}

/// Remembers whether an error came from the downstream sink.
///
/// `catch` and `retry` must only react to errors raised upstream of them;
/// anything the downstream sink returned has to pass through untouched.
pub(crate) struct TrackingSink<'a, T>
where
    T: Send + 'static,
{
    downstream: &'a mut dyn FlowSink<T>,
    downstream_failed: bool,
    delivered: usize,
}

impl<'a, T> TrackingSink<'a, T>
where
    T: Send + 'static,
{
    pub(crate) fn new(downstream: &'a mut dyn FlowSink<T>) -> Self {
        Self {
            downstream,
            downstream_failed: false,
            delivered: 0,
        }
    }

    pub(crate) const fn downstream_failed(&self) -> bool {
        self.downstream_failed
    }

    pub(crate) const fn delivered(&self) -> usize {
        self.delivered
    }
}

#[async_trait]
impl<T> FlowSink<T> for TrackingSink<'_, T>
where
    T: Send + 'static,
{
    async fn accept(&mut self, ctx: &ExecutionContext, value: T) -> Result<()> {
        match self.downstream.accept(ctx, value).await {
            Ok(()) => {
                self.delivered += 1;
                Ok(())
            }
            Err(e) => {
                self.downstream_failed = true;
                Err(e)
            }
        }
    }
}

/// Delivers a batch of values produced by a hook or handler.
pub(crate) async fn emit_all<T>(
    ctx: &ExecutionContext,
    sink: &mut dyn FlowSink<T>,
    values: Vec<T>,
) -> Result<()>
where
    T: Send + 'static,
{
    for value in values {
        sink.accept(ctx, value).await?;
    }
    Ok(())
}
