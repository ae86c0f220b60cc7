// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Sinks and hooks that record what they observed.

use crate::TestError;
use async_trait::async_trait;
use cascade_core::{ExecutionContext, FlowSink, Result, Termination};
use parking_lot::Mutex;
use std::sync::Arc;

/// Sink that records every value (and the context name it was delivered with).
///
/// Clones share the same record, so a test can keep one clone for assertions
/// while the flow consumes the other.
#[derive(Debug)]
pub struct RecordingSink<T> {
    record: Arc<Mutex<Vec<T>>>,
    contexts: Arc<Mutex<Vec<Option<String>>>>,
    fail_at: Option<usize>,
}

impl<T> RecordingSink<T> {
    pub fn new() -> Self {
        Self {
            record: Arc::new(Mutex::new(Vec::new())),
            contexts: Arc::new(Mutex::new(Vec::new())),
            fail_at: None,
        }
    }

    /// A sink whose `accept` fails with a [`TestError`] on the value at `index`.
    ///
    /// Values before it are recorded; the failing value is not.
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::new()
        }
    }

    pub fn values(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.record.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.record.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.record.lock().is_empty()
    }

    /// Context names seen by each `accept`, in delivery order.
    pub fn context_names(&self) -> Vec<Option<String>> {
        self.contexts.lock().clone()
    }
}

impl<T> Default for RecordingSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for RecordingSink<T> {
    fn clone(&self) -> Self {
        Self {
            record: self.record.clone(),
            contexts: self.contexts.clone(),
            fail_at: self.fail_at,
        }
    }
}

#[async_trait]
impl<T> FlowSink<T> for RecordingSink<T>
where
    T: Send + 'static,
{
    async fn accept(&mut self, ctx: &ExecutionContext, value: T) -> Result<()> {
        let mut record = self.record.lock();
        if self.fail_at == Some(record.len()) {
            return Err(TestError::cascade("sink rejected value"));
        }
        record.push(value);
        self.contexts.lock().push(ctx.name().map(str::to_owned));
        Ok(())
    }
}

/// Owned copy of a [`Termination`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed(String),
    Cancelled,
}

impl From<Termination<'_>> for Outcome {
    fn from(termination: Termination<'_>) -> Self {
        match termination {
            Termination::Completed => Self::Completed,
            Termination::Failed(e) => Self::Failed(e.to_string()),
            Termination::Cancelled => Self::Cancelled,
        }
    }
}

/// Records every outcome passed to an `on_completion` hook.
///
/// ```rust
/// use cascade_core::Termination;
/// use cascade_test_utils::{CompletionLog, Outcome};
///
/// let log = CompletionLog::new();
/// let hook = log.recorder();
/// hook(Termination::Cancelled);
///
/// assert_eq!(log.outcomes(), vec![Outcome::Cancelled]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CompletionLog {
    outcomes: Arc<Mutex<Vec<Outcome>>>,
}

impl CompletionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, termination: Termination<'_>) {
        self.outcomes.lock().push(termination.into());
    }

    /// A hook suitable for `on_completion`.
    pub fn recorder(&self) -> impl Fn(Termination<'_>) + Send + Sync + 'static {
        let log = self.clone();
        move |termination: Termination<'_>| log.record(termination)
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        self.outcomes.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.outcomes.lock().len()
    }
}
