// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Flows with scripted failures and run counting.

use async_trait::async_trait;
use cascade_core::{CascadeError, ExecutionContext, Flow, FlowSink, Result};
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Error type raised by the fixtures in this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Test error: {0}")]
pub struct TestError(pub String);

impl TestError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Shorthand for `CascadeError::user_error(TestError::new(message))`.
    pub fn cascade(message: impl Into<String>) -> CascadeError {
        CascadeError::user_error(Self::new(message))
    }
}

/// Emits `values` in order and fails with a [`TestError`] at position `fail_at`.
///
/// With `fail_at >= values.len()` the failure comes after the last value.
/// Every run is counted, so retry tests can assert on re-execution.
///
/// ```rust
/// use cascade_core::{CascadeError, ExecutionContext, FnSink, Flow};
/// use cascade_test_utils::FailingFlow;
///
/// # #[tokio::main]
/// # async fn main() {
/// let flow = FailingFlow::new(vec![1, 2, 3], 2);
/// let mut seen = Vec::new();
/// let result = {
///     let mut sink = FnSink::new(|v| {
///         seen.push(v);
///         async { Ok::<_, CascadeError>(()) }
///     });
///     flow.run(&ExecutionContext::new(), &mut sink).await
/// };
///
/// assert!(result.is_err());
/// assert_eq!(seen, vec![1, 2]);
/// assert_eq!(flow.runs(), 1);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FailingFlow<T> {
    values: Vec<T>,
    fail_at: usize,
    message: String,
    runs: Arc<AtomicUsize>,
}

impl<T> FailingFlow<T> {
    pub fn new(values: Vec<T>, fail_at: usize) -> Self {
        Self {
            values,
            fail_at,
            message: "injected failure".to_string(),
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Overrides the failure message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// How many times the flow has been run.
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T> Flow<T> for FailingFlow<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        for (index, value) in self.values.iter().enumerate() {
            if index == self.fail_at {
                return Err(TestError::cascade(self.message.clone()));
            }
            sink.accept(ctx, value.clone()).await?;
        }
        Err(TestError::cascade(self.message.clone()))
    }
}

/// Emits `values`, failing on the first `failing_runs` runs and succeeding afterwards.
#[derive(Debug, Clone)]
pub struct FlakyFlow<T> {
    values: Vec<T>,
    failing_runs: usize,
    runs: Arc<AtomicUsize>,
}

impl<T> FlakyFlow<T> {
    pub fn new(values: Vec<T>, failing_runs: usize) -> Self {
        Self {
            values,
            failing_runs,
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T> Flow<T> for FlakyFlow<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        let run = self.runs.fetch_add(1, Ordering::SeqCst);
        if run < self.failing_runs {
            return Err(TestError::cascade(format!("flaky run {}", run + 1)));
        }
        for value in &self.values {
            sink.accept(ctx, value.clone()).await?;
        }
        Ok(())
    }
}

/// Emits `values` and counts runs; used to check cold re-execution.
#[derive(Debug, Clone)]
pub struct CountingFlow<T> {
    values: Vec<T>,
    runs: Arc<AtomicUsize>,
}

impl<T> CountingFlow<T> {
    pub fn new(values: Vec<T>) -> Self {
        Self {
            values,
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T> Flow<T> for CountingFlow<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        for value in &self.values {
            sink.accept(ctx, value.clone()).await?;
        }
        Ok(())
    }
}
