// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use cascade_core::CascadeError;
use cascade_exec::TerminalExt;
use cascade_stream::prelude::*;
use cascade_test_utils::{
    assert_error_contains, CompletionLog, CountingFlow, FailingFlow, Outcome, TestError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_on_start_values_come_first_on_every_run() -> anyhow::Result<()> {
    // Arrange
    let starts = Arc::new(AtomicUsize::new(0));
    let counter = starts.clone();
    let flow = flow_of([1, 2]).on_start(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok(vec![0]) }
    });

    // Act
    let first = flow.to_vec().await?;
    let second = flow.to_vec().await?;

    // Assert
    assert_eq!(first, vec![0, 1, 2]);
    assert_eq!(second, vec![0, 1, 2]);
    assert_eq!(starts.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn test_on_start_failure_skips_upstream() -> anyhow::Result<()> {
    // Arrange
    let source = CountingFlow::new(vec![1]);
    let flow = source
        .clone()
        .on_start(|| async { Err(TestError::cascade("not authorised")) });

    // Act
    let result = flow.to_vec().await;

    // Assert
    assert_error_contains(&result, "not authorised");
    assert_eq!(source.runs(), 0);
    Ok(())
}

#[tokio::test]
async fn test_start_with_prepends_values() -> anyhow::Result<()> {
    let flow = flow_of(["live"]).start_with(vec!["cached", "stale"]);

    assert_eq!(flow.to_vec().await?, vec!["cached", "stale", "live"]);
    Ok(())
}

#[tokio::test]
async fn test_on_completion_reports_normal_completion_once() -> anyhow::Result<()> {
    // Arrange
    let log = CompletionLog::new();
    let flow = flow_of([1, 2, 3]).on_completion(log.recorder());

    // Act
    flow.to_vec().await?;

    // Assert
    assert_eq!(log.outcomes(), vec![Outcome::Completed]);
    Ok(())
}

#[tokio::test]
async fn test_on_completion_reports_failure() -> anyhow::Result<()> {
    // Arrange
    let log = CompletionLog::new();
    let flow = FailingFlow::new(vec![1, 2], 1)
        .with_message("checksum mismatch")
        .on_completion(log.recorder());

    // Act
    let result = flow.to_vec().await;

    // Assert
    assert!(result.is_err());
    assert_eq!(
        log.outcomes(),
        vec![Outcome::Failed(
            "User error: Test error: checksum mismatch".to_string()
        )]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_on_completion_reports_cancellation_when_run_is_dropped() -> anyhow::Result<()> {
    // Arrange
    let log = CompletionLog::new();
    let flow = never::<i32>().on_completion(log.recorder());

    // Act
    let outcome = tokio::time::timeout(Duration::from_millis(50), flow.to_vec()).await;

    // Assert
    assert!(outcome.is_err());
    assert_eq!(log.outcomes(), vec![Outcome::Cancelled]);
    Ok(())
}

#[tokio::test]
async fn test_on_completion_fires_once_per_run() -> anyhow::Result<()> {
    // Arrange
    let log = CompletionLog::new();
    let flow = flow_of([1]).on_completion(log.recorder());

    // Act
    flow.to_vec().await?;
    flow.first().await?;

    // Assert
    assert_eq!(log.outcomes(), vec![Outcome::Completed, Outcome::Cancelled]);
    Ok(())
}

#[tokio::test]
async fn test_on_empty_substitutes_only_for_empty_completion() -> anyhow::Result<()> {
    // Arrange
    let fallback = || async { Ok(vec!["default"]) };

    // Act
    let substituted = empty::<&str>().on_empty(fallback).to_vec().await?;
    let untouched = flow_of(["real"]).on_empty(fallback).to_vec().await?;

    // Assert
    assert_eq!(substituted, vec!["default"]);
    assert_eq!(untouched, vec!["real"]);
    Ok(())
}

#[tokio::test]
async fn test_on_empty_is_skipped_on_failure() -> anyhow::Result<()> {
    // Arrange
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let flow = FailingFlow::<i32>::new(vec![], 0).on_empty(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok(vec![42]) }
    });

    // Act
    let result = flow.to_vec().await;

    // Assert
    assert!(matches!(result, Err(CascadeError::UserError(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    Ok(())
}
