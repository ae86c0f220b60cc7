// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use cascade_core::{CascadeError, CascadeScope, ExecutionContext};
use cascade_exec::LaunchExt;
use cascade_stream::prelude::*;
use cascade_test_utils::{assert_error_contains, settle, CompletionLog, FailingFlow, Outcome};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_launched_job_runs_side_effects() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = seen.clone();

    // Act
    let job = flow_of([1, 2, 3])
        .tap(move |n| record.lock().push(*n))
        .launch_in(&scope);
    job.join().await?;

    // Assert
    assert_eq!(*seen.lock(), vec![1, 2, 3]);
    Ok(())
}

#[tokio::test]
async fn test_job_join_surfaces_failure() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let job = FailingFlow::new(vec![1], 0)
        .with_message("disk full")
        .launch_in_with(&scope, ExecutionContext::named("archiver"));

    // Act
    let result = job.join().await;

    // Assert
    assert_error_contains(&result, "disk full");
    Ok(())
}

#[tokio::test]
async fn test_cancel_and_join_drops_run_before_returning() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let log = CompletionLog::new();
    let job = never::<i32>().on_completion(log.recorder()).launch_in(&scope);
    settle().await;

    // Act
    job.cancel_and_join().await?;

    // Assert
    assert_eq!(log.outcomes(), vec![Outcome::Cancelled]);
    Ok(())
}

#[tokio::test]
async fn test_scope_cancel_cancels_job() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let log = CompletionLog::new();
    let job = never::<i32>().on_completion(log.recorder()).launch_in(&scope);
    settle().await;

    // Act
    scope.cancel();
    let result = job.join().await;

    // Assert
    assert!(matches!(result, Err(ref e) if e.is_cancellation()));
    assert_eq!(log.outcomes(), vec![Outcome::Cancelled]);
    Ok(())
}

#[tokio::test]
async fn test_dropping_job_cancels_it() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let log = CompletionLog::new();
    let job = never::<i32>().on_completion(log.recorder()).launch_in(&scope);
    settle().await;

    // Act
    drop(job);
    settle().await;

    // Assert
    assert_eq!(log.outcomes(), vec![Outcome::Cancelled]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_join_timeout_reports_timeout_and_cancels() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let log = CompletionLog::new();
    let job = never::<i32>().on_completion(log.recorder()).launch_in(&scope);

    // Act
    let result = job.join_timeout(Duration::from_secs(5)).await;
    settle().await;

    // Assert
    assert!(matches!(result, Err(CascadeError::TimeoutError { .. })));
    assert_eq!(log.outcomes(), vec![Outcome::Cancelled]);
    Ok(())
}
