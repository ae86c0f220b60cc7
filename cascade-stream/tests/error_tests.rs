// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error interception (`catch`) and re-execution (`retry`).

use cascade_core::CascadeError;
use cascade_exec::TerminalExt;
use cascade_stream::prelude::*;
use cascade_test_utils::{assert_error_contains, CountingFlow, FailingFlow, FlakyFlow, TestError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn counting_handler(
    calls: &Arc<AtomicUsize>,
    replacement: Vec<i32>,
) -> impl Fn(CascadeError) -> futures::future::Ready<cascade_core::Result<Vec<i32>>> + Send + Sync
{
    let calls = calls.clone();
    move |_err| {
        calls.fetch_add(1, Ordering::SeqCst);
        futures::future::ready(Ok(replacement.clone()))
    }
}

#[tokio::test]
async fn test_catch_swallows_upstream_error() -> anyhow::Result<()> {
    // Arrange
    let calls = Arc::new(AtomicUsize::new(0));
    let flow = FailingFlow::new(vec![1, 2, 3], 2).catch(counting_handler(&calls, vec![]));

    // Act
    let values = flow.to_vec().await?;

    // Assert
    assert_eq!(values, vec![1, 2]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_catch_emits_replacement_values() -> anyhow::Result<()> {
    // Arrange
    let calls = Arc::new(AtomicUsize::new(0));
    let flow = FailingFlow::new(vec![1], 1).catch(counting_handler(&calls, vec![-1, -2]));

    // Act
    let values = flow.to_vec().await?;

    // Assert
    assert_eq!(values, vec![1, -1, -2]);
    Ok(())
}

#[tokio::test]
async fn test_catch_can_rethrow() -> anyhow::Result<()> {
    // Arrange
    let flow = FailingFlow::new(vec![1], 0).catch(|err| async move {
        Err(CascadeError::stream_error(format!("wrapped: {err}")))
    });

    // Act
    let result: cascade_core::Result<Vec<i32>> = flow.to_vec().await;

    // Assert
    assert_error_contains(&result, "wrapped: User error: Test error: injected failure");
    Ok(())
}

#[tokio::test]
async fn test_catch_ignores_terminal_consumer_errors() -> anyhow::Result<()> {
    // Arrange
    let calls = Arc::new(AtomicUsize::new(0));
    let flow = flow_of([1, 2, 3]).catch(counting_handler(&calls, vec![99]));

    // Act
    let result = flow
        .for_each(|n| async move {
            if n == 2 {
                Err(TestError::cascade("consumer rejected 2"))
            } else {
                Ok(())
            }
        })
        .await;

    // Assert
    assert_error_contains(&result, "consumer rejected 2");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_catch_ignores_errors_from_downstream_operators() -> anyhow::Result<()> {
    // Arrange
    let calls = Arc::new(AtomicUsize::new(0));
    let flow = flow_of([1, 2, 3])
        .catch(counting_handler(&calls, vec![99]))
        .map_async(|n| async move {
            if n == 3 {
                Err(CascadeError::stream_error("downstream stage failed"))
            } else {
                Ok(n)
            }
        });

    // Act
    let result = flow.to_vec().await;

    // Assert
    assert_error_contains(&result, "downstream stage failed");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_catch_ignores_cancellation() -> anyhow::Result<()> {
    // Arrange
    let calls = Arc::new(AtomicUsize::new(0));
    let flow = from_future(|| async { Err::<i32, _>(CascadeError::cancelled("shutdown")) })
        .catch(counting_handler(&calls, vec![1]));

    // Act
    let result = flow.to_vec().await;

    // Assert
    assert!(matches!(result, Err(ref e) if e.is_cancellation()));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_catch_under_take_lets_abort_through() -> anyhow::Result<()> {
    // Arrange
    let calls = Arc::new(AtomicUsize::new(0));
    let flow = flow_of([1, 2, 3])
        .catch(counting_handler(&calls, vec![99]))
        .take(1);

    // Act
    let values = flow.to_vec().await?;

    // Assert
    assert_eq!(values, vec![1]);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_retry_reruns_upstream_until_success() -> anyhow::Result<()> {
    // Arrange
    let source = FlakyFlow::new(vec![1, 2], 2);
    let flow = source.clone().retry(3, |_| true);

    // Act
    let values = flow.to_vec().await?;

    // Assert
    assert_eq!(values, vec![1, 2]);
    assert_eq!(source.runs(), 3);
    Ok(())
}

#[tokio::test]
async fn test_retry_gives_up_after_attempts() -> anyhow::Result<()> {
    // Arrange
    let source = FailingFlow::<i32>::new(vec![], 0);
    let flow = source.clone().retry(2, |_| true);

    // Act
    let result = flow.to_vec().await;

    // Assert
    assert!(result.is_err());
    assert_eq!(source.runs(), 3);
    Ok(())
}

#[tokio::test]
async fn test_retry_respects_predicate() -> anyhow::Result<()> {
    // Arrange
    let source = FlakyFlow::new(vec![1], 1);
    let flow = source
        .clone()
        .retry(5, |e| matches!(e, CascadeError::TimeoutError { .. }));

    // Act
    let result = flow.to_vec().await;

    // Assert
    assert!(result.is_err());
    assert_eq!(source.runs(), 1);
    Ok(())
}

#[tokio::test]
async fn test_retry_never_reruns_for_downstream_errors() -> anyhow::Result<()> {
    // Arrange
    let source = CountingFlow::new(vec![1, 2]);
    let flow = source.clone().retry(5, |_| true);

    // Act
    let result = flow
        .for_each(|_| async { Err(CascadeError::stream_error("sink closed")) })
        .await;

    // Assert
    assert_error_contains(&result, "sink closed");
    assert_eq!(source.runs(), 1);
    Ok(())
}

#[tokio::test]
async fn test_retry_then_catch_recovers_after_exhaustion() -> anyhow::Result<()> {
    // Arrange
    let source = FailingFlow::new(vec![7], 1);
    let flow = source
        .clone()
        .retry(1, |_| true)
        .catch(|_| async { Ok(vec![0]) });

    // Act
    let values = flow.to_vec().await?;

    // Assert
    // Values delivered before each failure are not retracted
    assert_eq!(values, vec![7, 7, 0]);
    assert_eq!(source.runs(), 2);
    Ok(())
}
