// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use async_trait::async_trait;
use cascade_core::{CascadeError, ExecutionContext, Flow, FlowSink};
use cascade_exec::TerminalExt;
use cascade_stream::prelude::*;
use cascade_test_utils::{
    assert_error_contains, CompletionLog, CountingFlow, FailingFlow, Outcome, TestError,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Emits the name of the context it was run with.
struct ContextName;

#[async_trait]
impl Flow<String> for ContextName {
    async fn run(
        &self,
        ctx: &ExecutionContext,
        sink: &mut dyn FlowSink<String>,
    ) -> cascade_core::Result<()> {
        sink.accept(ctx, ctx.name().unwrap_or("<none>").to_string())
            .await
    }
}

#[tokio::test]
async fn test_to_vec_collects_in_emission_order() -> anyhow::Result<()> {
    // Arrange
    let flow = flow_of(["a", "b", "c"]);

    // Act
    let values = flow.to_vec().await?;

    // Assert
    assert_eq!(values, vec!["a", "b", "c"]);
    Ok(())
}

#[tokio::test]
async fn test_each_consumption_reruns_production() -> anyhow::Result<()> {
    // Arrange
    let flow = CountingFlow::new(vec![1, 2]);

    // Act
    let first = flow.to_vec().await?;
    let second = flow.to_vec().await?;

    // Assert
    assert_eq!(first, second);
    assert_eq!(flow.runs(), 2);
    Ok(())
}

#[tokio::test]
async fn test_fold_returns_final_accumulator() -> anyhow::Result<()> {
    // Arrange
    let flow = flow_of([1, 2, 3, 4]);

    // Act
    let sum_of_squares = flow.fold(0, |acc, n| acc + n * n).await?;
    let product_of_squares = flow.fold(1, |acc, n| acc * n * n).await?;

    // Assert
    assert_eq!(sum_of_squares, 30);
    assert_eq!(product_of_squares, 576);
    Ok(())
}

#[tokio::test]
async fn test_fold_on_empty_returns_initial() -> anyhow::Result<()> {
    let total = empty::<i32>().fold(7, |acc, n| acc + n).await?;

    assert_eq!(total, 7);
    Ok(())
}

#[tokio::test]
async fn test_reduce_and_count() -> anyhow::Result<()> {
    // Arrange
    let flow = flow_of([3, 9, 4]);

    // Act
    let max = flow.reduce(|a, b| a.max(b)).await?;
    let none = empty::<i32>().reduce(|a, b| a + b).await?;
    let count = flow.count().await?;

    // Assert
    assert_eq!(max, Some(9));
    assert_eq!(none, None);
    assert_eq!(count, 3);
    Ok(())
}

#[tokio::test]
async fn test_first_stops_production_after_one_value() -> anyhow::Result<()> {
    // Arrange
    let produced = Arc::new(AtomicUsize::new(0));
    let counter = produced.clone();
    let log = CompletionLog::new();
    let flow = flow_of([10, 20, 30])
        .tap(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .on_completion(log.recorder());

    // Act
    let first = flow.first().await?;

    // Assert
    assert_eq!(first, Some(10));
    assert_eq!(produced.load(Ordering::SeqCst), 1);
    assert_eq!(log.outcomes(), vec![Outcome::Cancelled]);
    Ok(())
}

#[tokio::test]
async fn test_first_on_empty_is_none() -> anyhow::Result<()> {
    assert_eq!(empty::<u8>().first().await?, None);
    Ok(())
}

#[tokio::test]
async fn test_upstream_error_surfaces_from_to_vec() -> anyhow::Result<()> {
    // Arrange
    let flow = FailingFlow::new(vec![1, 2, 3], 1).with_message("sensor offline");

    // Act
    let result = flow.to_vec().await;

    // Assert
    assert_error_contains(&result, "sensor offline");
    Ok(())
}

#[tokio::test]
async fn test_for_each_handler_error_stops_production() -> anyhow::Result<()> {
    // Arrange
    let produced = Arc::new(AtomicUsize::new(0));
    let counter = produced.clone();
    let flow = flow_of([1, 2, 3, 4]).tap(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // Act
    let result = flow
        .for_each(|n| async move {
            if n == 2 {
                Err(CascadeError::user_error(TestError::new("rejected 2")))
            } else {
                Ok(())
            }
        })
        .await;

    // Assert
    assert_error_contains(&result, "rejected 2");
    assert_eq!(produced.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn test_for_each_in_runs_with_given_context() -> anyhow::Result<()> {
    // Arrange
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = seen.clone();
    let ctx = ExecutionContext::named("billing");

    // Act
    ContextName
        .for_each_in(&ctx, move |name| {
            record.lock().push(name);
            async { Ok::<_, CascadeError>(()) }
        })
        .await?;
    let default = ContextName.to_vec().await?;

    // Assert
    assert_eq!(*seen.lock(), vec!["billing".to_string()]);
    assert_eq!(default, vec!["<none>".to_string()]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_collect_latest_cancels_stale_handlers() -> anyhow::Result<()> {
    // Arrange
    let flow = flow_fn(|| {
        cascade_stream::try_stream! {
            for n in 1..=3 {
                yield n;
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    });
    let started = Arc::new(Mutex::new(Vec::new()));
    let finished = Arc::new(Mutex::new(Vec::new()));

    // Act
    flow.collect_latest(|n| {
        let started = started.clone();
        let finished = finished.clone();
        async move {
            started.lock().push(n);
            tokio::time::sleep(Duration::from_millis(50)).await;
            finished.lock().push(n);
            Ok::<_, CascadeError>(())
        }
    })
    .await?;

    // Assert
    assert_eq!(*started.lock(), vec![1, 2, 3]);
    assert_eq!(*finished.lock(), vec![3]);
    Ok(())
}

#[tokio::test]
async fn test_collect_latest_surfaces_handler_error() -> anyhow::Result<()> {
    // Act
    let result = flow_of([1])
        .collect_latest(|_| async { Err::<(), _>(TestError::cascade("handler failed")) })
        .await;

    // Assert
    assert_error_contains(&result, "handler failed");
    Ok(())
}
