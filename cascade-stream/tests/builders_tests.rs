// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use cascade_core::CascadeError;
use cascade_exec::TerminalExt;
use cascade_stream::prelude::*;
use cascade_stream::try_stream;
use cascade_test_utils::{assert_error_contains, CountingFlow, TestError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;

#[tokio::test]
async fn test_from_iter_replays_on_every_run() -> anyhow::Result<()> {
    // Arrange
    let flow = from_iter(vec!["north", "south"]);

    // Act
    let first = flow.to_vec().await?;
    let second = flow.to_vec().await?;

    // Assert
    assert_eq!(first, vec!["north", "south"]);
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn test_production_restarts_for_each_consumer() -> anyhow::Result<()> {
    // Arrange
    let source = CountingFlow::new(vec![1, 2, 3]);
    let doubled = source.clone().map(|n| n * 2);

    // Act
    let a = doubled.to_vec().await?;
    let b = doubled.to_vec().await?;

    // Assert
    assert_eq!(a, vec![2, 4, 6]);
    assert_eq!(b, vec![2, 4, 6]);
    assert_eq!(source.runs(), 2);
    Ok(())
}

#[tokio::test]
async fn test_from_stream_creates_a_fresh_stream_per_run() -> anyhow::Result<()> {
    // Arrange
    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();
    let flow = from_stream(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        futures::stream::iter(vec![7, 8])
    });

    // Act
    flow.to_vec().await?;
    let values = flow.to_vec().await?;

    // Assert
    assert_eq!(values, vec![7, 8]);
    assert_eq!(created.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_from_stream_adapts_an_interval_stream() -> anyhow::Result<()> {
    // Arrange
    let flow = from_stream(|| {
        let ticks = IntervalStream::new(tokio::time::interval(Duration::from_millis(100)));
        tokio_stream::StreamExt::take(ticks, 3)
    });
    let started = tokio::time::Instant::now();

    // Act
    let ticks = flow.to_vec().await?;

    // Assert
    assert_eq!(ticks.len(), 3);
    assert_eq!(ticks[2] - ticks[0], Duration::from_millis(200));
    assert_eq!(started.elapsed(), Duration::from_millis(200));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_flow_fn_generator_can_suspend_between_values() -> anyhow::Result<()> {
    // Arrange
    let flow = flow_fn(|| {
        try_stream! {
            for n in 1..=3u32 {
                tokio::time::sleep(Duration::from_millis(100)).await;
                yield n;
            }
        }
    });

    // Act
    let values = flow.to_vec().await?;

    // Assert
    assert_eq!(values, vec![1, 2, 3]);
    Ok(())
}

#[tokio::test]
async fn test_flow_fn_error_ends_the_run() -> anyhow::Result<()> {
    // Arrange
    let flow = flow_fn(|| {
        try_stream! {
            for n in 1..=3 {
                if n == 2 {
                    Err::<(), _>(TestError::cascade("generator broke"))?;
                }
                yield n;
            }
        }
    });

    // Act
    let mut seen = Vec::new();
    let result = flow
        .for_each(|n| {
            seen.push(n);
            async { Ok::<_, CascadeError>(()) }
        })
        .await;

    // Assert
    assert_error_contains(&result, "generator broke");
    assert_eq!(seen, vec![1]);
    Ok(())
}

#[tokio::test]
async fn test_from_future_is_evaluated_per_run() -> anyhow::Result<()> {
    // Arrange
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let flow = from_future(move || {
        let call = counter.fetch_add(1, Ordering::SeqCst);
        async move { Ok::<_, CascadeError>(call * 10) }
    });

    // Act
    let first = flow.to_vec().await?;
    let second = flow.to_vec().await?;

    // Assert
    assert_eq!(first, vec![0]);
    assert_eq!(second, vec![10]);
    Ok(())
}

#[tokio::test]
async fn test_empty_completes_without_values() -> anyhow::Result<()> {
    assert!(empty::<String>().to_vec().await?.is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_never_does_not_complete() -> anyhow::Result<()> {
    // Act
    let outcome = tokio::time::timeout(Duration::from_secs(60), never::<u8>().to_vec()).await;

    // Assert
    assert!(outcome.is_err());
    Ok(())
}
