// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use cascade_core::{CascadeScope, Flow};
use cascade_exec::TerminalExt;
use cascade_hot::{ShareInExt, SharingPolicy, StateInExt};
use cascade_stream::prelude::*;
use cascade_stream::try_stream;
use cascade_test_utils::quote::{quote_acme, quote_acme_up, quote_globex};
use cascade_test_utils::{settle, CompletionLog, CountingFlow, FailingFlow, Outcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Emits 0, 1, 2, ... every 100ms and counts how often it was started.
fn ticker(starts: Arc<AtomicUsize>) -> impl Flow<u64> + 'static {
    flow_fn(move || {
        starts.fetch_add(1, Ordering::SeqCst);
        try_stream! {
            for tick in 0u64.. {
                yield tick;
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    })
}

#[tokio::test(start_paused = true)]
async fn test_eager_share_runs_without_subscribers() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let upstream = CountingFlow::new(vec![1, 2, 3]);

    // Act
    let shared = upstream
        .clone()
        .share_in(&scope, SharingPolicy::Eager, 3);
    settle().await;

    // Assert
    assert_eq!(upstream.runs(), 1);
    assert_eq!(shared.replay_cache(), vec![1, 2, 3]);
    scope.cancel_and_join().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_late_subscriber_of_shared_flow_gets_the_replay_window() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let shared = flow_of([quote_acme(), quote_acme_up(), quote_globex()]).share_in(
        &scope,
        SharingPolicy::Eager,
        2,
    );
    settle().await;

    // Act
    let late = shared.attach();

    // Assert
    assert_eq!(late.try_next(), Some(quote_acme_up()));
    assert_eq!(late.try_next(), Some(quote_globex()));
    assert_eq!(late.try_next(), None);
    scope.cancel_and_join().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_lazy_share_waits_for_the_first_subscriber() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let upstream = CountingFlow::new(vec![quote_acme(), quote_globex()]);
    let shared = upstream.clone().share_in(&scope, SharingPolicy::Lazy, 0);
    settle().await;
    assert_eq!(upstream.runs(), 0);

    // Act
    let first = shared.attach();
    let second = shared.attach();
    settle().await;

    // Assert
    assert_eq!(upstream.runs(), 1);
    for subscription in [&first, &second] {
        assert_eq!(subscription.try_next(), Some(quote_acme()));
        assert_eq!(subscription.try_next(), Some(quote_globex()));
    }
    scope.cancel_and_join().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_lazy_share_starts_for_a_subscriber_that_left_immediately() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let upstream = CountingFlow::new(vec![1, 2, 3]);
    let shared = upstream.clone().share_in(&scope, SharingPolicy::Lazy, 3);

    // Act
    drop(shared.attach());
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Assert
    assert_eq!(upstream.runs(), 1);
    assert_eq!(shared.replay_cache(), vec![1, 2, 3]);
    scope.cancel_and_join().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_brief_subscriber_starts_then_stops_after_grace() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let starts = Arc::new(AtomicUsize::new(0));
    let log = CompletionLog::new();
    let shared = ticker(starts.clone())
        .on_completion(log.recorder())
        .share_in(
            &scope,
            SharingPolicy::while_subscribed(Duration::from_secs(1), None),
            1,
        );

    // Act
    drop(shared.attach());
    tokio::time::sleep(Duration::from_millis(250)).await;
    let during_grace = shared.replay_cache();
    tokio::time::sleep(Duration::from_secs(2)).await;

    // Assert
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert_eq!(during_grace, vec![2]);
    assert_eq!(log.outcomes(), vec![Outcome::Cancelled]);
    scope.cancel_and_join().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_shared_flow_is_consumable_as_a_flow() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let shared = flow_of([10, 20, 30]).share_in(&scope, SharingPolicy::Lazy, 0);

    // Act
    let values = shared.clone().take(3).to_vec().await?;

    // Assert
    assert_eq!(values, vec![10, 20, 30]);
    assert_eq!(shared.subscriber_count(), 0);
    scope.cancel_and_join().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_reattach_within_grace_keeps_upstream_running() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let starts = Arc::new(AtomicUsize::new(0));
    let log = CompletionLog::new();
    let shared = ticker(starts.clone())
        .on_completion(log.recorder())
        .share_in(
            &scope,
            SharingPolicy::while_subscribed(Duration::from_secs(1), None),
            0,
        );
    settle().await;
    assert_eq!(starts.load(Ordering::SeqCst), 0);

    let subscription = shared.attach();
    settle().await;
    assert_eq!(starts.load(Ordering::SeqCst), 1);

    // Act
    drop(subscription);
    tokio::time::sleep(Duration::from_millis(500)).await;
    let subscription = shared.attach();
    settle().await;

    // Assert
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert_eq!(log.count(), 0);
    drop(subscription);
    scope.cancel_and_join().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_grace_period_expiry_stops_and_reattach_restarts() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let starts = Arc::new(AtomicUsize::new(0));
    let log = CompletionLog::new();
    let shared = ticker(starts.clone())
        .on_completion(log.recorder())
        .share_in(
            &scope,
            SharingPolicy::while_subscribed(Duration::from_secs(1), None),
            0,
        );
    let subscription = shared.attach();
    settle().await;

    // Act
    drop(subscription);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    let stopped = log.outcomes();
    let restarted = shared.attach();
    settle().await;

    // Assert
    assert_eq!(stopped, vec![Outcome::Cancelled]);
    assert_eq!(starts.load(Ordering::SeqCst), 2);
    assert_eq!(restarted.next().await, 0);
    scope.cancel_and_join().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_replay_cache_expires_after_stop() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let starts = Arc::new(AtomicUsize::new(0));
    let shared = ticker(starts).share_in(
        &scope,
        SharingPolicy::while_subscribed(Duration::ZERO, Some(Duration::from_secs(2))),
        1,
    );
    let subscription = shared.attach();
    tokio::time::sleep(Duration::from_millis(250)).await;

    // Act
    drop(subscription);
    settle().await;
    let after_stop = shared.replay_cache();
    tokio::time::sleep(Duration::from_secs(1)).await;
    let before_expiry = shared.replay_cache();
    tokio::time::sleep(Duration::from_secs(2)).await;
    let after_expiry = shared.replay_cache();

    // Assert
    assert_eq!(after_stop, vec![2]);
    assert_eq!(before_expiry, vec![2]);
    assert!(after_expiry.is_empty());
    scope.cancel_and_join().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_replay_expiry_keeps_cache_forever() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let shared = flow_of([1, 2, 3]).share_in(
        &scope,
        SharingPolicy::while_subscribed(Duration::ZERO, None),
        2,
    );
    let subscription = shared.attach();
    settle().await;

    // Act
    drop(subscription);
    tokio::time::sleep(Duration::from_secs(3600)).await;

    // Assert
    assert_eq!(shared.replay_cache(), vec![2, 3]);
    scope.cancel_and_join().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_cancelling_the_scope_stops_production_but_keeps_the_cache() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let log = CompletionLog::new();
    let shared = ticker(Arc::new(AtomicUsize::new(0)))
        .on_completion(log.recorder())
        .share_in(&scope, SharingPolicy::Eager, 1);
    tokio::time::sleep(Duration::from_millis(150)).await;

    // Act
    scope.cancel_and_join().await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    // Assert
    assert_eq!(log.outcomes(), vec![Outcome::Cancelled]);
    assert_eq!(shared.replay_cache(), vec![1]);
    let late = shared.attach();
    assert_eq!(late.try_next(), Some(1));
    assert_eq!(late.try_next(), None);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_upstream_failure_is_recorded_and_shared_flow_stays_usable() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let shared = FailingFlow::new(vec![1, 2, 3], 2)
        .with_message("feed disconnected")
        .share_in(&scope, SharingPolicy::Eager, 5);

    // Act
    settle().await;

    // Assert
    let error = shared.upstream_error().map(|e| e.to_string());
    assert!(error.is_some_and(|message| message.contains("feed disconnected")));
    assert_eq!(shared.replay_cache(), vec![1, 2]);

    let subscription = shared.attach();
    shared.broadcast().emit(9).await;
    let received: Vec<_> = std::iter::from_fn(|| subscription.try_next()).collect();
    assert_eq!(received, vec![1, 2, 9]);
    scope.cancel_and_join().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_state_in_holds_latest_upstream_value() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();

    // Act
    let state = flow_of([quote_acme(), quote_acme_up()]).state_in(
        &scope,
        SharingPolicy::Eager,
        quote_globex(),
    );
    let initial = state.value();
    settle().await;

    // Assert
    assert_eq!(initial, quote_globex());
    assert_eq!(state.value(), quote_acme_up());
    let mut watcher = state.watch();
    assert_eq!(watcher.next().await, quote_acme_up());
    scope.cancel_and_join().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_lazy_state_in_starts_on_first_watcher() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let upstream = CountingFlow::new(vec![5, 6]);
    let state = upstream.clone().state_in(&scope, SharingPolicy::Lazy, 0);
    settle().await;
    assert_eq!(upstream.runs(), 0);
    assert_eq!(state.value(), 0);

    // Act
    let _watcher = state.watch();
    settle().await;

    // Assert
    assert_eq!(upstream.runs(), 1);
    assert_eq!(state.value(), 6);
    scope.cancel_and_join().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_state_in_returns_to_initial_after_replay_expiry() -> anyhow::Result<()> {
    // Arrange
    let scope = CascadeScope::new();
    let state = ticker(Arc::new(AtomicUsize::new(0))).state_in(
        &scope,
        SharingPolicy::while_subscribed(Duration::ZERO, Some(Duration::from_secs(5))),
        u64::MAX,
    );
    let watcher = state.watch();
    tokio::time::sleep(Duration::from_millis(350)).await;

    // Act
    drop(watcher);
    settle().await;
    let after_stop = state.value();
    tokio::time::sleep(Duration::from_secs(6)).await;

    // Assert
    assert_eq!(after_stop, 3);
    assert_eq!(state.value(), u64::MAX);
    scope.cancel_and_join().await;
    Ok(())
}
