// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use cascade_hot::{
    SharingEffect::{
        CancelReplayExpiry, CancelScheduledStop, ResetReplayCache, ScheduleReplayExpiry,
        ScheduleStop, Start, Stop,
    },
    SharingEvent::{ReplayExpired, StopDelayElapsed, SubscribersChanged},
    SharingPolicy, SharingState, SharingStateMachine,
};
use std::time::Duration;

const GRACE: Duration = Duration::from_secs(5);
const EXPIRY: Duration = Duration::from_secs(30);

#[test]
fn test_eager_starts_once_and_ignores_subscribers() {
    // Arrange
    let mut machine = SharingStateMachine::new(SharingPolicy::Eager);

    // Act
    let started = machine.start();

    // Assert
    assert_eq!(started, vec![Start]);
    assert!(machine.handle(SubscribersChanged(3)).is_empty());
    assert!(machine.handle(SubscribersChanged(0)).is_empty());
    assert_eq!(machine.state(), SharingState::Running);
}

#[test]
fn test_lazy_starts_on_first_subscriber_and_never_stops() {
    // Arrange
    let mut machine = SharingStateMachine::new(SharingPolicy::Lazy);
    assert!(machine.start().is_empty());
    assert!(machine.handle(SubscribersChanged(0)).is_empty());

    // Act
    let first = machine.handle(SubscribersChanged(1));

    // Assert
    assert_eq!(first, vec![Start]);
    assert!(machine.handle(SubscribersChanged(0)).is_empty());
    assert!(machine.handle(SubscribersChanged(2)).is_empty());
    assert_eq!(machine.state(), SharingState::Running);
}

#[test]
fn test_while_subscribed_without_delay_stops_on_last_detach() {
    // Arrange
    let mut machine =
        SharingStateMachine::new(SharingPolicy::while_subscribed(Duration::ZERO, None));
    assert_eq!(machine.handle(SubscribersChanged(1)), vec![Start]);

    // Act
    let effects = machine.handle(SubscribersChanged(0));

    // Assert
    assert_eq!(effects, vec![Stop]);
    assert_eq!(machine.state(), SharingState::Idle);
}

#[test]
fn test_reattach_during_grace_cancels_the_stop_without_restarting() {
    // Arrange
    let mut machine = SharingStateMachine::new(SharingPolicy::while_subscribed(GRACE, None));
    machine.handle(SubscribersChanged(1));

    // Act
    let detached = machine.handle(SubscribersChanged(0));
    let reattached = machine.handle(SubscribersChanged(1));

    // Assert
    assert_eq!(detached, vec![ScheduleStop(GRACE)]);
    assert_eq!(reattached, vec![CancelScheduledStop]);
    assert_eq!(machine.state(), SharingState::Running);
}

#[test]
fn test_grace_elapsing_stops_upstream() {
    // Arrange
    let mut machine = SharingStateMachine::new(SharingPolicy::while_subscribed(GRACE, None));
    machine.handle(SubscribersChanged(1));
    machine.handle(SubscribersChanged(0));
    assert_eq!(machine.state(), SharingState::StoppingWithGrace);

    // Act
    let effects = machine.handle(StopDelayElapsed);

    // Assert
    assert_eq!(effects, vec![Stop]);
    assert_eq!(machine.state(), SharingState::Idle);
}

#[test]
fn test_stale_timer_events_are_ignored() {
    // Arrange
    let mut machine = SharingStateMachine::new(SharingPolicy::while_subscribed(GRACE, None));
    machine.handle(SubscribersChanged(1));

    // Act
    let stop = machine.handle(StopDelayElapsed);
    let expiry = machine.handle(ReplayExpired);

    // Assert
    assert!(stop.is_empty());
    assert!(expiry.is_empty());
    assert_eq!(machine.state(), SharingState::Running);
}

#[test]
fn test_stop_schedules_replay_expiry_then_resets_cache() {
    // Arrange
    let mut machine =
        SharingStateMachine::new(SharingPolicy::while_subscribed(Duration::ZERO, Some(EXPIRY)));
    machine.handle(SubscribersChanged(1));

    // Act
    let stopped = machine.handle(SubscribersChanged(0));
    let expired = machine.handle(ReplayExpired);

    // Assert
    assert_eq!(stopped, vec![Stop, ScheduleReplayExpiry(EXPIRY)]);
    assert_eq!(expired, vec![ResetReplayCache]);
    assert!(machine.handle(ReplayExpired).is_empty());
}

#[test]
fn test_restart_before_expiry_keeps_the_cache() {
    // Arrange
    let mut machine =
        SharingStateMachine::new(SharingPolicy::while_subscribed(Duration::ZERO, Some(EXPIRY)));
    machine.handle(SubscribersChanged(1));
    machine.handle(SubscribersChanged(0));

    // Act
    let restarted = machine.handle(SubscribersChanged(1));
    let late_expiry = machine.handle(ReplayExpired);

    // Assert
    assert_eq!(restarted, vec![CancelReplayExpiry, Start]);
    assert!(late_expiry.is_empty());
}

#[test]
fn test_zero_expiry_resets_cache_on_stop() {
    // Arrange
    let mut machine = SharingStateMachine::new(SharingPolicy::while_subscribed(
        Duration::ZERO,
        Some(Duration::ZERO),
    ));
    machine.handle(SubscribersChanged(2));

    // Act
    let effects = machine.handle(SubscribersChanged(0));

    // Assert
    assert_eq!(effects, vec![Stop, ResetReplayCache]);
}

#[test]
fn test_subscriber_count_changes_while_running_have_no_effect() {
    // Arrange
    let mut machine = SharingStateMachine::new(SharingPolicy::while_subscribed(GRACE, None));
    machine.handle(SubscribersChanged(1));

    // Act
    let more = machine.handle(SubscribersChanged(4));
    let fewer = machine.handle(SubscribersChanged(2));

    // Assert
    assert!(more.is_empty());
    assert!(fewer.is_empty());
    assert_eq!(machine.state(), SharingState::Running);
}
