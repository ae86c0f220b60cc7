// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! When a shared upstream runs.
//!
//! [`SharingStateMachine`] is a pure transition function: it consumes
//! [`SharingEvent`]s and answers with the [`SharingEffect`]s the driver must
//! carry out. It owns no timers and no tasks, which keeps every policy
//! testable without a runtime.
//!
//! ```
//! use cascade_hot::{SharingEffect, SharingEvent, SharingPolicy, SharingState, SharingStateMachine};
//! use std::time::Duration;
//!
//! let mut machine = SharingStateMachine::new(SharingPolicy::while_subscribed(
//!     Duration::from_secs(5),
//!     None,
//! ));
//! assert!(machine.start().is_empty());
//!
//! assert_eq!(machine.handle(SharingEvent::SubscribersChanged(1)), vec![SharingEffect::Start]);
//! assert_eq!(
//!     machine.handle(SharingEvent::SubscribersChanged(0)),
//!     vec![SharingEffect::ScheduleStop(Duration::from_secs(5))]
//! );
//! assert_eq!(machine.state(), SharingState::StoppingWithGrace);
//! ```

use core::time::Duration;

/// Start/stop policy of a shared upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SharingPolicy {
    /// Start immediately; never stop.
    #[default]
    Eager,
    /// Start on the first subscriber; never stop.
    Lazy,
    /// Run only while subscribers exist.
    WhileSubscribed {
        /// Grace period between the last detach and stopping upstream.
        stop_delay: Duration,
        /// How long the replay cache survives a stop; `None` keeps it forever.
        replay_expiry: Option<Duration>,
    },
}

impl SharingPolicy {
    #[must_use]
    pub const fn while_subscribed(stop_delay: Duration, replay_expiry: Option<Duration>) -> Self {
        Self::WhileSubscribed {
            stop_delay,
            replay_expiry,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharingState {
    Idle,
    Running,
    /// Running, with a stop scheduled after the grace period.
    StoppingWithGrace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharingEvent {
    SubscribersChanged(usize),
    StopDelayElapsed,
    ReplayExpired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharingEffect {
    /// Run upstream from scratch.
    Start,
    /// Cancel the running upstream.
    Stop,
    ScheduleStop(Duration),
    CancelScheduledStop,
    ScheduleReplayExpiry(Duration),
    CancelReplayExpiry,
    ResetReplayCache,
}

/// Transition function of one sharing adapter.
#[derive(Debug, Clone)]
pub struct SharingStateMachine {
    policy: SharingPolicy,
    state: SharingState,
    expiry_pending: bool,
}

impl SharingStateMachine {
    #[must_use]
    pub const fn new(policy: SharingPolicy) -> Self {
        Self {
            policy,
            state: SharingState::Idle,
            expiry_pending: false,
        }
    }

    pub const fn policy(&self) -> SharingPolicy {
        self.policy
    }

    pub const fn state(&self) -> SharingState {
        self.state
    }

    /// Effects due when the adapter is created.
    pub fn start(&mut self) -> Vec<SharingEffect> {
        match (self.policy, self.state) {
            (SharingPolicy::Eager, SharingState::Idle) => {
                self.state = SharingState::Running;
                vec![SharingEffect::Start]
            }
            _ => Vec::new(),
        }
    }

    /// Applies one event; unknown or stale combinations yield no effects.
    pub fn handle(&mut self, event: SharingEvent) -> Vec<SharingEffect> {
        match self.policy {
            SharingPolicy::Eager => Vec::new(),
            SharingPolicy::Lazy => match (self.state, event) {
                (SharingState::Idle, SharingEvent::SubscribersChanged(n)) if n > 0 => {
                    self.state = SharingState::Running;
                    vec![SharingEffect::Start]
                }
                _ => Vec::new(),
            },
            SharingPolicy::WhileSubscribed {
                stop_delay,
                replay_expiry,
            } => self.handle_while_subscribed(event, stop_delay, replay_expiry),
        }
    }

    fn handle_while_subscribed(
        &mut self,
        event: SharingEvent,
        stop_delay: Duration,
        replay_expiry: Option<Duration>,
    ) -> Vec<SharingEffect> {
        match (self.state, event) {
            (SharingState::Idle, SharingEvent::SubscribersChanged(n)) if n > 0 => {
                self.state = SharingState::Running;
                let mut effects = Vec::with_capacity(2);
                if core::mem::take(&mut self.expiry_pending) {
                    effects.push(SharingEffect::CancelReplayExpiry);
                }
                effects.push(SharingEffect::Start);
                effects
            }
            (SharingState::Running, SharingEvent::SubscribersChanged(0)) => {
                if stop_delay.is_zero() {
                    self.stop(replay_expiry)
                } else {
                    self.state = SharingState::StoppingWithGrace;
                    vec![SharingEffect::ScheduleStop(stop_delay)]
                }
            }
            (SharingState::StoppingWithGrace, SharingEvent::SubscribersChanged(n)) if n > 0 => {
                self.state = SharingState::Running;
                vec![SharingEffect::CancelScheduledStop]
            }
            (SharingState::StoppingWithGrace, SharingEvent::StopDelayElapsed) => {
                self.stop(replay_expiry)
            }
            (SharingState::Idle, SharingEvent::ReplayExpired) if self.expiry_pending => {
                self.expiry_pending = false;
                vec![SharingEffect::ResetReplayCache]
            }
            _ => Vec::new(),
        }
    }

    fn stop(&mut self, replay_expiry: Option<Duration>) -> Vec<SharingEffect> {
        self.state = SharingState::Idle;
        match replay_expiry {
            None => vec![SharingEffect::Stop],
            Some(expiry) if expiry.is_zero() => {
                vec![SharingEffect::Stop, SharingEffect::ResetReplayCache]
            }
            Some(expiry) => {
                self.expiry_pending = true;
                vec![
                    SharingEffect::Stop,
                    SharingEffect::ScheduleReplayExpiry(expiry),
                ]
            }
        }
    }
}
