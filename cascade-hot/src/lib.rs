// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Hot objects for Cascade.
//!
//! Unlike cold flows, hot objects exist independently of their consumers:
//!
//! - [`Broadcast`]: multi-subscriber fan-out with a replay cache and
//!   configurable per-subscriber overflow
//! - [`StateCell`]: a conflated current value
//! - [`ShareInExt::share_in`] / [`StateInExt::state_in`]: publish a cold flow
//!   into one of the above, started and stopped by a [`SharingPolicy`]
//!
//! Hot flows never complete on their own; consumers stop by detaching.

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
#[macro_use]
mod logging;
pub mod broadcast;
pub mod share;
pub mod sharing;
pub mod state_cell;
pub mod subscription;
pub mod subscription_count;

pub use broadcast::{Broadcast, BroadcastConfig, BroadcastFlow, Overflow};
pub use share::{ShareInExt, SharedFlow, StateFlow, StateInExt};
pub use sharing::{SharingEffect, SharingEvent, SharingPolicy, SharingState, SharingStateMachine};
pub use state_cell::{StateCell, StateCellFlow, StateSubscription};
pub use subscription::Subscription;
pub use subscription_count::SubscriptionCount;
