// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # Cascade
//!
//! Cooperative asynchronous flows for Rust.
//!
//! ## Overview
//!
//! A [`Flow`] is a cold, pull-driven description of how to produce values.
//! Nothing runs until a terminal consumer awaits it, and every run starts from
//! scratch. Operators wrap flows, so a pipeline is just a value:
//!
//! ```
//! use cascade::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> cascade::Result<()> {
//! let totals = flow_of([3, 1, 4, 1, 5])
//!     .filter(|n| *n > 1)
//!     .scan(0, |acc, n| acc + n)
//!     .to_vec()
//!     .await?;
//!
//! assert_eq!(totals, vec![0, 3, 7, 12]);
//! # Ok(())
//! # }
//! ```
//!
//! Hot objects live independently of their consumers: a [`Broadcast`] fans
//! values out to every attached subscriber, a [`StateCell`] keeps one
//! conflated current value, and [`ShareInExt::share_in`] /
//! [`StateInExt::state_in`] publish a cold flow into one of them under a
//! [`SharingPolicy`].
//!
//! ## Crates
//!
//! - `cascade-core`: flow and sink contracts, errors, tasks and scopes
//! - `cascade-stream`: builders, operators and the bridge flow
//! - `cascade-exec`: terminal consumption and background jobs
//! - `cascade-hot`: broadcasts, state cells and sharing adapters
//! - `cascade-runtime`: the timer used by time-driven policies

pub use cascade_core::{
    default_concurrency, set_default_concurrency, AbortOwner, BoxFlow, CancellationToken,
    CascadeError, CascadeScope, CascadeTask, ExecutionContext, Flow, FlowSink, FnSink,
    IntoBoxFlow, IntoCascadeError, Result, ResultExt, SendError, Termination, Worker,
    DEFAULT_BUFFER_CAPACITY, DEFAULT_CONCURRENCY,
};
pub use cascade_exec::{Job, LaunchExt, TerminalExt};
pub use cascade_hot::{
    Broadcast, BroadcastConfig, Overflow, ShareInExt, SharedFlow, SharingPolicy, StateCell,
    StateFlow, StateInExt, StateSubscription, Subscription, SubscriptionCount,
};
pub use cascade_runtime::{Timer, TokioTimer};

/// Builders, operators and the bridge flow.
pub mod stream {
    pub use cascade_stream::*;
}

/// Broadcasts, state cells and the sharing state machine.
pub mod hot {
    pub use cascade_hot::*;
}

/// Everything needed to build, share and consume flows.
pub mod prelude {
    pub use cascade_core::{
        CascadeError, CascadeScope, ExecutionContext, Flow, FlowSink, Result, Termination, Worker,
    };
    pub use cascade_exec::{LaunchExt, TerminalExt};
    pub use cascade_hot::{
        Broadcast, BroadcastConfig, Overflow, ShareInExt, SharingPolicy, StateCell, StateInExt,
    };
    pub use cascade_stream::prelude::*;
    pub use cascade_stream::{stream, try_stream};
}
