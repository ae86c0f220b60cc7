// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Core contracts of the Cascade flow engine.
//!
//! - [`Flow`] / [`FlowSink`]: the cold, pull-driven producer/consumer pair
//! - [`ExecutionContext`]: explicit metadata passed down every call chain
//! - [`CascadeError`] / [`Termination`]: one outcome per execution
//! - [`CancellationToken`], [`CascadeTask`], [`CascadeScope`]: the worker abstraction

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
#[macro_use]
mod logging;
pub mod cascade_task;
pub mod cancellation_token;
pub mod config;
pub mod context;
pub mod error;
pub mod flow;
pub mod scope;
pub mod send_error;
pub mod sink;
pub mod termination;

pub use self::cancellation_token::{CancellationToken, Cancelled};
pub use self::cascade_task::CascadeTask;
pub use self::config::{
    default_concurrency, set_default_concurrency, DEFAULT_BUFFER_CAPACITY, DEFAULT_CONCURRENCY,
};
pub use self::context::{ExecutionContext, Worker};
pub use self::error::{AbortOwner, CascadeError, IntoCascadeError, Result, ResultExt};
pub use self::flow::{BoxFlow, Flow, IntoBoxFlow};
pub use self::scope::CascadeScope;
pub use self::send_error::SendError;
pub use self::sink::{FlowSink, FnSink};
pub use self::termination::Termination;
