// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Terminal consumption for Cascade flows.
//!
//! A flow does nothing until one of these operations runs it:
//! [`TerminalExt`] awaits the outcome in place, [`LaunchExt::launch_in`] runs
//! it as a background [`Job`] owned by a [`CascadeScope`](cascade_core::CascadeScope).

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
#[macro_use]
mod logging;
pub mod job;
pub mod terminal;

pub use job::{Job, LaunchExt};
pub use terminal::TerminalExt;
