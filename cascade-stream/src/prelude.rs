// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Prelude module re-exporting all commonly used traits and functions.
//!
//! ```
//! use cascade_stream::prelude::*;
//!
//! let pipeline = flow_of([1, 2, 3, 4])
//!     .map(|x| x * x)
//!     .filter(|x| *x > 1)
//!     .take(2);
//! ```
//!
//! # Contents
//!
//! - every operator extension trait (`MapExt`, `FilterExt`, `TakeExt`, ...)
//! - the source functions (`flow_of`, `from_iter`, `flow_fn`, ...)
//! - the combining functions (`merge`, `zip`, `combine`)
//! - the bridge constructors (`channel_flow`, `callback_flow`) and [`Producer`]
//! - [`IntoBoxFlow`] for type-erasing flows before merging them

pub use crate::bridge::{callback_flow, channel_flow, channel_flow_default, Producer};
pub use crate::buffer::BufferExt;
pub use crate::builders::{
    empty, flow_fn, flow_of, from_future, from_iter, from_stream, never,
};
pub use crate::catch::CatchExt;
pub use crate::combine::{combine, CombineExt};
pub use crate::distinct_until_changed::DistinctUntilChangedExt;
pub use crate::filter::FilterExt;
pub use crate::flat_map_concat::FlatMapConcatExt;
pub use crate::flat_map_latest::FlatMapLatestExt;
pub use crate::flat_map_merge::FlatMapMergeExt;
pub use crate::flow_on::FlowOnExt;
pub use crate::map::MapExt;
pub use crate::merge::{merge, MergeWithExt};
pub use crate::on_completion::OnCompletionExt;
pub use crate::on_empty::OnEmptyExt;
pub use crate::on_start::OnStartExt;
pub use crate::retry::RetryExt;
pub use crate::scan::ScanExt;
pub use crate::skip::SkipExt;
pub use crate::take::TakeExt;
pub use crate::take_while::TakeWhileExt;
pub use crate::tap::TapExt;
pub use crate::zip::{zip, ZipExt};
pub use cascade_core::IntoBoxFlow;
