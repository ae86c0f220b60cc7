// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Sources, operators and lifecycle hooks for Cascade flows.
//!
//! Every operator is a concrete [`Flow`](cascade_core::Flow) type that wraps
//! its upstream and hands it an adapted sink, exposed through an extension
//! trait so operators chain with method syntax.
//!
//! ## Operator Categories
//!
//! ### Sources
//!
//! - [`flow_of`], [`from_iter`], [`from_stream`], [`flow_fn`], [`from_future`],
//!   [`empty`], [`never`]
//! - [`channel_flow`] / [`callback_flow`]: bridge concurrent or callback-based
//!   producers into a flow
//!
//! ### Transformation
//!
//! - [`map`](MapExt::map), [`map_async`](MapExt::map_async), [`scan`](ScanExt::scan)
//! - [`flat_map_concat`](FlatMapConcatExt::flat_map_concat),
//!   [`flat_map_merge`](FlatMapMergeExt::flat_map_merge),
//!   [`flat_map_latest`](FlatMapLatestExt::flat_map_latest)
//!
//! ### Filtering
//!
//! - [`filter`](FilterExt::filter), [`take`](TakeExt::take),
//!   [`skip`](SkipExt::skip), [`take_while`](TakeWhileExt::take_while),
//!   [`distinct_until_changed`](DistinctUntilChangedExt::distinct_until_changed)
//!
//! ### Combination
//!
//! - [`merge`] / [`merge_with`](MergeWithExt::merge_with), [`zip`], [`combine`]
//!
//! ### Lifecycle and errors
//!
//! - [`on_start`](OnStartExt::on_start), [`start_with`](OnStartExt::start_with),
//!   [`on_completion`](OnCompletionExt::on_completion), [`on_empty`](OnEmptyExt::on_empty)
//! - [`catch`](CatchExt::catch), [`retry`](RetryExt::retry)
//!
//! ### Execution
//!
//! - [`flow_on`](FlowOnExt::flow_on), [`buffer`](BufferExt::buffer), [`tap`](TapExt::tap)

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
#[macro_use]
mod logging;
pub mod bridge;
pub mod buffer;
pub mod builders;
pub mod catch;
pub mod combine;
pub mod distinct_until_changed;
pub mod filter;
pub mod flat_map_concat;
pub mod flat_map_latest;
pub mod flat_map_merge;
pub mod flow_on;
pub mod map;
pub mod merge;
pub mod on_completion;
pub mod on_empty;
pub mod on_start;
pub mod prelude;
pub mod retry;
pub mod scan;
pub mod skip;
pub mod take;
pub mod take_while;
pub mod tap;
mod util;
pub mod zip;

pub use async_stream::{stream, try_stream};
pub use bridge::{callback_flow, channel_flow, channel_flow_default, BridgeFlow, Producer};
pub use buffer::{Buffer, BufferExt};
pub use builders::{
    empty, flow_fn, flow_of, from_future, from_iter, from_stream, never, Empty, FlowFn, FromFuture,
    FromIter, FromStream, Never,
};
pub use catch::{Catch, CatchExt};
pub use combine::{combine, Combine, CombineExt};
pub use distinct_until_changed::{DistinctUntilChanged, DistinctUntilChangedExt};
pub use filter::{Filter, FilterExt};
pub use flat_map_concat::{FlatMapConcat, FlatMapConcatExt};
pub use flat_map_latest::{FlatMapLatest, FlatMapLatestExt};
pub use flat_map_merge::{FlatMapMerge, FlatMapMergeExt};
pub use flow_on::{FlowOn, FlowOnExt};
pub use map::{Map, MapAsync, MapExt};
pub use merge::{merge, Merge, MergeWithExt};
pub use on_completion::{OnCompletion, OnCompletionExt};
pub use on_empty::{OnEmpty, OnEmptyExt};
pub use on_start::{OnStart, OnStartExt, StartWith};
pub use retry::{Retry, RetryExt};
pub use scan::{Scan, ScanExt};
pub use skip::{Skip, SkipExt};
pub use take::{Take, TakeExt};
pub use take_while::{TakeWhile, TakeWhileExt};
pub use tap::{Tap, TapExt};
pub use zip::{zip, Zip, ZipExt};
