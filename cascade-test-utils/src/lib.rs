// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities and fixtures for the Cascade workspace.
//!
//! Designed for development and testing only, not for production code.
//!
//! # Key Types
//!
//! - [`FailingFlow`], [`FlakyFlow`], [`CountingFlow`]: scripted producers that
//!   count how often they were run
//! - [`RecordingSink`]: records delivered values and context names, and can be
//!   told to reject a value to simulate a failing consumer
//! - [`CompletionLog`]: records the outcomes passed to `on_completion`
//! - [`FakeCallbackRegistry`]: a listener API to bridge with `callback_flow`
//! - [`Quote`]: a small payload type for hot-flow tests
//!
//! # Using Assertion Helpers
//!
//! ```rust
//! use cascade_test_utils::assert_no_element_emitted;
//! use futures::stream;
//!
//! # async fn example() {
//! let mut empty = stream::pending::<i32>();
//! assert_no_element_emitted(&mut empty, 10).await;
//! # }
//! ```

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
pub mod callback_registry;
pub mod error_injection;
pub mod helpers;
pub mod quote;
pub mod recording;

pub use callback_registry::{FakeCallbackRegistry, RegistrationId};
pub use error_injection::{CountingFlow, FailingFlow, FlakyFlow, TestError};
pub use helpers::{assert_error_contains, assert_no_element_emitted, expect_next, settle};
pub use quote::Quote;
pub use recording::{CompletionLog, Outcome, RecordingSink};
