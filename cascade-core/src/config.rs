// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Process-wide defaults.

use core::num::NonZeroUsize;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Inner flows run at once by `flat_map_merge` unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Queue capacity of bridge flows and `buffer` unless configured otherwise.
pub const DEFAULT_BUFFER_CAPACITY: usize = 64;

/// Environment variable consulted once for the default concurrency.
pub const CONCURRENCY_ENV_VAR: &str = "CASCADE_DEFAULT_CONCURRENCY";

static CONCURRENCY_OVERRIDE: AtomicUsize = AtomicUsize::new(0);
static CONCURRENCY_FROM_ENV: OnceLock<usize> = OnceLock::new();

/// Default concurrency for `flat_map_merge`.
///
/// Resolution order: [`set_default_concurrency`], then `CASCADE_DEFAULT_CONCURRENCY`
/// (read once, ignored unless a positive integer), then [`DEFAULT_CONCURRENCY`].
pub fn default_concurrency() -> usize {
    match CONCURRENCY_OVERRIDE.load(Ordering::Acquire) {
        0 => *CONCURRENCY_FROM_ENV.get_or_init(|| {
            std::env::var(CONCURRENCY_ENV_VAR)
                .ok()
                .and_then(|raw| raw.trim().parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_CONCURRENCY)
        }),
        n => n,
    }
}

/// Overrides the default concurrency for the whole process.
pub fn set_default_concurrency(concurrency: NonZeroUsize) {
    CONCURRENCY_OVERRIDE.store(concurrency.get(), Ordering::Release);
}
