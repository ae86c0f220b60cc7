// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::fmt::Debug;
use core::future::Future;
use core::ops::{Add, Sub};
use core::time::Duration;

/// Monotonic clock plus sleep, as needed by delayed stop and replay expiry.
pub trait Timer: Clone + Send + Sync + Debug + 'static {
    type Sleep: Future<Output = ()> + Send;

    type Instant: Copy
        + Debug
        + Ord
        + Send
        + Sync
        + Add<Duration, Output = Self::Instant>
        + Sub<Duration, Output = Self::Instant>
        + Sub<Self::Instant, Output = Duration>;

    fn sleep_future(&self, duration: Duration) -> Self::Sleep;

    fn now(&self) -> Self::Instant;
}
