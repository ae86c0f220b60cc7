// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::fmt::Debug;
use futures::stream::StreamExt;
use futures::Stream;
use std::time::Duration;
use tokio::time::sleep;

/// Fails the test if `stream` yields anything within `timeout_ms`.
pub async fn assert_no_element_emitted<S, T>(stream: &mut S, timeout_ms: u64)
where
    S: Stream<Item = T> + Unpin,
{
    tokio::select! {
        _item = stream.next() => {
            panic!("Unexpected element emitted, expected no output.");
        }
        () = sleep(Duration::from_millis(timeout_ms)) => {}
    }
}

pub async fn expect_next<S, T>(stream: &mut S, expected: T)
where
    S: Stream<Item = T> + Unpin,
    T: PartialEq + Debug,
{
    let item = stream.next().await.expect("expected next item");
    assert_eq!(item, expected);
}

/// Asserts that `result` failed and that its message contains `needle`.
pub fn assert_error_contains<T: Debug>(result: &cascade_core::Result<T>, needle: &str) {
    match result {
        Ok(value) => panic!("expected an error containing {needle:?}, got Ok({value:?})"),
        Err(e) => assert!(
            e.to_string().contains(needle),
            "error {e:?} does not contain {needle:?}"
        ),
    }
}

/// Lets spawned tasks run; under paused time this also advances the clock.
pub async fn settle() {
    sleep(Duration::from_millis(10)).await;
}
