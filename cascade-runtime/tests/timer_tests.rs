// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use cascade_runtime::{Timer, TokioTimer};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_sleep_advances_clock() {
    // Arrange
    let timer = TokioTimer;
    let start = timer.now();

    // Act
    timer.sleep_future(Duration::from_secs(5)).await;

    // Assert
    assert!(timer.now() - start >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_instant_arithmetic() {
    let timer = TokioTimer;
    let now = timer.now();

    let later = now + Duration::from_millis(250);

    assert!(later > now);
    assert_eq!(later - now, Duration::from_millis(250));
}
