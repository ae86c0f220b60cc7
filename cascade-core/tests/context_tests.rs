// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use cascade_core::{ExecutionContext, Worker};

#[test]
fn test_empty_context_defaults() {
    let ctx = ExecutionContext::new();

    assert_eq!(ctx.name(), None);
    assert_eq!(ctx.worker(), Worker::Inline);
    assert_eq!(ctx.entries().count(), 0);
}

#[test]
fn test_merged_overlay_wins() {
    // Arrange
    let base = ExecutionContext::named("base")
        .with_entry("region", "eu")
        .with_entry("tenant", "acme");
    let overlay = ExecutionContext::new()
        .with_worker(Worker::Spawned)
        .with_entry("region", "us");

    // Act
    let merged = base.merged(&overlay);

    // Assert
    assert_eq!(merged.name(), Some("base"));
    assert_eq!(merged.worker(), Worker::Spawned);
    assert_eq!(merged.get("region"), Some("us"));
    assert_eq!(merged.get("tenant"), Some("acme"));
}

#[test]
fn test_merging_leaves_original_untouched() {
    let base = ExecutionContext::named("base").with_entry("k", "v");
    let overlay = ExecutionContext::named("child").with_entry("k", "w");

    let _child = base.merged(&overlay);

    assert_eq!(base.name(), Some("base"));
    assert_eq!(base.get("k"), Some("v"));
}

#[test]
fn test_entries_are_sorted_by_key() {
    let ctx = ExecutionContext::new()
        .with_entry("b", "2")
        .with_entry("a", "1");

    let keys: Vec<_> = ctx.entries().map(|(k, _)| k).collect();

    assert_eq!(keys, vec!["a", "b"]);
}
