// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use cascade_core::{default_concurrency, set_default_concurrency};
use std::num::NonZeroUsize;

#[test]
fn test_override_takes_precedence() -> anyhow::Result<()> {
    let value = NonZeroUsize::new(3).ok_or_else(|| anyhow::anyhow!("zero"))?;

    set_default_concurrency(value);

    assert_eq!(default_concurrency(), 3);
    Ok(())
}
