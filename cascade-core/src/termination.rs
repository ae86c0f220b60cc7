// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{CascadeError, Result};

/// How a single flow execution ended.
///
/// Exactly one `Termination` is observed per `run` by `on_completion` hooks.
#[derive(Debug, Clone, Copy)]
pub enum Termination<'a> {
    /// Upstream delivered everything and returned normally.
    Completed,
    /// Production or a sink failed with this error.
    Failed(&'a CascadeError),
    /// The execution was dropped, cancelled, or aborted by a downstream operator.
    Cancelled,
}

impl<'a> Termination<'a> {
    /// Classifies the result of a `run`.
    pub fn from_result(result: &'a Result<()>) -> Self {
        match result {
            Ok(()) => Self::Completed,
            Err(e) if e.is_cancellation() => Self::Cancelled,
            Err(e) => Self::Failed(e),
        }
    }

    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The failure, if any.
    pub const fn error(&self) -> Option<&'a CascadeError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}
