// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error types for Cascade flows
//!
//! Every `run` of a [`Flow`](crate::Flow) ends with exactly one outcome: `Ok(())`
//! or one [`CascadeError`]. The variants separate failures raised by user code
//! (producers, operators, terminal consumers) from the two control signals the
//! engine uses internally: cancellation and operator-driven aborts.
//!
//! # Examples
//!
//! ```
//! use cascade_core::{CascadeError, Result};
//!
//! fn produce() -> Result<()> {
//!     Err(CascadeError::stream_error("sensor offline"))
//! }
//!
//! assert!(!produce().unwrap_err().is_cancellation());
//! ```

use core::sync::atomic::{AtomicU64, Ordering};

/// Root error type for all Cascade operations
#[derive(Debug, thiserror::Error)]
pub enum CascadeError {
    /// A producer, an operator or a consumer failed with a message.
    #[error("Stream processing error: {context}")]
    StreamProcessingError {
        /// Description of what went wrong
        context: String,
    },

    /// Custom error from user code
    ///
    /// Wraps errors produced by user-provided closures so they travel through
    /// the flow unchanged.
    #[error("User error: {0}")]
    UserError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The execution was asked to stop.
    ///
    /// Not a failure: cleanup hooks observe it as
    /// [`Termination::Cancelled`](crate::Termination::Cancelled).
    #[error("Cancelled: {reason}")]
    Cancelled {
        /// Who or what requested the cancellation
        reason: String,
    },

    /// A timed wait elapsed before the awaited event happened.
    #[error("Timeout: {context}")]
    TimeoutError {
        /// What was being waited for
        context: String,
    },

    /// An operator stopped its upstream early (`take`, `take_while`, `zip`, ...).
    ///
    /// The operator identified by `owner` converts this back into normal
    /// completion; everything upstream of it sees a cancellation.
    #[error("Flow aborted by operator #{owner}")]
    Aborted {
        /// Identity of the operator run that raised the abort
        owner: u64,
    },
}

impl CascadeError {
    /// Create a stream processing error with the given context
    pub fn stream_error(context: impl Into<String>) -> Self {
        Self::StreamProcessingError {
            context: context.into(),
        }
    }

    /// Wrap a user error
    pub fn user_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::UserError(Box::new(error))
    }

    /// Create a timeout error with the given context
    pub fn timeout_error(context: impl Into<String>) -> Self {
        Self::TimeoutError {
            context: context.into(),
        }
    }

    /// Create a cancellation signal with the given reason
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled {
            reason: reason.into(),
        }
    }

    /// Returns `true` for cancellation and abort signals.
    ///
    /// `catch` and `retry` never intercept these.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::Aborted { .. })
    }

    /// Returns `true` if this error is a genuine failure rather than a control signal.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !self.is_cancellation()
    }
}

impl Clone for CascadeError {
    fn clone(&self) -> Self {
        match self {
            Self::StreamProcessingError { context } => Self::StreamProcessingError {
                context: context.clone(),
            },
            // The boxed source cannot be cloned, keep its message
            Self::UserError(e) => Self::StreamProcessingError {
                context: format!("User error: {e}"),
            },
            Self::TimeoutError { context } => Self::TimeoutError {
                context: context.clone(),
            },
            Self::Cancelled { reason } => Self::Cancelled {
                reason: reason.clone(),
            },
            Self::Aborted { owner } => Self::Aborted { owner: *owner },
        }
    }
}

static NEXT_ABORT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Identity of one operator execution that may abort its upstream.
///
/// Each run of `take`, `take_while`, `zip` or `first` allocates a fresh owner
/// so nested operators never swallow each other's abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbortOwner(u64);

impl AbortOwner {
    /// Allocates a new, process-unique owner.
    #[must_use]
    pub fn new() -> Self {
        Self(NEXT_ABORT_OWNER.fetch_add(1, Ordering::Relaxed))
    }

    /// The error to return from a sink to stop upstream production.
    #[must_use]
    pub const fn signal(self) -> CascadeError {
        CascadeError::Aborted { owner: self.0 }
    }

    /// Returns `true` if `error` is this owner's abort signal.
    #[must_use]
    pub const fn owns(self, error: &CascadeError) -> bool {
        matches!(error, CascadeError::Aborted { owner } if *owner == self.0)
    }

    /// Maps this owner's abort signal back to normal completion.
    ///
    /// # Errors
    /// Returns any other error unchanged.
    pub fn absorb(self, result: Result<()>) -> Result<()> {
        match result {
            Err(e) if self.owns(&e) => Ok(()),
            other => other,
        }
    }
}

impl Default for AbortOwner {
    fn default() -> Self {
        Self::new()
    }
}

/// Specialized Result type for Cascade operations
pub type Result<T> = std::result::Result<T, CascadeError>;

/// Extension trait for converting errors into `CascadeError`
pub trait IntoCascadeError {
    /// Convert this error into a `CascadeError` carrying `context`
    fn into_cascade_error(self, context: &str) -> CascadeError;

    /// Convert this error into a `CascadeError` without additional context
    fn into_cascade(self) -> CascadeError
    where
        Self: Sized,
    {
        self.into_cascade_error("")
    }
}

/// A `CascadeError` converts to itself, so control signals keep their meaning.
impl<E: std::error::Error + Send + Sync + 'static> IntoCascadeError for E {
    fn into_cascade_error(self, context: &str) -> CascadeError {
        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(self);
        match boxed.downcast::<CascadeError>() {
            Ok(own) => *own,
            Err(foreign) if context.is_empty() => CascadeError::UserError(foreign),
            Err(foreign) => CascadeError::stream_error(format!("{context}: {foreign}")),
        }
    }
}

/// Helper trait for adding context to `Result`s
pub trait ResultExt<T> {
    /// Add context to an error
    ///
    /// # Errors
    /// Returns `Err(CascadeError)` if the underlying result is `Err`.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context to an error using a closure (lazy evaluation)
    ///
    /// # Errors
    /// Returns `Err(CascadeError)` if the underlying result is `Err`.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<CascadeError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.with_context(|| context.into())
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e.into() {
            CascadeError::UserError(inner) => CascadeError::StreamProcessingError {
                context: format!("{}: {inner}", f()),
            },
            other => other,
        })
    }
}
