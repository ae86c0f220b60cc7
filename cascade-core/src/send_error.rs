// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::CascadeError;
use core::fmt;

/// Errors returned to producers pushing into a bridge queue.
///
/// The rejected value is handed back so callers can retry or log it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError<T> {
    /// The consuming side is gone or the producer closed the queue.
    Closed(T),
    /// The bounded queue is full (only returned by non-suspending sends).
    Full(T),
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed(_) => write!(f, "Queue is closed"),
            Self::Full(_) => write!(f, "Queue is full"),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for SendError<T> {}

impl<T> SendError<T> {
    /// Returns the value that could not be sent.
    pub fn into_inner(self) -> T {
        match self {
            Self::Closed(value) | Self::Full(value) => value,
        }
    }

    /// Returns `true` if the queue is closed for good.
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

impl<T> From<SendError<T>> for CascadeError {
    fn from(error: SendError<T>) -> Self {
        match error {
            SendError::Closed(_) => CascadeError::cancelled("queue closed"),
            SendError::Full(_) => CascadeError::stream_error("queue full"),
        }
    }
}
