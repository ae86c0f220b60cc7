// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Execution context threaded through every `run` and `accept` call.
//!
//! The context is explicit: terminal consumption creates (or receives) one and
//! passes it down the whole chain. An operator that wants a different context
//! for its upstream builds a child with [`ExecutionContext::merged`] and keeps
//! handing the original one to its downstream sink.
//!
//! ```
//! use cascade_core::{ExecutionContext, Worker};
//!
//! let root = ExecutionContext::named("ingest").with_entry("tenant", "acme");
//! let io = ExecutionContext::new().with_worker(Worker::Spawned);
//!
//! let upstream = root.merged(&io);
//! assert_eq!(upstream.name(), Some("ingest"));
//! assert_eq!(upstream.worker(), Worker::Spawned);
//! assert_eq!(upstream.get("tenant"), Some("acme"));
//! assert_eq!(root.worker(), Worker::Inline);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

/// Where a run chain executes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Worker {
    /// On the task that called the terminal consumption.
    #[default]
    Inline,
    /// On a separately spawned task of the runtime.
    Spawned,
}

/// Immutable key/value metadata visible to every stage of one execution.
///
/// Cloning is cheap; all builder methods return a new context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    name: Option<Arc<str>>,
    worker: Option<Worker>,
    entries: Arc<BTreeMap<String, String>>,
}

impl ExecutionContext {
    /// An empty context: no name, inline worker, no entries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An otherwise empty context with a logical name.
    #[must_use]
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self::new().with_name(name)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_worker(mut self, worker: Worker) -> Self {
        self.worker = Some(worker);
        self
    }

    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.entries).insert(key.into(), value.into());
        self
    }

    /// Logical name of the execution, if one was given.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Worker affinity; [`Worker::Inline`] unless set.
    pub fn worker(&self) -> Worker {
        self.worker.unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns a child context: `overlay` wins wherever it sets something.
    #[must_use]
    pub fn merged(&self, overlay: &ExecutionContext) -> Self {
        let entries = if overlay.entries.is_empty() {
            self.entries.clone()
        } else if self.entries.is_empty() {
            overlay.entries.clone()
        } else {
            let mut merged = (*self.entries).clone();
            merged.extend(
                overlay
                    .entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
            Arc::new(merged)
        };

        Self {
            name: overlay.name.clone().or_else(|| self.name.clone()),
            worker: overlay.worker.or(self.worker),
            entries,
        }
    }
}
