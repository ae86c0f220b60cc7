// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Stand-in for an external listener API, for bridging tests.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Handle returned by [`FakeCallbackRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegistrationId(u64);

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

struct RegistryState<T> {
    next_id: u64,
    callbacks: BTreeMap<u64, Callback<T>>,
    registrations: usize,
    unregistrations: usize,
}

/// Callback registry that counts registrations, so tests can assert that a
/// bridged listener is unregistered exactly once.
///
/// ```rust
/// use cascade_test_utils::FakeCallbackRegistry;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
///
/// let registry = FakeCallbackRegistry::new();
/// let total = Arc::new(AtomicU32::new(0));
/// let sum = total.clone();
///
/// let id = registry.register(move |v: u32| {
///     sum.fetch_add(v, Ordering::SeqCst);
/// });
/// assert_eq!(registry.fire(5), 1);
/// assert!(registry.unregister(id));
/// assert_eq!(registry.fire(5), 0);
///
/// assert_eq!(total.load(Ordering::SeqCst), 5);
/// assert_eq!(registry.unregistrations(), 1);
/// ```
pub struct FakeCallbackRegistry<T> {
    state: Arc<Mutex<RegistryState<T>>>,
}

impl<T> FakeCallbackRegistry<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState {
                next_id: 0,
                callbacks: BTreeMap::new(),
                registrations: 0,
                unregistrations: 0,
            })),
        }
    }

    pub fn register<F>(&self, callback: F) -> RegistrationId
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.registrations += 1;
        state.callbacks.insert(id, Arc::new(callback));
        RegistrationId(id)
    }

    /// Returns `false` if `id` was not registered (or already removed).
    pub fn unregister(&self, id: RegistrationId) -> bool {
        let mut state = self.state.lock();
        let removed = state.callbacks.remove(&id.0).is_some();
        if removed {
            state.unregistrations += 1;
        }
        removed
    }

    /// Invokes every registered callback outside the lock; returns how many ran.
    pub fn fire(&self, value: T) -> usize
    where
        T: Clone,
    {
        let callbacks: Vec<Callback<T>> = self.state.lock().callbacks.values().cloned().collect();
        for callback in &callbacks {
            callback(value.clone());
        }
        callbacks.len()
    }

    /// Number of currently registered callbacks.
    pub fn active(&self) -> usize {
        self.state.lock().callbacks.len()
    }

    pub fn registrations(&self) -> usize {
        self.state.lock().registrations
    }

    pub fn unregistrations(&self) -> usize {
        self.state.lock().unregistrations
    }
}

impl<T> Default for FakeCallbackRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for FakeCallbackRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}
