// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Turning a cold flow into a hot, shared one.
//!
//! [`ShareInExt::share_in`] publishes one upstream execution into a
//! [`Broadcast`]; [`StateInExt::state_in`] publishes it into a [`StateCell`].
//! A driver task owned by the given [`CascadeScope`] starts and stops the
//! upstream according to a [`SharingPolicy`]. Cancelling the scope stops
//! production; the returned hot object and its cached values stay usable.

use crate::broadcast::{Broadcast, BroadcastConfig};
use crate::sharing::{SharingEffect, SharingEvent, SharingPolicy, SharingStateMachine};
use crate::state_cell::{StateCell, StateSubscription};
use crate::subscription::Subscription;
use crate::subscription_count::{CountSnapshot, SubscriptionCount};
use async_trait::async_trait;
use cascade_core::{CascadeError, CascadeScope, ExecutionContext, Flow, FlowSink, Result};
use cascade_runtime::{Timer, TokioTimer};
use core::future::Future;
use core::pin::Pin;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::sync::Arc;

/// Where the driver publishes upstream values.
#[async_trait]
trait ShareTarget<T>: Send + Sync + 'static {
    async fn publish(&self, value: T);

    /// Drops whatever late subscribers would otherwise receive first.
    fn reset(&self);

    fn subscription_count(&self) -> SubscriptionCount;
}

#[async_trait]
impl<T> ShareTarget<T> for Broadcast<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn publish(&self, value: T) {
        self.emit(value).await;
    }

    fn reset(&self) {
        self.reset_replay_cache();
    }

    fn subscription_count(&self) -> SubscriptionCount {
        Broadcast::subscription_count(self)
    }
}

struct StateTarget<T> {
    cell: StateCell<T>,
    initial: T,
}

#[async_trait]
impl<T> ShareTarget<T> for StateTarget<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    async fn publish(&self, value: T) {
        self.cell.set(value);
    }

    fn reset(&self) {
        self.cell.set(self.initial.clone());
    }

    fn subscription_count(&self) -> SubscriptionCount {
        self.cell.subscription_count()
    }
}

struct PublishSink<'a, G> {
    target: &'a G,
}

#[async_trait]
impl<T, G> FlowSink<T> for PublishSink<'_, G>
where
    T: Send + 'static,
    G: ShareTarget<T>,
{
    async fn accept(&mut self, _ctx: &ExecutionContext, value: T) -> Result<()> {
        self.target.publish(value).await;
        Ok(())
    }
}

#[derive(Default)]
struct ShareStatus {
    upstream_error: Mutex<Option<CascadeError>>,
}

impl ShareStatus {
    fn record(&self, error: CascadeError) {
        *self.upstream_error.lock() = Some(error);
    }

    fn upstream_error(&self) -> Option<CascadeError> {
        self.upstream_error.lock().clone()
    }
}

fn produce<T, F, G>(upstream: Arc<F>, target: Arc<G>) -> BoxFuture<'static, Result<()>>
where
    T: Send + 'static,
    F: Flow<T> + 'static,
    G: ShareTarget<T>,
{
    Box::pin(async move {
        let ctx = ExecutionContext::named("share");
        let mut sink = PublishSink { target: &*target };
        upstream.run(&ctx, &mut sink).await
    })
}

/// Resolves when the armed timer fires and disarms it; pends forever when unarmed.
async fn fire<S>(timer: &mut Option<Pin<Box<S>>>)
where
    S: Future<Output = ()>,
{
    match timer.as_mut() {
        Some(sleep) => {
            sleep.await;
            *timer = None;
        }
        None => futures::future::pending().await,
    }
}

async fn finish(production: &mut Option<BoxFuture<'static, Result<()>>>) -> Result<()> {
    match production.as_mut() {
        Some(run) => {
            let result = run.await;
            *production = None;
            result
        }
        None => futures::future::pending().await,
    }
}

/// Feeds a subscriber count change to the machine.
///
/// A subscriber that attached and detached while the driver was busy still
/// counts as an attach, so it is replayed before the current count.
fn observe(
    machine: &mut SharingStateMachine,
    last: CountSnapshot,
    now: CountSnapshot,
    effects: &mut Vec<SharingEffect>,
) {
    if now.missed_attach(last) {
        effects.extend(machine.handle(SharingEvent::SubscribersChanged(1)));
    }
    effects.extend(machine.handle(SharingEvent::SubscribersChanged(now.value)));
}

async fn drive<T, F, G, Tm>(
    upstream: Arc<F>,
    target: Arc<G>,
    policy: SharingPolicy,
    timer: Tm,
    status: Arc<ShareStatus>,
) where
    T: Send + 'static,
    F: Flow<T> + 'static,
    G: ShareTarget<T>,
    Tm: Timer,
{
    let count = target.subscription_count();
    let mut machine = SharingStateMachine::new(policy);
    let mut production: Option<BoxFuture<'static, Result<()>>> = None;
    let mut stop_timer: Option<Pin<Box<Tm::Sleep>>> = None;
    let mut expiry_timer: Option<Pin<Box<Tm::Sleep>>> = None;

    let mut observed = count.snapshot();
    let mut effects = machine.start();
    observe(&mut machine, CountSnapshot::default(), observed, &mut effects);

    loop {
        for effect in effects.drain(..) {
            match effect {
                SharingEffect::Start => {
                    info!("share: starting upstream");
                    production = Some(produce(upstream.clone(), target.clone()));
                }
                SharingEffect::Stop => {
                    if production.take().is_some() {
                        info!("share: upstream stopped, no subscribers left");
                    }
                }
                SharingEffect::ScheduleStop(delay) => {
                    debug!("share: stopping in {delay:?} unless a subscriber attaches");
                    stop_timer = Some(Box::pin(timer.sleep_future(delay)));
                }
                SharingEffect::CancelScheduledStop => stop_timer = None,
                SharingEffect::ScheduleReplayExpiry(expiry) => {
                    expiry_timer = Some(Box::pin(timer.sleep_future(expiry)));
                }
                SharingEffect::CancelReplayExpiry => expiry_timer = None,
                SharingEffect::ResetReplayCache => {
                    debug!("share: replay cache reset");
                    target.reset();
                }
            }
        }

        tokio::select! {
            now = count.transition(observed) => {
                observe(&mut machine, observed, now, &mut effects);
                observed = now;
            }
            () = fire(&mut stop_timer) => {
                effects = machine.handle(SharingEvent::StopDelayElapsed);
            }
            () = fire(&mut expiry_timer) => {
                effects = machine.handle(SharingEvent::ReplayExpired);
            }
            result = finish(&mut production) => match result {
                Ok(()) => info!("share: upstream completed"),
                Err(e) if e.is_failure() => {
                    error!("share: upstream failed: {e}");
                    status.record(e);
                }
                Err(e) => debug!("share: upstream ended: {e}"),
            },
        }
    }
}

fn spawn_driver<T, F, G>(
    scope: &CascadeScope,
    upstream: F,
    target: G,
    policy: SharingPolicy,
    status: Arc<ShareStatus>,
) where
    T: Send + 'static,
    F: Flow<T> + 'static,
    G: ShareTarget<T>,
{
    let upstream = Arc::new(upstream);
    let target = Arc::new(target);
    scope.spawn_owned(move |_token| drive(upstream, target, policy, TokioTimer, status));
}

/// Hot flow backed by a [`Broadcast`], produced by [`ShareInExt::share_in`].
pub struct SharedFlow<T> {
    broadcast: Broadcast<T>,
    status: Arc<ShareStatus>,
}

impl<T> Clone for SharedFlow<T> {
    fn clone(&self) -> Self {
        Self {
            broadcast: self.broadcast.clone(),
            status: self.status.clone(),
        }
    }
}

impl<T> SharedFlow<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Attaches a subscriber; under lazy policies this may start upstream.
    pub fn attach(&self) -> Subscription<T> {
        self.broadcast.attach()
    }

    pub fn replay_cache(&self) -> Vec<T> {
        self.broadcast.replay_cache()
    }

    pub fn subscription_count(&self) -> SubscriptionCount {
        self.broadcast.subscription_count()
    }

    pub fn subscriber_count(&self) -> usize {
        self.broadcast.subscriber_count()
    }

    /// The most recent upstream failure, if any.
    pub fn upstream_error(&self) -> Option<CascadeError> {
        self.status.upstream_error()
    }

    pub fn broadcast(&self) -> &Broadcast<T> {
        &self.broadcast
    }
}

#[async_trait]
impl<T> Flow<T> for SharedFlow<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        self.broadcast.as_flow().run(ctx, sink).await
    }
}

/// Hot flow backed by a [`StateCell`], produced by [`StateInExt::state_in`].
pub struct StateFlow<T> {
    cell: StateCell<T>,
    status: Arc<ShareStatus>,
}

impl<T> Clone for StateFlow<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            status: self.status.clone(),
        }
    }
}

impl<T> StateFlow<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// The current value; the initial one until upstream publishes.
    pub fn value(&self) -> T {
        self.cell.get()
    }

    /// Watches the value; under lazy policies this may start upstream.
    pub fn watch(&self) -> StateSubscription<T> {
        self.cell.watch()
    }

    pub fn subscription_count(&self) -> SubscriptionCount {
        self.cell.subscription_count()
    }

    pub fn subscriber_count(&self) -> usize {
        self.cell.subscriber_count()
    }

    /// The most recent upstream failure, if any.
    pub fn upstream_error(&self) -> Option<CascadeError> {
        self.status.upstream_error()
    }

    pub fn cell(&self) -> &StateCell<T> {
        &self.cell
    }
}

#[async_trait]
impl<T> Flow<T> for StateFlow<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    async fn run(&self, ctx: &ExecutionContext, sink: &mut dyn FlowSink<T>) -> Result<()> {
        self.cell.as_flow().run(ctx, sink).await
    }
}

/// Extension trait providing [`share_in`](Self::share_in) for every flow.
pub trait ShareInExt<T>: Flow<T> + Sized + 'static
where
    T: Clone + Send + Sync + 'static,
{
    /// Shares one upstream execution among all subscribers.
    ///
    /// New subscribers first receive the last `replay` values.
    ///
    /// ```
    /// use cascade_core::CascadeScope;
    /// use cascade_hot::{ShareInExt, SharingPolicy};
    /// use cascade_stream::flow_of;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let scope = CascadeScope::new();
    /// let shared = flow_of([1, 2, 3]).share_in(&scope, SharingPolicy::Lazy, 3);
    ///
    /// let subscriber = shared.attach();
    /// assert_eq!(subscriber.next().await, 1);
    /// # scope.cancel_and_join().await;
    /// # }
    /// ```
    fn share_in(self, scope: &CascadeScope, policy: SharingPolicy, replay: usize) -> SharedFlow<T> {
        self.share_in_with(scope, policy, BroadcastConfig::with_replay(replay))
    }

    /// [`share_in`](Self::share_in) with full control over the broadcast.
    fn share_in_with(
        self,
        scope: &CascadeScope,
        policy: SharingPolicy,
        config: BroadcastConfig,
    ) -> SharedFlow<T> {
        let broadcast = Broadcast::new(config);
        let status = Arc::new(ShareStatus::default());
        spawn_driver(scope, self, broadcast.clone(), policy, status.clone());
        SharedFlow { broadcast, status }
    }
}

impl<T, F> ShareInExt<T> for F
where
    T: Clone + Send + Sync + 'static,
    F: Flow<T> + 'static,
{
}

/// Extension trait providing [`state_in`](Self::state_in) for every flow.
pub trait StateInExt<T>: Flow<T> + Sized + 'static
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Keeps the latest upstream value in a [`StateCell`] starting at `initial`.
    ///
    /// When a replay expiry elapses the value returns to `initial`.
    fn state_in(self, scope: &CascadeScope, policy: SharingPolicy, initial: T) -> StateFlow<T> {
        let cell = StateCell::new(initial.clone());
        let status = Arc::new(ShareStatus::default());
        let target = StateTarget {
            cell: cell.clone(),
            initial,
        };
        spawn_driver(scope, self, target, policy, status.clone());
        StateFlow { cell, status }
    }
}

impl<T, F> StateInExt<T> for F
where
    T: Clone + PartialEq + Send + Sync + 'static,
    F: Flow<T> + 'static,
{
}
