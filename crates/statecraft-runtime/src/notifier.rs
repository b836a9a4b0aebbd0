#![forbid(unsafe_code)]

//! An observable [`AsyncState`] driven by explicit executions.
//!
//! # Design
//!
//! [`AsyncStateNotifier<T>`] wraps an [`Observable<AsyncState<T>>`] together
//! with the most recently executed [`Producer`], so `invalidate` and
//! `refresh` can run it again without the caller repeating itself.
//!
//! Every execution (`execute`, `invalidate`, `refresh`, `refresh_with`)
//! takes a new *generation*. A producer outcome is committed only while its
//! generation is still the latest and the notifier has not been disposed;
//! older outcomes are dropped silently. Manual writes (`set_loading`,
//! `set_data`, `set_error`, `set_progress`) report on the running execution
//! and do not start a new generation, so a producer may stream partial
//! results and still have its final outcome committed.
//!
//! # State machine
//!
//! ```text
//!            execute / invalidate                 success
//!  Data  ─────────────────────────►  Loading  ─────────────► Data
//!  Error ─────────────────────────►          ─────────────► Error
//!                                              exhausted
//!  Data / Error ── refresh ──► Data / Error   (no Loading in between)
//! ```
//!
//! # Failure Modes
//!
//! - **Producer error**: becomes `Error(message)`; nothing propagates to the
//!   caller.
//! - **Write after dispose**: ignored with a `warn!` event.

use std::cell::{Cell, RefCell};
use std::fmt::Display;
use std::future::Future;
use std::rc::Rc;

use statecraft_core::async_state::clamp_progress;
use statecraft_core::{AsyncState, RetryPolicy};

use crate::producer::Producer;
use crate::reactive::{Listenable, Observable, Subscription};

struct NotifierInner<T> {
    state: Observable<AsyncState<T>>,
    last_action: RefCell<Option<Producer<T>>>,
    generation: Cell<u64>,
    disposed: Cell<bool>,
}

/// Observable async state with execute, retry, invalidate and refresh.
///
/// Cloning creates a new handle to the **same** notifier.
pub struct AsyncStateNotifier<T> {
    inner: Rc<NotifierInner<T>>,
}

impl<T> Clone for AsyncStateNotifier<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for AsyncStateNotifier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncStateNotifier")
            .field("state", &self.inner.state)
            .field("generation", &self.inner.generation.get())
            .field("has_action", &self.inner.last_action.borrow().is_some())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Default for AsyncStateNotifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq + 'static> AsyncStateNotifier<T> {
    /// A notifier holding `Loading`.
    #[must_use]
    pub fn new() -> Self {
        Self::from_state(AsyncState::loading())
    }

    /// A notifier pre-seeded with `Data(value)`.
    #[must_use]
    pub fn with_data(value: T) -> Self {
        Self::from_state(AsyncState::Data(value))
    }

    fn from_state(state: AsyncState<T>) -> Self {
        Self {
            inner: Rc::new(NotifierInner {
                state: Observable::new(state),
                last_action: RefCell::new(None),
                generation: Cell::new(0),
                disposed: Cell::new(false),
            }),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    #[must_use]
    pub fn state(&self) -> AsyncState<T> {
        self.inner.state.get()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&AsyncState<T>) -> R) -> R {
        self.inner.state.with(f)
    }

    /// Register an observer of state transitions.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, f: impl Fn(&AsyncState<T>) + 'static) -> Subscription {
        self.inner.state.subscribe(f)
    }

    /// Number of state writes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.state.version()
    }

    /// Number of live observers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.subscriber_count()
    }

    /// Whether a producer has been stored by `execute` or `refresh_with`.
    #[must_use]
    pub fn has_action(&self) -> bool {
        self.inner.last_action.borrow().is_some()
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    // ── Executions ───────────────────────────────────────────────────

    /// Enter `Loading`, run `producer` once, and land in `Data` or `Error`.
    ///
    /// The producer is kept for [`invalidate`](Self::invalidate) and
    /// [`refresh`](Self::refresh).
    pub async fn execute<F, Fut, E>(&self, producer: F)
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
        E: Display,
    {
        self.run(Producer::new(producer), None).await;
    }

    /// Like [`execute`](Self::execute), retrying failures with exponential
    /// back-off. Only the failure of the last allowed attempt becomes
    /// `Error`.
    pub async fn execute_with_retry<F, Fut, E>(&self, producer: F, policy: RetryPolicy)
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
        E: Display,
    {
        self.run(Producer::new(producer), Some(policy)).await;
    }

    /// Execute the stored producer again. No-op if nothing was ever executed.
    pub async fn invalidate(&self) {
        if let Some(producer) = self.stored_action() {
            self.run(producer, None).await;
        }
    }

    /// [`invalidate`](Self::invalidate) with retries.
    pub async fn invalidate_with_retry(&self, policy: RetryPolicy) {
        if let Some(producer) = self.stored_action() {
            self.run(producer, Some(policy)).await;
        }
    }

    /// Run the stored producer once without entering `Loading`; the previous
    /// `Data` or `Error` stays visible until the new outcome lands. No-op if
    /// nothing was ever executed. Never retries.
    pub async fn refresh(&self) {
        if let Some(producer) = self.stored_action() {
            self.refresh_once(producer).await;
        }
    }

    /// [`refresh`](Self::refresh) with a new producer, which also replaces
    /// the stored one.
    pub async fn refresh_with<F, Fut, E>(&self, producer: F)
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
        E: Display,
    {
        self.refresh_once(Producer::new(producer)).await;
    }

    // ── Manual writes ────────────────────────────────────────────────

    pub fn set_loading(&self) {
        self.write_manual(AsyncState::loading());
    }

    pub fn set_data(&self, value: T) {
        self.write_manual(AsyncState::Data(value));
    }

    pub fn set_error(&self, message: impl Into<String>) {
        self.write_manual(AsyncState::error(message));
    }

    /// Update the progress of a `Loading` state. Ignored in any other
    /// state, after dispose, and for NaN.
    pub fn set_progress(&self, progress: f64) {
        if self.is_disposed() || !self.inner.state.with(AsyncState::is_loading) {
            return;
        }
        if let Some(progress) = clamp_progress(progress) {
            self.inner.state.replace(AsyncState::Loading {
                progress: Some(progress),
            });
        }
    }

    /// Stop accepting writes, forget the stored producer and release every
    /// observer. Safe to call more than once.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        self.inner.last_action.borrow_mut().take();
        self.inner.state.clear_subscribers();
        tracing::debug!(
            generation = self.inner.generation.get(),
            "async state notifier disposed"
        );
    }

    // ── Internals ────────────────────────────────────────────────────

    fn stored_action(&self) -> Option<Producer<T>> {
        self.inner.last_action.borrow().clone()
    }

    fn next_generation(&self) -> u64 {
        let generation = self.inner.generation.get() + 1;
        self.inner.generation.set(generation);
        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        !self.is_disposed() && self.inner.generation.get() == generation
    }

    fn write_manual(&self, state: AsyncState<T>) {
        if self.is_disposed() {
            tracing::warn!("write to disposed async state notifier ignored");
            return;
        }
        self.inner.state.replace(state);
    }

    /// Take a generation and store `producer` for later re-runs.
    fn begin(&self, producer: &Producer<T>) -> Option<u64> {
        if self.is_disposed() {
            tracing::warn!("execution on disposed async state notifier ignored");
            return None;
        }
        *self.inner.last_action.borrow_mut() = Some(producer.clone());
        Some(self.next_generation())
    }

    async fn run(&self, producer: Producer<T>, retry: Option<RetryPolicy>) {
        let Some(generation) = self.begin(&producer) else {
            return;
        };
        tracing::debug!(generation, retry = retry.is_some(), "execute started");
        self.inner.state.replace(AsyncState::loading());

        let outcome = match retry {
            None => producer.invoke().await,
            Some(policy) => self.attempt_with_retry(&producer, policy, generation).await,
        };
        self.commit(generation, outcome);
    }

    async fn refresh_once(&self, producer: Producer<T>) {
        let Some(generation) = self.begin(&producer) else {
            return;
        };
        tracing::debug!(generation, "refresh started");
        let outcome = producer.invoke().await;
        self.commit(generation, outcome);
    }

    async fn attempt_with_retry(
        &self,
        producer: &Producer<T>,
        policy: RetryPolicy,
        generation: u64,
    ) -> Result<T, String> {
        let mut attempt = 0u32;
        loop {
            let message = match producer.invoke().await {
                Ok(value) => return Ok(value),
                Err(message) => message,
            };
            if !policy.should_retry(attempt) || !self.is_current(generation) {
                return Err(message);
            }
            let delay = policy.delay_for(attempt);
            tracing::debug!(
                generation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %message,
                "producer failed, retry scheduled"
            );
            tokio::time::sleep(delay).await;
            if !self.is_current(generation) {
                return Err(message);
            }
            attempt += 1;
        }
    }

    fn commit(&self, generation: u64, outcome: Result<T, String>) {
        if !self.is_current(generation) {
            tracing::trace!(
                generation,
                latest = self.inner.generation.get(),
                disposed = self.is_disposed(),
                "stale outcome discarded"
            );
            return;
        }
        let next = match outcome {
            Ok(value) => AsyncState::Data(value),
            Err(message) => {
                tracing::debug!(generation, error = %message, "producer failed");
                AsyncState::Error(message)
            }
        };
        self.inner.state.replace(next);
    }
}

impl<T: 'static> Listenable for AsyncStateNotifier<T> {
    fn listen(&self, callback: Box<dyn Fn()>) -> Subscription {
        self.inner.state.listen(callback)
    }
}
