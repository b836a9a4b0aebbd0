#![forbid(unsafe_code)]

//! An [`AsyncState`] kept in sync with an async function of other values.
//!
//! # Design
//!
//! [`AsyncComputedNotifier<T>`] listens to a set of [`Listenable`] sources.
//! Each change requests a recomputation: immediately, or through a
//! [`Debouncer`] when a window is configured. Every recomputation takes the
//! next value of a version counter *before* the compute function is called,
//! and its outcome is committed only if that version is still the latest
//! when it resolves. Older computations are never aborted; their results are
//! simply dropped.
//!
//! Listener-triggered computations and debounce timers run as local tasks
//! (`tokio::task::spawn_local`). Those tasks hold only a `Weak` reference to
//! the notifier.
//!
//! # Invariants
//!
//! 1. Only the most recently *started* computation's outcome is ever
//!    committed, whatever the completion order.
//! 2. Within one debounce window at most one computation starts, and it
//!    reads the sources as they are when the window closes.
//! 3. After [`dispose`](AsyncComputedNotifier::dispose) no source listener
//!    is registered, no timer is pending, and no outcome is committed.
//!
//! # Failure Modes
//!
//! - **Compute error**: becomes `Error(message)` if still current.
//! - **Source dropped**: its subscription goes inert; the notifier keeps its
//!   last state and keeps reacting to the remaining sources.
//! - **No `LocalSet`**: a source change panics inside the source's write,
//!   and later subscribers of that source are not notified for that write.
//!   The notifier's version and state are left as they were.

use std::cell::{Cell, RefCell};
use std::fmt::Display;
use std::future::Future;
use std::rc::{Rc, Weak};

use statecraft_core::{AsyncState, ComputedConfig};
use tokio::sync::oneshot;

use crate::debounce::Debouncer;
use crate::producer::{Producer, ProducerFuture};
use crate::reactive::{Listenable, Observable, Subscription};

/// Shared interior for [`AsyncComputedNotifier<T>`].
struct ComputedInner<T> {
    state: Observable<AsyncState<T>>,
    compute: Producer<T>,
    /// Version of the most recently started computation.
    version: Cell<u64>,
    debouncer: Option<Debouncer>,
    /// Source listeners; dropped on dispose.
    subscriptions: RefCell<Vec<Subscription>>,
    disposed: Cell<bool>,
}

/// A started computation: its version tag and the pending result.
struct Job<T> {
    version: u64,
    future: ProducerFuture<T>,
}

/// Async derived state with debounce and last-write-wins commits.
///
/// Cloning creates a new handle to the **same** notifier.
pub struct AsyncComputedNotifier<T> {
    inner: Rc<ComputedInner<T>>,
}

impl<T> Clone for AsyncComputedNotifier<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for AsyncComputedNotifier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncComputedNotifier")
            .field("state", &self.inner.state)
            .field("version", &self.inner.version.get())
            .field("debouncer", &self.inner.debouncer)
            .field("sources", &self.inner.subscriptions.borrow().len())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> AsyncComputedNotifier<T> {
    /// Start in `Loading` and compute right away. Every source change
    /// recomputes immediately.
    ///
    /// # Panics
    ///
    /// Panics when called outside a `tokio::task::LocalSet`.
    pub fn new<F, Fut, E>(sources: &[&dyn Listenable], compute: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
        E: Display,
    {
        Self::with_config(sources, compute, ComputedConfig::default())
    }

    /// Start in `Loading` and compute right away, with options.
    ///
    /// # Panics
    ///
    /// Panics when called outside a `tokio::task::LocalSet`.
    pub fn with_config<F, Fut, E>(
        sources: &[&dyn Listenable],
        compute: F,
        config: ComputedConfig,
    ) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
        E: Display,
    {
        let notifier = Self::build(
            AsyncState::loading(),
            sources,
            Producer::new(compute),
            config,
        );
        ComputedInner::spawn_compute(&notifier.inner, true);
        notifier
    }

    /// Start in `Data(initial)`. Nothing is computed until a source changes
    /// or a recomputation is forced.
    ///
    /// # Panics
    ///
    /// Construction itself never spawns. A later source change does, so it
    /// panics inside the source's write (for example `Observable::set`) when
    /// that write happens outside a `tokio::task::LocalSet`. The notifier
    /// keeps its state and version in that case.
    pub fn seeded<F, Fut, E>(
        initial: T,
        sources: &[&dyn Listenable],
        compute: F,
        config: ComputedConfig,
    ) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
        E: Display,
    {
        Self::build(
            AsyncState::Data(initial),
            sources,
            Producer::new(compute),
            config,
        )
    }

    fn build(
        initial: AsyncState<T>,
        sources: &[&dyn Listenable],
        compute: Producer<T>,
        config: ComputedConfig,
    ) -> Self {
        let inner = Rc::new(ComputedInner {
            state: Observable::new(initial),
            compute,
            version: Cell::new(0),
            debouncer: config.debounce().map(Debouncer::new),
            subscriptions: RefCell::new(Vec::with_capacity(sources.len())),
            disposed: Cell::new(false),
        });

        let subscriptions: Vec<Subscription> = sources
            .iter()
            .map(|source| {
                let weak = Rc::downgrade(&inner);
                source.listen(Box::new(move || {
                    if let Some(strong) = weak.upgrade() {
                        ComputedInner::on_source_changed(&strong);
                    }
                }))
            })
            .collect();
        *inner.subscriptions.borrow_mut() = subscriptions;

        Self { inner }
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

    /// Version of the most recently started computation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Number of live observers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.subscriber_count()
    }

    /// Whether a debounced recomputation is waiting for its window to close.
    #[must_use]
    pub fn has_pending_debounce(&self) -> bool {
        self.inner
            .debouncer
            .as_ref()
            .is_some_and(Debouncer::is_pending)
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    // ── Forced recomputation ─────────────────────────────────────────

    /// Recompute now, through `Loading`. Cancels a pending debounced
    /// recomputation. Resolves once the outcome is committed or discarded.
    pub async fn recompute(&self) {
        self.force(true).await;
    }

    /// Recompute now without entering `Loading`: the current `Data` or
    /// `Error` stays visible until the new outcome lands. Cancels a pending
    /// debounced recomputation.
    pub async fn refresh(&self) {
        self.force(false).await;
    }

    async fn force(&self, show_loading: bool) {
        if let Some(debouncer) = &self.inner.debouncer {
            debouncer.cancel();
        }
        if let Some(job) = self.inner.begin(show_loading) {
            ComputedInner::finish(Rc::downgrade(&self.inner), job).await;
        }
    }

    /// Unsubscribe from every source, cancel the pending timer, and drop any
    /// outcome still in flight. Safe to call more than once.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let subscriptions = std::mem::take(&mut *self.inner.subscriptions.borrow_mut());
        let released = subscriptions.len();
        drop(subscriptions);
        if let Some(debouncer) = &self.inner.debouncer {
            debouncer.cancel();
        }
        self.inner.state.clear_subscribers();
        tracing::debug!(
            version = self.inner.version.get(),
            released,
            "async computed notifier disposed"
        );
    }
}

impl<T: Clone + PartialEq + 'static> ComputedInner<T> {
    /// Runs inside the source's notification loop. Outside a `LocalSet` the
    /// spawn below panics there, in the source owner's write.
    fn on_source_changed(this: &Rc<Self>) {
        if this.disposed.get() {
            return;
        }
        match &this.debouncer {
            Some(debouncer) => {
                let weak = Rc::downgrade(this);
                debouncer.call(move || {
                    if let Some(strong) = weak.upgrade() {
                        Self::spawn_compute(&strong, true);
                    }
                });
            }
            None => Self::spawn_compute(this, true),
        }
    }

    /// Start a computation and let a local task wait for it.
    ///
    /// The task is spawned before the version moves or `Loading` is written,
    /// so a failed spawn leaves the notifier untouched.
    fn spawn_compute(this: &Rc<Self>, show_loading: bool) {
        let (tx, rx) = oneshot::channel::<Job<T>>();
        let weak = Rc::downgrade(this);
        tokio::task::spawn_local(async move {
            if let Ok(job) = rx.await {
                Self::finish(weak, job).await;
            }
        });
        if let Some(job) = this.begin(show_loading) {
            let _ = tx.send(job);
        }
    }

    /// Tag a new computation and call the compute function.
    fn begin(&self, show_loading: bool) -> Option<Job<T>> {
        if self.disposed.get() {
            return None;
        }
        let version = self.version.get() + 1;
        self.version.set(version);
        tracing::debug!(version, show_loading, "recomputation started");
        if show_loading {
            self.state.replace(AsyncState::loading());
        }
        Some(Job {
            version,
            future: self.compute.invoke(),
        })
    }

    async fn finish(weak: Weak<Self>, job: Job<T>) {
        let outcome = job.future.await;
        if let Some(inner) = weak.upgrade() {
            inner.commit(job.version, outcome);
        }
    }

    fn commit(&self, version: u64, outcome: Result<T, String>) {
        let latest = self.version.get();
        if self.disposed.get() || version != latest {
            tracing::trace!(
                version,
                latest,
                disposed = self.disposed.get(),
                "stale computation discarded"
            );
            return;
        }
        let next = match outcome {
            Ok(value) => AsyncState::Data(value),
            Err(message) => {
                tracing::debug!(version, error = %message, "computation failed");
                AsyncState::Error(message)
            }
        };
        self.state.replace(next);
    }
}

impl<T: 'static> Listenable for AsyncComputedNotifier<T> {
    fn listen(&self, callback: Box<dyn Fn()>) -> Subscription {
        self.inner.state.listen(callback)
    }
}
