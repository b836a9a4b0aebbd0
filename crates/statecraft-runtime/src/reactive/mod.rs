#![forbid(unsafe_code)]

//! Reactive primitives the async notifiers are built on.
//!
//! - [`Observable`]: a shared, version-tracked value wrapper with change
//!   notification via subscriber callbacks.
//! - [`Subscription`]: RAII guard that automatically unsubscribes on drop.
//! - [`Listenable`]: object-safe "notify me on change" capability, implemented
//!   by `Observable` and by both notifiers.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are stored as `Weak` function pointers and cleaned up lazily
//! during notification.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per notifying write.
//! 2. Subscribers are notified in registration order.
//! 3. `set` with a value equal to the current value is a no-op (no version
//!    bump, no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.

pub mod listenable;
pub mod observable;

pub use listenable::Listenable;
pub use observable::{Observable, Subscription};
