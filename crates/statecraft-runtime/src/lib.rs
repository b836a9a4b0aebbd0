#![forbid(unsafe_code)]

//! Runtime: observable values and async state notifiers.
//!
//! - [`reactive`]: `Observable`, `Subscription`, and the `Listenable`
//!   capability.
//! - [`AsyncStateNotifier`]: explicit `execute` with retry, `invalidate`,
//!   `refresh`, and progress reporting.
//! - [`AsyncComputedNotifier`]: recomputes from its sources with optional
//!   debounce; only the latest computation is ever committed.
//!
//! Everything here is single-threaded (`Rc`-based). Background work runs on
//! a `tokio::task::LocalSet`.

pub mod computed_notifier;
pub mod debounce;
pub mod notifier;
pub mod producer;
pub mod reactive;

pub use computed_notifier::AsyncComputedNotifier;
pub use debounce::Debouncer;
pub use notifier::AsyncStateNotifier;
pub use producer::{Producer, ProducerFuture};
pub use reactive::{Listenable, Observable, Subscription};
pub use statecraft_core::{AsyncState, ComputedConfig, ConfigError, RetryPolicy};
