#![forbid(unsafe_code)]

//! Statecraft public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users:
//! `statecraft::prelude::*` brings in the state type and, with the default
//! `runtime` feature, the notifiers.

pub use statecraft_core::{
    AsyncState, ComputedConfig, ConfigError, MaybeWhen, RetryPolicy, describe_failure,
};

#[cfg(feature = "runtime")]
pub use statecraft_runtime::{
    AsyncComputedNotifier, AsyncStateNotifier, Listenable, Observable, Subscription,
};

pub mod prelude {
    pub use statecraft_core as core;
    #[cfg(feature = "runtime")]
    pub use statecraft_runtime as runtime;

    pub use statecraft_core::{AsyncState, ComputedConfig, RetryPolicy};
    #[cfg(feature = "runtime")]
    pub use statecraft_runtime::{
        AsyncComputedNotifier, AsyncStateNotifier, Listenable, Observable, Subscription,
    };
}
