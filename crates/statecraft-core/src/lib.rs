#![forbid(unsafe_code)]

//! Core: async state values, retry policies, and configuration.
//!
//! Nothing in this crate runs asynchronously; it holds the data types shared
//! by the notifiers in `statecraft-runtime`.

pub mod async_state;
pub mod config;
pub mod error;
pub mod retry;

pub use async_state::{AsyncState, MaybeWhen};
pub use config::ComputedConfig;
pub use error::{ConfigError, describe_failure};
pub use retry::RetryPolicy;
