#![forbid(unsafe_code)]

//! Construction-time options for computed notifiers.

use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Options for an async computed notifier.
///
/// Default: no debounce, every source change recomputes immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComputedConfig {
    debounce: Option<Duration>,
}

impl ComputedConfig {
    /// Coalesce source changes: only the last change in a quiet window of
    /// `window` triggers a computation.
    pub fn debounced(window: Duration) -> Result<Self> {
        if window.is_zero() {
            return Err(ConfigError::ZeroDebounce);
        }
        Ok(Self {
            debounce: Some(window),
        })
    }

    /// Debounce window, if any.
    #[must_use]
    pub const fn debounce(&self) -> Option<Duration> {
        self.debounce
    }
}
