#![forbid(unsafe_code)]

//! Trailing-edge debouncing on the local task set.
//!
//! [`Debouncer::call`] arms a timer for the configured window; calling it
//! again before the timer fires aborts the pending timer and arms a new one.
//! Only the action handed to the last call in a quiet window ever runs.
//!
//! Timers are spawned with [`tokio::task::spawn_local`], so a `Debouncer` must
//! be used from inside a [`tokio::task::LocalSet`].

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Coalesces bursts of calls into one trailing action.
pub struct Debouncer {
    window: Duration,
    pending: Rc<RefCell<Option<JoinHandle<()>>>>,
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("window", &self.window)
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl Debouncer {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Rc::new(RefCell::new(None)),
        }
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Run `action` once `window` has passed without another call.
    ///
    /// # Panics
    ///
    /// Panics when called outside a `LocalSet`.
    pub fn call(&self, action: impl FnOnce() + 'static) {
        let slot = Rc::downgrade(&self.pending);
        let window = self.window;
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(window).await;
            // Fired: the slot no longer describes a pending timer.
            if let Some(slot) = slot.upgrade() {
                slot.borrow_mut().take();
            }
            action();
        });
        let previous = self.pending.borrow_mut().replace(handle);
        if let Some(previous) = previous {
            previous.abort();
            tracing::trace!(window_ms = window.as_millis() as u64, "debounce timer re-armed");
        }
    }

    /// Abort the pending timer, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        let pending = self.pending.borrow_mut().take();
        match pending {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Whether a timer is armed and has not fired yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
