#![forbid(unsafe_code)]

//! Payload-free change notification.
//!
//! [`Listenable`] is the one capability a computed notifier needs from its
//! sources: "tell me when you change". Listeners re-read whatever state they
//! care about themselves. The trait is object safe so a notifier can depend
//! on sources of different value types through `&dyn Listenable`.

use super::observable::Subscription;

/// Something that can report that it changed.
pub trait Listenable {
    /// Register `callback`; it stays registered while the returned guard is
    /// alive.
    fn listen(&self, callback: Box<dyn Fn()>) -> Subscription;
}

impl<L: Listenable + ?Sized> Listenable for &L {
    fn listen(&self, callback: Box<dyn Fn()>) -> Subscription {
        (**self).listen(callback)
    }
}
