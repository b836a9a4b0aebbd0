#![forbid(unsafe_code)]

//! Type-erased async producers.
//!
//! A producer is any `Fn() -> impl Future<Output = Result<T, E>>` whose error
//! implements `Display`. [`Producer<T>`] boxes it behind an `Rc` so a notifier
//! can store it and invoke it again later; failures are rendered to a message
//! with [`describe_failure`] at the boundary, so the notifiers only ever deal
//! with `Result<T, String>`.

use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use statecraft_core::describe_failure;

/// Future returned by a [`Producer`]; the error is already a message.
pub type ProducerFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>>>>;

/// A re-invocable async computation.
///
/// Cloning shares the underlying closure.
pub struct Producer<T> {
    run: Rc<dyn Fn() -> ProducerFuture<T>>,
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        Self {
            run: Rc::clone(&self.run),
        }
    }
}

impl<T> std::fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer").finish_non_exhaustive()
    }
}

impl<T: 'static> Producer<T> {
    pub fn new<F, Fut, E>(f: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
        E: Display,
    {
        Self {
            run: Rc::new(move || -> ProducerFuture<T> {
                let fut = f();
                Box::pin(async move { fut.await.map_err(|err| describe_failure(&err)) })
            }),
        }
    }

    /// Start one run. The closure is called synchronously; the returned
    /// future does the rest.
    pub fn invoke(&self) -> ProducerFuture<T> {
        (self.run)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn ok_passes_through() {
        let producer = Producer::new(|| async { Ok::<_, String>(7) });
        assert_eq!(producer.invoke().await, Ok(7));
    }

    #[tokio::test]
    async fn error_is_described() {
        let producer = Producer::<i32>::new(|| async { Err("Exception: boom") });
        assert_eq!(producer.invoke().await, Err("boom".to_string()));
    }

    #[tokio::test]
    async fn closure_runs_at_invoke_time() {
        let calls = Rc::new(Cell::new(0u32));
        let calls_clone = Rc::clone(&calls);
        let producer = Producer::new(move || {
            calls_clone.set(calls_clone.get() + 1);
            async { Ok::<_, String>(()) }
        });

        assert_eq!(calls.get(), 0);
        let fut = producer.invoke();
        assert_eq!(calls.get(), 1);
        fut.await.unwrap();

        let again = producer.clone();
        again.invoke().await.unwrap();
        assert_eq!(calls.get(), 2);
    }
}
