//! Fetch Operation Module
//!
//! Wraps the caller-supplied asynchronous producer that populates a scope.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

// == Fetch Future ==
/// Boxed future produced by one invocation of a fetch operation.
pub type FetchFuture<T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send>>;

// == Fetch Operation ==
/// A re-invocable asynchronous producer of a scope's value.
///
/// The same operation is invoked once per cache miss and once per refresh of
/// its scope, so the wrapped closure must be callable any number of times.
/// Cloning is cheap; clones share the closure behind an `Arc`.
pub struct FetchOp<T> {
    run: Arc<dyn Fn() -> FetchFuture<T> + Send + Sync>,
}

impl<T> FetchOp<T> {
    // == Constructor ==
    /// Wraps a closure that produces a fresh future on every invocation.
    ///
    /// # Arguments
    /// * `f` - Closure building one fetch attempt; errors are reported as `anyhow::Error`
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self {
            run: Arc::new(move || -> FetchFuture<T> { Box::pin(f()) }),
        }
    }

    // == Invoke ==
    /// Starts one invocation of the operation.
    pub fn invoke(&self) -> FetchFuture<T> {
        (self.run)()
    }
}

impl<T> Clone for FetchOp<T> {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
        }
    }
}

impl<T> fmt::Debug for FetchOp<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOp").finish_non_exhaustive()
    }
}
