// src/exec/registry.rs

//! Handler registry: task kind -> handler.
//!
//! The executor looks handlers up by the task's `kind`. A registry is built
//! once, then frozen behind an `Arc` and shared by every worker.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::warn;

/// Boxed future returned by a handler.
pub type HandlerFuture<R, E> = Pin<Box<dyn Future<Output = Result<R, E>> + Send + 'static>>;

/// Work performed for one task kind.
///
/// Closures are registered through [`HandlerRegistry::register`]; implement
/// this trait directly for handlers that carry their own state.
pub trait TaskHandler<P, R, E>: Send + Sync {
    fn call(&self, payload: P) -> HandlerFuture<R, E>;
}

/// Adapts an async closure.
struct FnHandler<F>(F);

impl<P, R, E, F, Fut> TaskHandler<P, R, E> for FnHandler<F>
where
    F: Fn(P) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    fn call(&self, payload: P) -> HandlerFuture<R, E> {
        Box::pin((self.0)(payload))
    }
}

/// Adapts a synchronous closure; runs on tokio's blocking pool.
struct BlockingHandler<F>(Arc<F>);

impl<P, R, E, F> TaskHandler<P, R, E> for BlockingHandler<F>
where
    F: Fn(P) -> Result<R, E> + Send + Sync + 'static,
    P: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    fn call(&self, payload: P) -> HandlerFuture<R, E> {
        let f = Arc::clone(&self.0);
        Box::pin(async move {
            match tokio::task::spawn_blocking(move || f(payload)).await {
                Ok(result) => result,
                // Re-raise so the worker records the task as panicked.
                Err(join) if join.is_panic() => std::panic::resume_unwind(join.into_panic()),
                Err(join) => panic!("blocking handler did not finish: {join}"),
            }
        })
    }
}

/// Maps task kinds to handlers.
pub struct HandlerRegistry<P, R, E> {
    handlers: HashMap<String, Arc<dyn TaskHandler<P, R, E>>>,
}

impl<P, R, E> Default for HandlerRegistry<P, R, E> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<P, R, E> fmt::Debug for HandlerRegistry<P, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("HandlerRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

impl<P, R, E> HandlerRegistry<P, R, E>
where
    P: 'static,
    R: 'static,
    E: 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async handler for `kind`, replacing any previous one.
    pub fn register<F, Fut>(&mut self, kind: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        self.register_handler(kind, FnHandler(handler))
    }

    /// Register a synchronous handler that may block.
    pub fn register_blocking<F>(&mut self, kind: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(P) -> Result<R, E> + Send + Sync + 'static,
        P: Send,
        R: Send,
        E: Send,
    {
        self.register_handler(kind, BlockingHandler(Arc::new(handler)))
    }

    pub fn register_handler(
        &mut self,
        kind: impl Into<String>,
        handler: impl TaskHandler<P, R, E> + 'static,
    ) -> &mut Self {
        let kind = kind.into();
        if self.handlers.insert(kind.clone(), Arc::new(handler)).is_some() {
            warn!(kind = %kind, "replacing previously registered handler");
        }
        self
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn TaskHandler<P, R, E>>> {
        self.handlers.get(kind).cloned()
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(|k| k.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn double(n: u32) -> Result<u32, String> {
        Ok(n * 2)
    }

    #[tokio::test]
    async fn registered_closure_is_callable() {
        let mut registry: HandlerRegistry<u32, u32, String> = HandlerRegistry::new();
        registry.register("double", double);

        let handler = registry.get("double").expect("handler registered");
        assert_eq!(handler.call(21).await, Ok(42));
        assert!(registry.get("triple").is_none());
    }

    #[tokio::test]
    async fn blocking_handler_runs_off_the_runtime() {
        let mut registry: HandlerRegistry<u32, u32, String> = HandlerRegistry::new();
        registry.register_blocking("check", |n| {
            if n > 10 {
                Err(format!("{n} too large"))
            } else {
                Ok(n)
            }
        });

        let handler = registry.get("check").unwrap();
        assert_eq!(handler.call(3).await, Ok(3));
        assert_eq!(handler.call(11).await, Err("11 too large".to_string()));
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let mut registry: HandlerRegistry<u32, u32, String> = HandlerRegistry::new();
        registry.register("k", double).register("k", double);
        assert_eq!(registry.kinds().count(), 1);
        assert!(registry.contains("k"));
    }
}
