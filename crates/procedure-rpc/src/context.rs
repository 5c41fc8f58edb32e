//! Context types for dependency injection

use crate::{RpcResult, SharedExchange};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Context wrapper providing access to per-request state
///
/// The context is cloned for every middleware step, so use `Arc` for shared state.
#[derive(Clone)]
pub struct Context<T: Clone + Send + Sync + 'static> {
    inner: Arc<T>,
}

impl<T: Clone + Send + Sync + 'static> Context<T> {
    /// Create a new context wrapping the given value
    pub fn new(ctx: T) -> Self {
        Self {
            inner: Arc::new(ctx),
        }
    }

    /// Get a reference to the inner context
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Get the Arc for sharing
    pub fn arc(&self) -> Arc<T> {
        self.inner.clone()
    }

    /// Take the value out, cloning only when other handles still exist
    pub fn into_inner(self) -> T {
        Arc::try_unwrap(self.inner).unwrap_or_else(|shared| (*shared).clone())
    }
}

impl<T: Clone + Send + Sync + 'static> std::ops::Deref for Context<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T: Clone + Send + Sync + 'static + Default> Default for Context<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + Sync + 'static + std::fmt::Debug> std::fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Context").field(&*self.inner).finish()
    }
}

/// Empty context for routers that don't need state
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct EmptyContext;

/// Produces the initial context of a request.
///
/// Invoked exactly once per dispatch, before the middleware pipeline runs.
/// Implemented for async closures taking the request exchange:
///
/// ```rust,ignore
/// let factory = |exchange: SharedExchange| async move {
///     Ok(AppContext { name: exchange.cookie("name") })
/// };
/// ```
#[async_trait]
pub trait ContextFactory<Ctx>: Send + Sync + 'static
where
    Ctx: Clone + Send + Sync + 'static,
{
    /// Build the context for the given exchange
    async fn create(&self, exchange: &SharedExchange) -> RpcResult<Ctx>;
}

#[async_trait]
impl<Ctx, F, Fut> ContextFactory<Ctx> for F
where
    Ctx: Clone + Send + Sync + 'static,
    F: Fn(SharedExchange) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RpcResult<Ctx>> + Send + 'static,
{
    async fn create(&self, exchange: &SharedExchange) -> RpcResult<Ctx> {
        (self)(exchange.clone()).await
    }
}

/// Context factory handing every request a clone of one value.
#[derive(Clone, Debug, Default)]
pub struct StaticContext<Ctx>(pub Ctx);

#[async_trait]
impl<Ctx> ContextFactory<Ctx> for StaticContext<Ctx>
where
    Ctx: Clone + Send + Sync + 'static,
{
    async fn create(&self, _exchange: &SharedExchange) -> RpcResult<Ctx> {
        Ok(self.0.clone())
    }
}
