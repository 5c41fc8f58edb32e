//! Handler traits and utilities
//!
//! Handlers are stored type-erased: the typed input produced by a procedure's
//! schema travels as `Box<dyn Any>` and is recovered right before the call.

use crate::{Context, RpcError, RpcResult, SharedExchange};
use futures::future::BoxFuture;
use serde::Serialize;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Arguments of one handler invocation.
pub(crate) struct HandlerCall<Ctx: Clone + Send + Sync + 'static> {
    pub(crate) ctx: Context<Ctx>,
    pub(crate) input: Option<Box<dyn Any + Send>>,
    pub(crate) exchange: SharedExchange,
}

/// Boxed handler for type erasure
pub(crate) type BoxedHandler<Ctx> =
    Arc<dyn Fn(HandlerCall<Ctx>) -> BoxFuture<'static, RpcResult<serde_json::Value>> + Send + Sync>;

/// Trait for handlers of typed procedures
///
/// Automatically implemented for async functions with the signature:
/// `async fn(Context<Ctx>, Input, SharedExchange) -> RpcResult<Output>`
pub trait Handler<Ctx, Input, Output>: Clone + Send + Sync + 'static
where
    Ctx: Clone + Send + Sync + 'static,
    Input: Send + 'static,
    Output: Serialize + Send + 'static,
{
    /// The future type returned by the handler
    type Future: Future<Output = RpcResult<Output>> + Send + 'static;

    /// Call the handler with context, input and exchange
    fn call(&self, ctx: Context<Ctx>, input: Input, exchange: SharedExchange) -> Self::Future;
}

impl<Ctx, Input, Output, F, Fut> Handler<Ctx, Input, Output> for F
where
    Ctx: Clone + Send + Sync + 'static,
    Input: Send + 'static,
    Output: Serialize + Send + 'static,
    F: Fn(Context<Ctx>, Input, SharedExchange) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = RpcResult<Output>> + Send + 'static,
{
    type Future = Fut;

    fn call(&self, ctx: Context<Ctx>, input: Input, exchange: SharedExchange) -> Self::Future {
        (self)(ctx, input, exchange)
    }
}

/// Trait for handlers of untyped (input-less) procedures
///
/// Automatically implemented for async functions with the signature:
/// `async fn(Context<Ctx>, SharedExchange) -> RpcResult<Output>`
pub trait UntypedHandler<Ctx, Output>: Clone + Send + Sync + 'static
where
    Ctx: Clone + Send + Sync + 'static,
    Output: Serialize + Send + 'static,
{
    /// The future type returned by the handler
    type Future: Future<Output = RpcResult<Output>> + Send + 'static;

    /// Call the handler with context and exchange
    fn call(&self, ctx: Context<Ctx>, exchange: SharedExchange) -> Self::Future;
}

impl<Ctx, Output, F, Fut> UntypedHandler<Ctx, Output> for F
where
    Ctx: Clone + Send + Sync + 'static,
    Output: Serialize + Send + 'static,
    F: Fn(Context<Ctx>, SharedExchange) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = RpcResult<Output>> + Send + 'static,
{
    type Future = Fut;

    fn call(&self, ctx: Context<Ctx>, exchange: SharedExchange) -> Self::Future {
        (self)(ctx, exchange)
    }
}

fn serialize_output<Output: Serialize>(output: Output) -> RpcResult<serde_json::Value> {
    serde_json::to_value(output).map_err(|e| {
        warn!(error = %e, "Failed to serialize handler output");
        RpcError::internal(format!("Failed to serialize output: {}", e))
    })
}

/// Box an untyped handler; any input attached to the call is ignored.
pub(crate) fn into_boxed<Ctx, Output, H>(handler: H) -> BoxedHandler<Ctx>
where
    Ctx: Clone + Send + Sync + 'static,
    Output: Serialize + Send + 'static,
    H: UntypedHandler<Ctx, Output>,
{
    Arc::new(move |call: HandlerCall<Ctx>| {
        let handler = handler.clone();
        Box::pin(async move {
            trace!("Executing untyped handler");
            let output = handler.call(call.ctx, call.exchange).await.inspect_err(|e| {
                debug!(error_code = %e.code, "Handler returned error");
            })?;
            serialize_output(output)
        })
    })
}

/// Box a typed handler; the call must carry the schema's output value.
pub(crate) fn into_boxed_typed<Ctx, Input, Output, H>(handler: H) -> BoxedHandler<Ctx>
where
    Ctx: Clone + Send + Sync + 'static,
    Input: Send + 'static,
    Output: Serialize + Send + 'static,
    H: Handler<Ctx, Input, Output>,
{
    Arc::new(move |call: HandlerCall<Ctx>| {
        let handler = handler.clone();
        Box::pin(async move {
            let input = call
                .input
                .ok_or_else(|| RpcError::internal("Typed handler called without input"))?
                .downcast::<Input>()
                .map_err(|_| RpcError::internal("Validated input has an unexpected type"))?;

            trace!("Executing typed handler");
            let output = handler
                .call(call.ctx, *input, call.exchange)
                .await
                .inspect_err(|e| {
                    debug!(error_code = %e.code, "Handler returned error");
                })?;
            serialize_output(output)
        })
    })
}
