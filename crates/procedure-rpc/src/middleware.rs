//! Middleware support for context threading and early exits
//!
//! A middleware runs before the handler of every procedure derived from the
//! builder it was attached to. It sees the current context, the validated
//! input and the exchange, and decides how the pipeline continues:
//!
//! - [`MiddlewareArgs::next`] forwards the current context unchanged;
//! - [`MiddlewareArgs::next_with`] replaces the context for every later
//!   middleware and the handler;
//! - [`Flow::Halt`] ends the request with a predetermined error body.
//!
//! Returning `Err(RpcError)` or panicking is treated as an unexpected failure
//! and answered with a 500.
//!
//! # Example
//! ```rust,ignore
//! async fn require_user(args: MiddlewareArgs<AppContext>) -> RpcResult<Flow<AppContext>> {
//!     match args.ctx.user.clone() {
//!         Some(user) => {
//!             let ctx = AppContext { user: Some(user), ..args.ctx.inner().clone() };
//!             Ok(args.next_with(ctx))
//!         }
//!         None => Ok(Flow::halt(401, "Unauthorized")),
//!     }
//! }
//! ```

use crate::response::{ErrorMessage, ErrorResponse};
use crate::schema::Input;
use crate::{Context, Method, RpcResult, SharedExchange};
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// What a middleware hands back to the pipeline.
#[derive(Debug)]
pub enum Flow<Ctx: Clone + Send + Sync + 'static> {
    /// Continue with this context
    Continue(Context<Ctx>),
    /// Stop and answer with this error body
    Halt(ErrorResponse),
}

impl<Ctx: Clone + Send + Sync + 'static> Flow<Ctx> {
    /// Short-circuit with the given code and message
    pub fn halt(code: u16, message: impl Into<ErrorMessage>) -> Self {
        Self::Halt(ErrorResponse::new(code, message))
    }
}

/// Everything a middleware step receives.
pub struct MiddlewareArgs<Ctx: Clone + Send + Sync + 'static> {
    /// Context produced by the previous step (or the context factory)
    pub ctx: Context<Ctx>,
    /// Decoded payload that passed the schema, before any transformation the
    /// schema applies for the handler; `None` for untyped procedures
    pub input: Option<Arc<Input>>,
    /// The request exchange
    pub exchange: SharedExchange,
    /// Resolved procedure path
    pub path: Arc<str>,
    /// Method of the resolved procedure
    pub method: Method,
}

impl<Ctx: Clone + Send + Sync + 'static> MiddlewareArgs<Ctx> {
    /// Continue with the current context
    pub fn next(self) -> Flow<Ctx> {
        Flow::Continue(self.ctx)
    }

    /// Continue with a replacement context
    pub fn next_with(self, ctx: Ctx) -> Flow<Ctx> {
        Flow::Continue(Context::new(ctx))
    }
}

/// Middleware function type
pub type MiddlewareFn<Ctx> =
    Arc<dyn Fn(MiddlewareArgs<Ctx>) -> BoxFuture<'static, RpcResult<Flow<Ctx>>> + Send + Sync>;

/// Create middleware from an async function or closure
///
/// ```rust,ignore
/// let mw = from_fn(|args: MiddlewareArgs<AppContext>| async move { Ok(args.next()) });
/// ```
pub fn from_fn<Ctx, F, Fut>(f: F) -> MiddlewareFn<Ctx>
where
    Ctx: Clone + Send + Sync + 'static,
    F: Fn(MiddlewareArgs<Ctx>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RpcResult<Flow<Ctx>>> + Send + 'static,
{
    Arc::new(move |args| Box::pin(f(args)))
}
