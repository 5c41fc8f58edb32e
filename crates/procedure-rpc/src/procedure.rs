//! Procedure builder API
//!
//! A [`ProcedureBuilder`] accumulates middleware; choosing a method turns it
//! into a [`MethodBuilder`], and attaching a handler with `.query(..)` yields
//! an immutable [`Procedure`].
//!
//! # Example
//!
//! ```rust,ignore
//! use procedure_rpc::prelude::*;
//!
//! let base = procedure::<AppContext>();
//! let protected = base.use_middleware(from_fn(require_user));
//!
//! let hello = base.get().query(say_hi);
//! let echo = base.post().input(json::<String>())?.query(greet);
//! let me = protected.get().query(whoami);
//! ```
//!
//! Deriving from a builder never changes it: `base` above stays free of
//! `require_user` and can keep producing unprotected procedures.

use crate::handler::{BoxedHandler, Handler, UntypedHandler, into_boxed, into_boxed_typed};
use crate::middleware::MiddlewareFn;
use crate::schema::{ErasedSchema, InputSource, Schema};
use crate::{Method, RouterError};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// One endpoint: a method, its middleware chain, an optional input schema and
/// the handler.
pub struct Procedure<Ctx: Clone + Send + Sync + 'static> {
    method: Method,
    middleware: Vec<MiddlewareFn<Ctx>>,
    schema: Option<Arc<dyn ErasedSchema>>,
    pub(crate) handler: BoxedHandler<Ctx>,
}

impl<Ctx: Clone + Send + Sync + 'static> Procedure<Ctx> {
    /// The method this procedure is bound to
    pub fn method(&self) -> Method {
        self.method
    }

    /// Whether the procedure carries an input schema
    pub fn is_typed(&self) -> bool {
        self.schema.is_some()
    }

    /// Where the schema reads its payload from; `None` for untyped procedures
    pub fn input_source(&self) -> Option<InputSource> {
        self.schema.as_ref().map(|schema| schema.source())
    }

    /// Number of middleware steps run before the handler
    pub fn middleware_count(&self) -> usize {
        self.middleware.len()
    }

    pub(crate) fn middleware(&self) -> &[MiddlewareFn<Ctx>] {
        &self.middleware
    }

    pub(crate) fn schema(&self) -> Option<&dyn ErasedSchema> {
        self.schema.as_deref()
    }
}

impl<Ctx: Clone + Send + Sync + 'static> fmt::Debug for Procedure<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("method", &self.method)
            .field("typed", &self.is_typed())
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// Start a procedure chain with no middleware.
pub fn procedure<Ctx: Clone + Send + Sync + 'static>() -> ProcedureBuilder<Ctx> {
    ProcedureBuilder::new()
}

/// Reusable base of procedures sharing a middleware chain.
pub struct ProcedureBuilder<Ctx: Clone + Send + Sync + 'static> {
    middleware: Vec<MiddlewareFn<Ctx>>,
}

impl<Ctx: Clone + Send + Sync + 'static> Clone for ProcedureBuilder<Ctx> {
    fn clone(&self) -> Self {
        Self {
            middleware: self.middleware.clone(),
        }
    }
}

impl<Ctx: Clone + Send + Sync + 'static> Default for ProcedureBuilder<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx: Clone + Send + Sync + 'static> ProcedureBuilder<Ctx> {
    /// Create a builder with an empty middleware chain
    pub fn new() -> Self {
        Self {
            middleware: Vec::new(),
        }
    }

    /// Derive a builder with one more middleware.
    ///
    /// The accumulated chain is copied before appending; `self` is unchanged.
    pub fn use_middleware(&self, middleware: MiddlewareFn<Ctx>) -> Self {
        let mut chain = self.middleware.clone();
        chain.push(middleware);
        trace!(middleware_count = chain.len(), "Derived procedure builder");
        Self { middleware: chain }
    }

    /// Number of accumulated middleware
    pub fn middleware_count(&self) -> usize {
        self.middleware.len()
    }

    /// Bind to an arbitrary method
    pub fn method(&self, method: Method) -> MethodBuilder<Ctx> {
        MethodBuilder {
            method,
            middleware: self.middleware.clone(),
        }
    }

    /// Bind to GET
    pub fn get(&self) -> MethodBuilder<Ctx> {
        self.method(Method::Get)
    }

    /// Bind to POST
    pub fn post(&self) -> MethodBuilder<Ctx> {
        self.method(Method::Post)
    }

    /// Bind to PUT
    pub fn put(&self) -> MethodBuilder<Ctx> {
        self.method(Method::Put)
    }

    /// Bind to DELETE
    pub fn delete(&self) -> MethodBuilder<Ctx> {
        self.method(Method::Delete)
    }

    /// Bind to PATCH
    pub fn patch(&self) -> MethodBuilder<Ctx> {
        self.method(Method::Patch)
    }
}

/// A procedure chain bound to a method, still without a handler.
pub struct MethodBuilder<Ctx: Clone + Send + Sync + 'static> {
    method: Method,
    middleware: Vec<MiddlewareFn<Ctx>>,
}

impl<Ctx: Clone + Send + Sync + 'static> MethodBuilder<Ctx> {
    /// The bound method
    pub fn method(&self) -> Method {
        self.method
    }

    /// Attach an input schema.
    ///
    /// GET procedures carry no body, so this fails with
    /// [`RouterError::InputOnGet`] on a GET chain.
    pub fn input<S: Schema>(self, schema: S) -> Result<TypedMethodBuilder<Ctx, S>, RouterError> {
        if self.method == Method::Get {
            debug!("Rejected input schema on GET procedure");
            return Err(RouterError::InputOnGet);
        }
        Ok(TypedMethodBuilder {
            method: self.method,
            middleware: self.middleware,
            schema,
        })
    }

    /// Finish with an untyped handler: `async fn(Context<Ctx>, SharedExchange) -> RpcResult<O>`
    pub fn query<O, H>(self, handler: H) -> Procedure<Ctx>
    where
        O: Serialize + Send + 'static,
        H: UntypedHandler<Ctx, O>,
    {
        Procedure {
            method: self.method,
            middleware: self.middleware,
            schema: None,
            handler: into_boxed(handler),
        }
    }
}

/// A method-bound chain carrying an input schema.
pub struct TypedMethodBuilder<Ctx: Clone + Send + Sync + 'static, S: Schema> {
    method: Method,
    middleware: Vec<MiddlewareFn<Ctx>>,
    schema: S,
}

impl<Ctx: Clone + Send + Sync + 'static, S: Schema> TypedMethodBuilder<Ctx, S> {
    /// Finish with a typed handler: `async fn(Context<Ctx>, S::Output, SharedExchange) -> RpcResult<O>`
    pub fn query<O, H>(self, handler: H) -> Procedure<Ctx>
    where
        O: Serialize + Send + 'static,
        H: Handler<Ctx, S::Output, O>,
    {
        Procedure {
            method: self.method,
            middleware: self.middleware,
            schema: Some(Arc::new(self.schema)),
            handler: into_boxed_typed::<Ctx, S::Output, O, H>(handler),
        }
    }
}

