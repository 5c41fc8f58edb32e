#![warn(missing_docs)]
//! # procedure-rpc
//!
//! A typed remote-procedure framework: declare a tree of named procedures,
//! serve it over HTTP, call it in-process during server rendering, and hand
//! clients a compact description from which they rebuild callable stubs.
//!
//! ## Overview
//!
//! - **Procedures** bound to one HTTP method, with an optional input schema
//!   and an ordered middleware chain inherited from their builder
//! - **Route declarations** nesting procedures, groups of procedures sharing a
//!   path, and sub-declarations
//! - **Router compilation** into an immutable path → method → procedure table
//! - **Dispatch** with validation, context threading through middleware,
//!   explicit short-circuits and total error handling
//! - **Hydration** of the route topology into a handler-free shape, and client
//!   stubs rebuilt from it
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐        ┌───────────────────────────┐
//! │ Declaration                  │        │ Client                    │
//! │  procedures / groups / routes│        │  StubTree<RemoteProcedure>│
//! └──────┬───────────────┬───────┘        └─────────────▲─────────────┘
//!        │ Router::new   │ encode                       │ client::build
//!        ▼               ▼                              │
//! ┌─────────────┐  ┌───────────┐   hydration payload    │
//! │ path table  │  │ Shape     │────────────────────────┘
//! └──────┬──────┘  └───────────┘
//!        │
//!        ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │ Dispatcher: resolve → validate → context → middleware →  │
//! │             handler → shape result                       │
//! └──────▲─────────────────────────────▲─────────────────────┘
//!        │ ApiServer::handle           │ ApiServer::ssr
//!   HTTP exchange                 server rendering
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use procedure_rpc::prelude::*;
//!
//! #[derive(Clone, Default)]
//! struct AppContext {
//!     name: Option<String>,
//! }
//!
//! async fn hello(_ctx: Context<AppContext>, _ex: SharedExchange) -> RpcResult<&'static str> {
//!     Ok("hi")
//! }
//!
//! async fn echo(_ctx: Context<AppContext>, name: String, _ex: SharedExchange) -> RpcResult<String> {
//!     Ok(format!("Hello {}", name))
//! }
//!
//! let base = procedure::<AppContext>();
//! let declaration = Declaration::new()
//!     .procedure("hello", base.get().query(hello))
//!     .procedure("echo", base.post().input(json::<String>())?.query(echo));
//!
//! let server = Arc::new(ApiServer::new(
//!     Router::new(declaration)?,
//!     |exchange: SharedExchange| async move {
//!         Ok(AppContext { name: exchange.cookie("name") })
//!     },
//!     ServerConfig::default(),
//! )?);
//!
//! let reply = server.handle(MemoryExchange::new("GET", "/api/hello").shared()).await;
//! assert_eq!(reply.body, "hi");
//! ```

pub mod client;
mod config;
mod context;
mod error;
pub mod exchange;
mod handler;
pub mod hydrate;
pub mod logging;
mod method;
pub mod middleware;
pub mod procedure;
mod response;
pub mod router;
pub mod schema;
mod server;
pub mod stub;
mod tree;
pub mod validation;

#[cfg(test)]
mod tests;

// Re-exports
pub use client::{ClientReply, RemoteProcedure, Transport, TransportBody, TransportRequest};
pub use config::{ConfigValidationError, ServerConfig};
pub use context::{Context, ContextFactory, EmptyContext, StaticContext};
pub use error::{ClientError, RouterError, RpcError, RpcErrorCode, RpcResult};
pub use exchange::{Exchange, FormData, FormValue, MemoryExchange, SharedExchange};
pub use handler::{Handler, UntypedHandler};
pub use hydrate::{Shape, ShapeNode, encode};
pub use logging::RequestId;
pub use method::{Method, UnsupportedMethod};
pub use middleware::{Flow, MiddlewareArgs, MiddlewareFn, from_fn};
pub use procedure::{MethodBuilder, Procedure, ProcedureBuilder, TypedMethodBuilder, procedure};
pub use response::{ApiResponse, ErrorMessage, ErrorResponse, HttpReply};
pub use router::{Declaration, Dispatcher, GroupItem, MAX_NESTING_DEPTH, MethodTable, Node, Router};
pub use schema::{
    AnyFormData, FormSchema, INVALID_INPUT, Input, InputSource, JsonInput, Rejection, Schema,
    ValidatedInput, json, schema_fn, validated,
};
pub use server::{ApiServer, SsrEndpoint};
pub use stub::{MethodStubs, StubNode, StubTree};
pub use validation::{FieldError, Validate, ValidationResult, ValidationRules};

/// Prelude for convenient imports
///
/// Import everything you need with a single use statement:
///
/// ```rust,ignore
/// use procedure_rpc::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Responses
        ApiResponse,
        // Server
        ApiServer,
        // Schemas
        AnyFormData,
        // Client
        ClientError,
        ClientReply,
        // Context
        Context,
        ContextFactory,
        // Routing
        Declaration,
        Dispatcher,
        EmptyContext,
        ErrorResponse,
        // Exchange
        Exchange,
        // Middleware
        Flow,
        FormData,
        FormSchema,
        GroupItem,
        HttpReply,
        Input,
        MemoryExchange,
        Method,
        MiddlewareArgs,
        MiddlewareFn,
        Procedure,
        ProcedureBuilder,
        Rejection,
        RemoteProcedure,
        Router,
        RouterError,
        // Errors
        RpcError,
        RpcErrorCode,
        RpcResult,
        Schema,
        ServerConfig,
        Shape,
        SharedExchange,
        SsrEndpoint,
        StaticContext,
        StubTree,
        Transport,
        // Validation
        Validate,
        ValidationResult,
        ValidationRules,
        from_fn,
        json,
        procedure,
        schema_fn,
        validated,
    };
    pub use std::sync::Arc;
}
