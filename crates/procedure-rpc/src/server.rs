//! HTTP front and in-process invocation.
//!
//! [`ApiServer`] owns a dispatcher and the server configuration. The host
//! framework forwards every request below the API prefix to
//! [`ApiServer::handle`] and writes back the returned [`HttpReply`]. Server
//! rendering skips HTTP entirely and calls procedures through the stub tree
//! returned by [`ApiServer::ssr`].
//!
//! # Example
//! ```rust,ignore
//! let server = Arc::new(ApiServer::new(router, context_factory, ServerConfig::default())?);
//!
//! // HTTP
//! let reply = server.handle(exchange).await;
//!
//! // server rendering
//! let ssr = server.ssr();
//! let greeting = ssr.endpoint("testPOST", Method::Post).unwrap()
//!     .call(exchange, Some(json!("Pepa").into())).await;
//!
//! // hydration payload embedded into the page
//! let payload = serde_json::to_string(server.hydrate())?;
//! ```

use crate::config::{ConfigValidationError, ServerConfig};
use crate::context::ContextFactory;
use crate::exchange::request_path;
use crate::hydrate::Shape;
use crate::response::{ApiResponse, ErrorResponse, HttpReply};
use crate::router::{Dispatcher, Router};
use crate::schema::{INVALID_INPUT, Input};
use crate::stub::StubTree;
use crate::{Method, SharedExchange};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// The API endpoint of an application.
pub struct ApiServer<Ctx: Clone + Send + Sync + 'static> {
    dispatcher: Dispatcher<Ctx>,
    config: ServerConfig,
    api_path: String,
}

impl<Ctx: Clone + Send + Sync + 'static> ApiServer<Ctx> {
    /// Create a server for a compiled router.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(
        router: Router<Ctx>,
        context: impl ContextFactory<Ctx>,
        config: ServerConfig,
    ) -> Result<Self, ConfigValidationError> {
        config.validate()?;
        let api_path = config.normalized_api_path();
        let dispatcher = Dispatcher::new(Arc::new(router), context)
            .expose_internal_errors(config.expose_internal_errors);
        info!(
            api_path = %api_path,
            paths = dispatcher.router().paths().len(),
            "API server ready"
        );
        Ok(Self {
            dispatcher,
            config,
            api_path,
        })
    }

    /// The configuration in use
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The API prefix, ending with `/`
    pub fn api_path(&self) -> &str {
        &self.api_path
    }

    /// The underlying dispatcher
    pub fn dispatcher(&self) -> &Dispatcher<Ctx> {
        &self.dispatcher
    }

    /// The compiled router
    pub fn router(&self) -> &Router<Ctx> {
        self.dispatcher.router()
    }

    /// Hydration payload for clients
    pub fn hydrate(&self) -> &Shape {
        self.router().shape()
    }

    /// Answer an HTTP request.
    pub async fn handle(&self, exchange: SharedExchange) -> HttpReply {
        self.respond(exchange)
            .await
            .into_http(self.config.mirror_error_status)
    }

    /// Answer an HTTP request without rendering the reply.
    pub async fn respond(&self, exchange: SharedExchange) -> ApiResponse {
        let pathname = request_path(exchange.url());
        let Some(path) = pathname.strip_prefix(self.api_path.as_str()) else {
            debug!(pathname = %pathname, api_path = %self.api_path, "Request outside API path");
            return ErrorResponse::invalid_api_path().into();
        };
        let path = path.to_string();
        let method = Method::from_http(exchange.method());
        self.dispatcher
            .dispatch_exchange(&path, method, exchange, self.config.max_body_size)
            .await
    }

    /// Call a procedure in-process with an already decoded input.
    pub async fn call(
        &self,
        exchange: SharedExchange,
        path: &str,
        method: Method,
        input: Option<Input>,
    ) -> ApiResponse {
        self.dispatcher.dispatch(path, method, input, exchange).await
    }

    /// Stub tree of in-process endpoints mirroring the declaration.
    pub fn ssr(self: &Arc<Self>) -> StubTree<SsrEndpoint<Ctx>> {
        StubTree::from_shape(self.hydrate(), |path, method| SsrEndpoint {
            server: Arc::clone(self),
            path: Arc::from(path),
            method,
        })
    }
}

impl<Ctx: Clone + Send + Sync + 'static> fmt::Debug for ApiServer<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiServer")
            .field("config", &self.config)
            .field("router", self.router())
            .finish()
    }
}

/// One procedure callable in-process, bound to its path and method.
pub struct SsrEndpoint<Ctx: Clone + Send + Sync + 'static> {
    server: Arc<ApiServer<Ctx>>,
    path: Arc<str>,
    method: Method,
}

impl<Ctx: Clone + Send + Sync + 'static> Clone for SsrEndpoint<Ctx> {
    fn clone(&self) -> Self {
        Self {
            server: Arc::clone(&self.server),
            path: Arc::clone(&self.path),
            method: self.method,
        }
    }
}

impl<Ctx: Clone + Send + Sync + 'static> fmt::Debug for SsrEndpoint<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsrEndpoint")
            .field("path", &self.path)
            .field("method", &self.method)
            .finish()
    }
}

impl<Ctx: Clone + Send + Sync + 'static> SsrEndpoint<Ctx> {
    /// Procedure path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Bound method
    pub fn method(&self) -> Method {
        self.method
    }

    /// Invoke the procedure for the given exchange
    pub async fn call(&self, exchange: SharedExchange, input: Option<Input>) -> ApiResponse {
        self.server
            .call(exchange, &self.path, self.method, input)
            .await
    }

    /// Invoke the procedure with the form submitted in the exchange.
    pub async fn action(&self, exchange: SharedExchange) -> ApiResponse {
        match exchange.form_data().await {
            Ok(form) => self.call(exchange, Some(Input::Form(form))).await,
            Err(e) => {
                debug!(path = %self.path, error = %e, "Form action without form data");
                ErrorResponse::invalid_input(INVALID_INPUT).into()
            }
        }
    }
}
