//! Request dispatch: resolution, validation, middleware and handler.
//!
//! Every dispatch is a total function from request to [`ApiResponse`]:
//! rejections and failures at any step are returned as error bodies, and
//! panics in collaborators are caught at the step that raised them.

use super::compile::Router;
use crate::context::ContextFactory;
use crate::handler::HandlerCall;
use crate::logging::{RequestId, dispatch_span, log_outcome, panic_message};
use crate::middleware::{Flow, MiddlewareArgs};
use crate::procedure::Procedure;
use crate::response::{ApiResponse, ErrorResponse};
use crate::schema::{INVALID_INPUT, Input, InputSource};
use crate::{Context, Method, RpcError, SharedExchange};
use futures::FutureExt;
use serde_json::Value;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, debug, error, trace, warn};

/// Executes requests against a compiled [`Router`].
pub struct Dispatcher<Ctx: Clone + Send + Sync + 'static> {
    router: Arc<Router<Ctx>>,
    context: Arc<dyn ContextFactory<Ctx>>,
    expose_internal_errors: bool,
}

impl<Ctx: Clone + Send + Sync + 'static> Clone for Dispatcher<Ctx> {
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
            context: Arc::clone(&self.context),
            expose_internal_errors: self.expose_internal_errors,
        }
    }
}

impl<Ctx: Clone + Send + Sync + 'static> Dispatcher<Ctx> {
    /// Create a dispatcher from a router and the per-request context factory
    pub fn new(router: Arc<Router<Ctx>>, context: impl ContextFactory<Ctx>) -> Self {
        Self {
            router,
            context: Arc::new(context),
            expose_internal_errors: false,
        }
    }

    /// Send the underlying message of server errors instead of `Internal server error`
    pub fn expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }

    /// The router this dispatcher reads
    pub fn router(&self) -> &Arc<Router<Ctx>> {
        &self.router
    }

    /// Resolve a path and method to a procedure.
    ///
    /// `None` stands for a method outside the supported set; it is rejected
    /// like any method the path does not serve.
    pub fn resolve(
        &self,
        path: &str,
        method: Option<Method>,
    ) -> Result<&Arc<Procedure<Ctx>>, ErrorResponse> {
        let methods = self
            .router
            .get_path(path)
            .ok_or_else(ErrorResponse::not_found)?;
        let method = method.ok_or_else(ErrorResponse::method_not_supported)?;
        let procedure = methods
            .get(method)
            .ok_or_else(ErrorResponse::method_not_supported)?;
        if method != Method::Get && !procedure.is_typed() {
            debug!(path = %path, method = %method, "Untyped procedures only answer GET");
            return Err(ErrorResponse::method_not_supported());
        }
        Ok(procedure)
    }

    /// Dispatch an already decoded input.
    ///
    /// A typed procedure called without input validates `null`.
    pub async fn dispatch(
        &self,
        path: &str,
        method: Method,
        input: Option<Input>,
        exchange: SharedExchange,
    ) -> ApiResponse {
        self.traced(path, method.as_str(), async {
            match self.resolve(path, Some(method)) {
                Ok(procedure) => self.execute(procedure, path, input, exchange).await,
                Err(rejection) => rejection.into(),
            }
        })
        .await
    }

    /// Dispatch a request whose body still sits in the exchange.
    ///
    /// The body is only read for typed procedures: form schemas read form
    /// data, every other schema reads text parsed as JSON, falling back to the
    /// raw text when it is not JSON. JSON bodies are measured after reading;
    /// form bodies are checked against their `Content-Length` header.
    pub async fn dispatch_exchange(
        &self,
        path: &str,
        method: Option<Method>,
        exchange: SharedExchange,
        max_body_size: usize,
    ) -> ApiResponse {
        let method_name = method.map_or_else(|| exchange.method().to_string(), |m| m.to_string());
        self.traced(path, &method_name, async {
            let procedure = match self.resolve(path, method) {
                Ok(procedure) => procedure,
                Err(rejection) => return rejection.into(),
            };
            let input = match procedure.input_source() {
                None => None,
                Some(source) => match Self::read_input(source, &exchange, max_body_size).await {
                    Ok(input) => Some(input),
                    Err(rejection) => return rejection.into(),
                },
            };
            self.execute(procedure, path, input, exchange).await
        })
        .await
    }

    async fn traced(
        &self,
        path: &str,
        method: &str,
        run: impl Future<Output = ApiResponse>,
    ) -> ApiResponse {
        let request_id = RequestId::new();
        let span = dispatch_span(&request_id, path, method);
        async move {
            let start = Instant::now();
            trace!("Dispatch started");
            let response = run.await;
            log_outcome(&response, start.elapsed());
            response
        }
        .instrument(span)
        .await
    }

    async fn read_input(
        source: InputSource,
        exchange: &SharedExchange,
        max_body_size: usize,
    ) -> Result<Input, ErrorResponse> {
        match source {
            InputSource::FormData => {
                // form bodies are parsed by the host; only the declared length is known here
                let declared = exchange
                    .header("content-length")
                    .and_then(|length| length.trim().parse::<usize>().ok());
                if let Some(size) = declared {
                    check_body_size(size, max_body_size)?;
                }
                exchange
                    .form_data()
                    .await
                    .map(Input::Form)
                    .map_err(unreadable_body)
            }
            InputSource::Json => {
                let body = exchange.text().await.map_err(unreadable_body)?;
                check_body_size(body.len(), max_body_size)?;
                Ok(Input::Json(
                    serde_json::from_str(&body).unwrap_or(Value::String(body)),
                ))
            }
        }
    }

    /// Run steps after resolution: validation, context, middleware, handler
    /// and result shaping.
    pub async fn execute(
        &self,
        procedure: &Arc<Procedure<Ctx>>,
        path: &str,
        input: Option<Input>,
        exchange: SharedExchange,
    ) -> ApiResponse {
        let method = procedure.method();

        let (typed_input, shared_input) = match procedure.schema() {
            None => (None, None),
            Some(schema) => {
                let raw = input.unwrap_or(Input::Json(Value::Null));
                match schema.parse_any(&raw) {
                    Ok(parsed) => (Some(parsed), Some(Arc::new(raw))),
                    Err(rejection) => {
                        debug!("Input rejected by schema");
                        return ErrorResponse::invalid_input(rejection.into_message()).into();
                    }
                }
            }
        };

        let created = AssertUnwindSafe(self.context.create(&exchange))
            .catch_unwind()
            .await;
        let mut ctx = match created {
            Ok(Ok(ctx)) => Context::new(ctx),
            Ok(Err(e)) => {
                error!(error = %e, "Context factory failed");
                return self.internal(&e.message);
            }
            Err(panic) => {
                error!(panic = %panic_message(panic.as_ref()), "Context factory panicked");
                return self.internal(panic_message(panic.as_ref()));
            }
        };

        let path: Arc<str> = Arc::from(path);
        for (index, middleware) in procedure.middleware().iter().enumerate() {
            let args = MiddlewareArgs {
                ctx,
                input: shared_input.clone(),
                exchange: Arc::clone(&exchange),
                path: Arc::clone(&path),
                method,
            };
            let step = AssertUnwindSafe(async { middleware(args).await })
                .catch_unwind()
                .await;
            ctx = match step {
                Ok(Ok(Flow::Continue(next))) => next,
                Ok(Ok(Flow::Halt(response))) => {
                    debug!(step = index, code = response.code, "Middleware halted the request");
                    return response.into();
                }
                Ok(Err(e)) => {
                    error!(step = index, error = %e, "Middleware failed");
                    return self.internal(&e.message);
                }
                Err(panic) => {
                    error!(step = index, panic = %panic_message(panic.as_ref()), "Middleware panicked");
                    return self.internal(panic_message(panic.as_ref()));
                }
            };
        }

        let call = HandlerCall {
            ctx,
            input: typed_input,
            exchange,
        };
        let outcome = AssertUnwindSafe(async { (procedure.handler)(call).await })
            .catch_unwind()
            .await;
        let value = match outcome {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => return self.failure(&e),
            Err(panic) => {
                error!(panic = %panic_message(panic.as_ref()), "Handler panicked");
                return self.internal(panic_message(panic.as_ref()));
            }
        };

        ApiResponse::from_value(value).unwrap_or_else(|| {
            error!("Handler returned a bare number or boolean");
            self.internal("Handler returned an unsupported value")
        })
    }

    /// Error body for a handler error, keeping its status code.
    fn failure(&self, error: &RpcError) -> ApiResponse {
        if error.code.is_server_error() {
            warn!(code = %error.code, message = %error.message, "Handler failed");
        } else {
            debug!(code = %error.code, message = %error.message, "Handler rejected the request");
        }
        error.to_response(self.expose_internal_errors).into()
    }

    fn internal(&self, message: &str) -> ApiResponse {
        if self.expose_internal_errors {
            ErrorResponse::new(500, message).into()
        } else {
            ErrorResponse::internal().into()
        }
    }
}

fn unreadable_body(error: RpcError) -> ErrorResponse {
    debug!(error = %error, "Request body could not be read");
    ErrorResponse::invalid_input(INVALID_INPUT)
}

fn check_body_size(size: usize, limit: usize) -> Result<(), ErrorResponse> {
    if size > limit {
        debug!(size, limit, "Request body too large");
        return Err(ErrorResponse::invalid_input("Request body too large"));
    }
    Ok(())
}

