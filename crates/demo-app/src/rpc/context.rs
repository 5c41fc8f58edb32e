//! Application context and guards

use procedure_rpc::prelude::*;

/// Cookie holding the signed-in user name
pub const SESSION_COOKIE: &str = "name";

/// The only user allowed through [`protected`]
const ALLOWED_USER: &str = "patrick115";

/// Application context passed to all handlers
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    /// Name from the session cookie, if any
    pub name: Option<String>,
}

impl AppContext {
    pub fn new(name: Option<String>) -> Self {
        Self { name }
    }
}

/// Builds the context of every request from its cookies.
pub async fn create_context(exchange: SharedExchange) -> RpcResult<AppContext> {
    Ok(AppContext::new(exchange.cookie(SESSION_COOKIE)))
}

/// Lets only the allowed user through; everyone else gets a 401.
pub async fn protected(args: MiddlewareArgs<AppContext>) -> RpcResult<Flow<AppContext>> {
    match args.ctx.name.as_deref() {
        Some(ALLOWED_USER) => Ok(args.next()),
        name => {
            tracing::debug!(user = ?name, path = %args.path, "Rejected protected call");
            Ok(Flow::halt(401, "Unauthorized"))
        }
    }
}
