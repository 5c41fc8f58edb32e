//! Application RPC Module
//!
//! This module defines the route declaration, handlers and context of the
//! application.

mod context;
mod handlers;

pub use context::{AppContext, SESSION_COOKIE, create_context, protected};
pub use handlers::{create_router, create_routes};

// Re-export library types for convenience
pub use procedure_rpc::prelude::*;
