//! Route declarations, the compiled router and the dispatcher
//!
//! A [`Declaration`] is the author-written tree; [`Router::new`] flattens it
//! into a path table and computes its hydration shape; a [`Dispatcher`]
//! pairs the router with a context factory and executes requests.
//!
//! ```rust,ignore
//! let declaration = Declaration::new()
//!     .procedure("hello", base.get().query(hello))
//!     .group("experiment", vec![
//!         base.get().query(experiment).into(),
//!         Declaration::new().procedure("aa", base.get().query(nested)).into(),
//!     ]);
//!
//! let router = Arc::new(Router::new(declaration)?);
//! assert!(router.includes("experiment/aa"));
//!
//! let dispatcher = Dispatcher::new(router, StaticContext(AppContext::default()));
//! let response = dispatcher.dispatch("hello", Method::Get, None, exchange).await;
//! ```

mod compile;
pub(crate) mod declaration;
mod dispatch;

pub use compile::{MethodTable, Router};
pub use declaration::{Declaration, GroupItem, MAX_NESTING_DEPTH, Node};
pub use dispatch::Dispatcher;

#[cfg(test)]
mod tests;
