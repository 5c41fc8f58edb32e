//! Client stubs rebuilt from a hydration shape.
//!
//! The only side effect of a stub is the injected [`Transport`]; stubs know
//! nothing about the server's handlers, schemas or middleware.
//!
//! ```rust,ignore
//! let shape: Shape = serde_json::from_str(&hydration_json)?;
//! let api = client::build(&shape, "/api/", Arc::new(HttpTransport::new(base_url)));
//!
//! let reply = api.endpoint("testPOST", Method::Post).unwrap().call(Some(json!("Pepa"))).await?;
//! assert_eq!(reply.as_text(), Some("Hello Pepa"));
//! ```

use crate::exchange::FormData;
use crate::hydrate::Shape;
use crate::response::ErrorResponse;
use crate::stub::StubTree;
use crate::{ClientError, Method};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, trace};

/// Body of an outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportBody {
    /// Serialized JSON text
    Json(String),
    /// Form fields
    Form(FormData),
}

/// One outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// Full request URL (`base path` + procedure path)
    pub url: String,
    /// HTTP method
    pub method: Method,
    /// Request body, absent for bodyless calls
    pub body: Option<TransportBody>,
}

/// The fetch-like primitive stubs call through.
///
/// Implemented for async closures taking a [`TransportRequest`].
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Perform the request and return the raw response text
    async fn fetch(&self, request: TransportRequest) -> Result<String, ClientError>;
}

#[async_trait]
impl<F, Fut> Transport for F
where
    F: Fn(TransportRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, ClientError>> + Send + 'static,
{
    async fn fetch(&self, request: TransportRequest) -> Result<String, ClientError> {
        (self)(request).await
    }
}

/// Decoded response of a remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientReply {
    /// The body parsed as JSON
    Json(Value),
    /// The body was not JSON; returned unchanged
    Text(String),
}

impl ClientReply {
    /// Parse a raw body, keeping it as text when it is not JSON.
    pub fn parse(body: String) -> Self {
        match serde_json::from_str(&body) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(body),
        }
    }

    /// The text body, if the reply was not JSON
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }

    /// The JSON body, if any
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// The wire error body, when the reply is one
    pub fn error(&self) -> Option<ErrorResponse> {
        let value = self.as_json()?;
        if value.get("status") != Some(&Value::Bool(false)) {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}

/// A callable bound to one remote (path, method) pair.
#[derive(Clone)]
pub struct RemoteProcedure {
    url: String,
    method: Method,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for RemoteProcedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteProcedure")
            .field("url", &self.url)
            .field("method", &self.method)
            .finish()
    }
}

impl RemoteProcedure {
    /// Target URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Bound method
    pub fn method(&self) -> Method {
        self.method
    }

    /// Call with an optional JSON input.
    ///
    /// GET calls never carry a body; any input passed to them is dropped.
    pub async fn call(&self, input: Option<Value>) -> Result<ClientReply, ClientError> {
        let body = match input {
            Some(value) if self.method != Method::Get => {
                Some(TransportBody::Json(serde_json::to_string(&value)?))
            }
            Some(_) => {
                debug!(url = %self.url, "Dropping input of GET call");
                None
            }
            None => None,
        };
        self.send(body).await
    }

    /// Call with form data
    pub async fn call_form(&self, form: FormData) -> Result<ClientReply, ClientError> {
        self.send(Some(TransportBody::Form(form))).await
    }

    async fn send(&self, body: Option<TransportBody>) -> Result<ClientReply, ClientError> {
        trace!(url = %self.url, method = %self.method, "Calling remote procedure");
        let raw = self
            .transport
            .fetch(TransportRequest {
                url: self.url.clone(),
                method: self.method,
                body,
            })
            .await?;
        Ok(ClientReply::parse(raw))
    }
}

/// Build the client stub tree for a hydration shape.
///
/// Every leaf targets `base_path` followed by its procedure path.
pub fn build(
    shape: &Shape,
    base_path: &str,
    transport: Arc<dyn Transport>,
) -> StubTree<RemoteProcedure> {
    let base = if base_path.ends_with('/') {
        base_path.to_string()
    } else {
        format!("{}/", base_path)
    };
    StubTree::from_shape(shape, |path, method| RemoteProcedure {
        url: format!("{}{}", base, path),
        method,
        transport: Arc::clone(&transport),
    })
}
