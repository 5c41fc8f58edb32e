//! Wire-level responses produced by a dispatch.
//!
//! Error bodies always have the shape `{status: false, code, message}` where
//! `message` is a string, or a list of strings for per-field validation
//! failures.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `status` field of an error body; always `false` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Failed;

impl Serialize for Failed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(false)
    }
}

impl<'de> Deserialize<'de> for Failed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match bool::deserialize(deserializer)? {
            false => Ok(Failed),
            true => Err(de::Error::custom("error bodies carry status: false")),
        }
    }
}

/// Error message: a single string or one string per failed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    /// One message for the whole failure
    Single(String),
    /// One message per field
    Many(Vec<String>),
}

impl From<&str> for ErrorMessage {
    fn from(message: &str) -> Self {
        Self::Single(message.to_string())
    }
}

impl From<String> for ErrorMessage {
    fn from(message: String) -> Self {
        Self::Single(message)
    }
}

impl From<Vec<String>> for ErrorMessage {
    fn from(messages: Vec<String>) -> Self {
        Self::Many(messages)
    }
}

impl std::fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(message) => f.write_str(message),
            Self::Many(messages) => f.write_str(&messages.join("; ")),
        }
    }
}

/// Wire error body: `{status: false, code, message}`.
///
/// Built by the dispatcher for routing and validation failures, and by
/// middleware authors to short-circuit a pipeline with [`Flow::Halt`](crate::Flow::Halt).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    status: Failed,
    /// Status code (404, 403, 400, 500 or any code chosen by a middleware)
    pub code: u16,
    /// Human readable message(s)
    pub message: ErrorMessage,
}

impl ErrorResponse {
    /// Create an error body with an arbitrary code.
    pub fn new(code: u16, message: impl Into<ErrorMessage>) -> Self {
        Self {
            status: Failed,
            code,
            message: message.into(),
        }
    }

    /// 404 for a path the router does not know.
    pub fn not_found() -> Self {
        Self::new(404, "Not found")
    }

    /// 404 for a URL outside the configured API prefix.
    pub fn invalid_api_path() -> Self {
        Self::new(404, "Invalid API path")
    }

    /// 403 for a method the resolved path does not accept.
    pub fn method_not_supported() -> Self {
        Self::new(403, "Method not supported")
    }

    /// 400 for input rejected by the procedure's schema.
    pub fn invalid_input(message: impl Into<ErrorMessage>) -> Self {
        Self::new(400, message)
    }

    /// 500 for anything unexpected.
    pub fn internal() -> Self {
        Self::new(500, "Internal server error")
    }
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Handler returned nothing
    Empty,
    /// Handler returned a string; sent as raw text
    Text(String),
    /// Handler returned an object or array; sent as JSON
    Json(Value),
    /// Any rejection or failure along the pipeline
    Error(ErrorResponse),
}

impl ApiResponse {
    /// Shape a handler result.
    ///
    /// `null` becomes [`ApiResponse::Empty`], strings become text and
    /// objects/arrays become JSON. Numbers and booleans are not valid handler
    /// results and yield `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Empty),
            Value::String(text) => Some(Self::Text(text)),
            Value::Object(_) | Value::Array(_) => Some(Self::Json(value)),
            Value::Bool(_) | Value::Number(_) => None,
        }
    }

    /// Whether this response is an error body
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The error body, if any
    pub fn error(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Error(error) => Some(error),
            _ => None,
        }
    }

    /// The text body, if any
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The response as a JSON value (`null` for empty, string for text).
    pub fn to_value(&self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Text(text) => Value::String(text.clone()),
            Self::Json(value) => value.clone(),
            Self::Error(error) => serde_json::to_value(error).unwrap_or(Value::Null),
        }
    }

    /// Render as an HTTP reply.
    ///
    /// Error bodies are sent with status 200 (the code lives in the body)
    /// unless `mirror_error_status` is set.
    pub fn into_http(self, mirror_error_status: bool) -> HttpReply {
        match self {
            Self::Empty => HttpReply {
                status: 200,
                content_type: None,
                body: String::new(),
            },
            Self::Text(body) => HttpReply {
                status: 200,
                content_type: Some(TEXT_CONTENT_TYPE),
                body,
            },
            Self::Json(value) => HttpReply::json(200, &value),
            Self::Error(error) => {
                let status = if mirror_error_status { error.code } else { 200 };
                HttpReply::json(status, &error)
            }
        }
    }
}

impl From<ErrorResponse> for ApiResponse {
    fn from(error: ErrorResponse) -> Self {
        Self::Error(error)
    }
}

const TEXT_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";
const JSON_CONTENT_TYPE: &str = "application/json";

/// A response ready to be written by the host HTTP framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status
    pub status: u16,
    /// `Content-Type` header, absent for empty bodies
    pub content_type: Option<&'static str>,
    /// Body text
    pub body: String,
}

impl HttpReply {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status,
                content_type: Some(JSON_CONTENT_TYPE),
                body,
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response body");
                Self {
                    status: 500,
                    content_type: Some(JSON_CONTENT_TYPE),
                    body: r#"{"status":false,"code":500,"message":"Internal server error"}"#
                        .to_string(),
                }
            }
        }
    }
}
