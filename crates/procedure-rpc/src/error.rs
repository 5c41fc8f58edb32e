//! Error types for RPC operations
//!
//! Three families live here:
//!
//! - [`RpcError`]: failures raised by handlers, middleware or collaborators at
//!   request time. The dispatcher turns them into wire error bodies.
//! - [`RouterError`]: construction-time failures of a route declaration. They
//!   are fatal; a router is never partially built.
//! - [`ClientError`]: failures of a client stub before a response body exists.
//!
//! # Example
//! ```rust,ignore
//! use procedure_rpc::{RpcError, RpcErrorCode};
//!
//! let error = RpcError::new(RpcErrorCode::NotFound, "User not found");
//! let error = RpcError::not_found("User not found"); // Convenience method
//! ```

use crate::response::ErrorResponse;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Type-safe error codes for RPC operations.
///
/// When serialized, codes are converted to SCREAMING_SNAKE_CASE
/// (e.g., `NotFound` becomes `"NOT_FOUND"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum RpcErrorCode {
    // Client errors (4xx equivalent)
    /// The request was malformed or invalid
    BadRequest,
    /// Authentication is required
    Unauthorized,
    /// The authenticated user lacks permission
    Forbidden,
    /// The requested resource was not found
    NotFound,
    /// The resolved path does not accept the method
    MethodNotSupported,
    /// Input validation failed
    ValidationError,
    /// The request conflicts with current state
    Conflict,
    /// The request payload exceeds size limits
    PayloadTooLarge,

    // Server errors (5xx equivalent)
    /// An unexpected internal error occurred
    InternalError,
    /// The requested functionality is not implemented
    NotImplemented,
    /// The service is temporarily unavailable
    ServiceUnavailable,
    /// JSON serialization/deserialization failed
    SerializationError,
}

impl RpcErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::MethodNotSupported => "METHOD_NOT_SUPPORTED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::Conflict => "CONFLICT",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::InternalError => "INTERNAL_ERROR",
            Self::NotImplemented => "NOT_IMPLEMENTED",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::SerializationError => "SERIALIZATION_ERROR",
        }
    }

    /// HTTP status code carried in the wire error body.
    ///
    /// `MethodNotSupported` maps to 403, matching the router's own rejection.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadRequest | Self::ValidationError => 400,
            Self::Unauthorized => 401,
            Self::Forbidden | Self::MethodNotSupported => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::PayloadTooLarge => 413,
            Self::InternalError | Self::SerializationError => 500,
            Self::NotImplemented => 501,
            Self::ServiceUnavailable => 503,
        }
    }

    /// Returns true if this is a client error (4xx equivalent).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }

    /// Returns true if this is a server error (5xx equivalent).
    pub fn is_server_error(&self) -> bool {
        self.http_status() >= 500
    }
}

impl fmt::Display for RpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// RPC error with type-safe code and message.
///
/// # Example
/// ```rust,ignore
/// use procedure_rpc::{RpcError, RpcErrorCode};
///
/// let error = RpcError::new(RpcErrorCode::Conflict, "Username taken")
///     .with_cause("unique index users_name_key");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[error("[{code}] {message}")]
pub struct RpcError {
    /// Type-safe error code
    pub code: RpcErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional cause for debugging (never sent to clients)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cause: Option<String>,
}

impl RpcError {
    /// Create a new error with code and message.
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    /// Add a cause string for debugging.
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Convert into the wire error body.
    ///
    /// Server errors are reduced to `Internal server error` unless `expose`
    /// is set; client errors keep their message.
    pub fn to_response(&self, expose: bool) -> ErrorResponse {
        let status = self.code.http_status();
        if self.code.is_server_error() && !expose {
            debug!(
                original_code = %self.code,
                original_message = %self.message,
                "Sanitizing server error for client response"
            );
            return ErrorResponse::internal();
        }
        ErrorResponse::new(status, self.message.clone())
    }

    // Convenience constructors

    /// Create a NOT_FOUND error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::NotFound, message)
    }

    /// Create a BAD_REQUEST error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::BadRequest, message)
    }

    /// Create a VALIDATION_ERROR error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::ValidationError, message)
    }

    /// Create an UNAUTHORIZED error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::Unauthorized, message)
    }

    /// Create a FORBIDDEN error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::Forbidden, message)
    }

    /// Create an INTERNAL_ERROR error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InternalError, message)
    }

    /// Create a CONFLICT error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::Conflict, message)
    }

    /// Create a PAYLOAD_TOO_LARGE error.
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::PayloadTooLarge, message)
    }

    /// Create a SERIALIZATION_ERROR error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::SerializationError, message)
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

/// Result type alias for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// Construction-time errors of a route declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RouterError {
    /// `.input(..)` was called on a GET procedure
    #[error("GET method does not support input")]
    InputOnGet,
    /// A route key is empty or contains `/`
    #[error("invalid route key '{key}' under '{parent}': keys must be non-empty and must not contain '/'")]
    InvalidSegment {
        /// The offending key
        key: String,
        /// Path of the declaration holding the key (empty at the root)
        parent: String,
    },
    /// A procedure group holds more than one nested declaration
    #[error("procedure group at '{path}' contains {count} nested declarations; at most one is allowed")]
    MultipleSubDeclarations {
        /// Path of the group
        path: String,
        /// Number of nested declarations found
        count: usize,
    },
    /// The hydration payload of a declaration would nest deeper than `limit`
    #[error("routes below '{path}' nest deeper than {limit} levels")]
    NestingTooDeep {
        /// Path of the node whose children exceed the limit
        path: String,
        /// The nesting limit
        limit: usize,
    },
}

/// Errors raised by client stubs and transports.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The transport could not complete the exchange
    #[error("transport failed: {0}")]
    Transport(String),
    /// The request body could not be encoded
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}
