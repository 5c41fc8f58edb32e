//! Configuration of the HTTP front.
//!
//! # Example
//! ```rust,ignore
//! use procedure_rpc::ServerConfig;
//!
//! let config = ServerConfig::default()
//!     .with_api_path("/rpc")
//!     .with_max_body_size(64 * 1024)
//!     .with_mirror_error_status(true);
//! config.validate()?;
//! assert_eq!(config.normalized_api_path(), "/rpc/");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigValidationError {
    /// api_path must start with `/`
    InvalidApiPath(String),
    /// max_body_size must be greater than 0
    InvalidMaxBodySize,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidApiPath(path) => {
                write!(f, "api_path must start with '/', got '{}'", path)
            }
            Self::InvalidMaxBodySize => {
                write!(f, "max_body_size must be greater than 0")
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Settings of an [`ApiServer`](crate::ApiServer).
///
/// # Fields
///
/// * `api_path` - URL prefix under which procedures are served. The procedure
///   path is whatever follows it. Default: `/api/`.
///
/// * `max_body_size` - Largest request body accepted, in bytes. Larger bodies
///   are rejected with a 400. JSON bodies are measured as read; form bodies,
///   which the host parses, are checked against their `Content-Length`
///   header. Default: 1MB.
///
/// * `mirror_error_status` - Send error bodies with the HTTP status equal to
///   their `code`. When off, every response goes out as 200 and the code only
///   lives in the body. Default: false.
///
/// * `expose_internal_errors` - Put the underlying message into 500 bodies
///   instead of `Internal server error`. Default: false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// URL prefix of the API (default: `/api/`)
    pub api_path: String,
    /// Maximum request body size in bytes (default: 1MB)
    pub max_body_size: usize,
    /// Mirror the body's code as HTTP status (default: false)
    pub mirror_error_status: bool,
    /// Expose server error messages to clients (default: false)
    pub expose_internal_errors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_path: "/api/".to_string(),
            max_body_size: 1024 * 1024, // 1MB
            mirror_error_status: false,
            expose_internal_errors: false,
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API prefix
    pub fn with_api_path(mut self, api_path: impl Into<String>) -> Self {
        self.api_path = api_path.into();
        self
    }

    /// Set the maximum request body size
    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Mirror error codes as HTTP status
    pub fn with_mirror_error_status(mut self, mirror: bool) -> Self {
        self.mirror_error_status = mirror;
        self
    }

    /// Expose server error messages
    pub fn with_expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }

    /// The API prefix, always ending with `/`
    pub fn normalized_api_path(&self) -> String {
        if self.api_path.ends_with('/') {
            self.api_path.clone()
        } else {
            format!("{}/", self.api_path)
        }
    }

    /// Validate the configuration and return an error if invalid.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `api_path` does not start with `/`
    /// - `max_body_size` is 0
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.api_path.starts_with('/') {
            return Err(ConfigValidationError::InvalidApiPath(self.api_path.clone()));
        }
        if self.max_body_size == 0 {
            return Err(ConfigValidationError::InvalidMaxBodySize);
        }
        Ok(())
    }
}
