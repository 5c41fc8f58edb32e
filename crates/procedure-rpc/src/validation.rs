//! Input Validation Framework
//!
//! Field-level error reporting for procedure inputs. Types implementing
//! [`Validate`] can be used with [`ValidatedInput`](crate::schema::ValidatedInput),
//! whose failures reach the client as one message per field.
//!
//! # Example
//!
//! ```rust,ignore
//! use procedure_rpc::validation::{Validate, ValidationResult, ValidationRules};
//!
//! #[derive(Debug, Deserialize)]
//! struct SignUp {
//!     name: String,
//!     email: String,
//!     age: i64,
//! }
//!
//! impl Validate for SignUp {
//!     fn validate(&self) -> ValidationResult {
//!         ValidationRules::new()
//!             .required("name", &self.name)
//!             .max_length("name", &self.name, 100)
//!             .email("email", &self.email)
//!             .range("age", self.age, 0, 150)
//!             .build()
//!     }
//! }
//! ```

use crate::RouterError;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// Validation error for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// The name of the field that failed validation
    pub field: String,
    /// Human-readable error message
    pub message: String,
    /// Error code identifying the type of validation failure
    pub code: String,
}

impl FieldError {
    /// Create a new field error
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: code.into(),
        }
    }

    /// Create a "required" field error
    pub fn required(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(&field, format!("{} is required", field), "required")
    }

    /// Create a "min_length" field error
    pub fn min_length(field: impl Into<String>, min: usize) -> Self {
        let field = field.into();
        Self::new(
            &field,
            format!("{} must be at least {} characters", field, min),
            "min_length",
        )
    }

    /// Create a "max_length" field error
    pub fn max_length(field: impl Into<String>, max: usize) -> Self {
        let field = field.into();
        Self::new(
            &field,
            format!("{} must be at most {} characters", field, max),
            "max_length",
        )
    }

    /// Create a "range" field error
    pub fn range(field: impl Into<String>, min: i64, max: i64) -> Self {
        let field = field.into();
        Self::new(
            &field,
            format!("{} must be between {} and {}", field, min, max),
            "range",
        )
    }

    /// Create a "pattern" field error
    pub fn pattern(field: impl Into<String>, pattern: &str) -> Self {
        let field = field.into();
        Self::new(
            &field,
            format!("{} must match pattern: {}", field, pattern),
            "pattern",
        )
    }

    /// Create an "email" field error
    pub fn email(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            &field,
            format!("{} must be a valid email address", field),
            "email",
        )
    }

    /// Create a custom field error
    pub fn custom(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, message, "custom")
    }
}

/// Result of validating an input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the input is valid
    pub valid: bool,
    /// List of field-level errors (empty if valid)
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// Create a validation result from a list of errors.
    /// If the list is empty, the result is valid.
    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        if !errors.is_empty() {
            let field_names: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
            debug!(
                error_count = errors.len(),
                fields = ?field_names,
                "Validation failed"
            );
        }
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Get the errors
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Merge another validation result into this one
    pub fn merge(mut self, other: ValidationResult) -> Self {
        self.errors.extend(other.errors);
        self.valid = self.errors.is_empty();
        self
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

/// Trait for validatable input types.
pub trait Validate {
    /// Validate the input and return a result with any errors
    fn validate(&self) -> ValidationResult;
}

impl Validate for () {
    fn validate(&self) -> ValidationResult {
        ValidationResult::ok()
    }
}

impl Validate for serde_json::Value {
    fn validate(&self) -> ValidationResult {
        ValidationResult::ok()
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> ValidationResult {
        match self {
            Some(value) => value.validate(),
            None => ValidationResult::ok(),
        }
    }
}

/// Builder for validation rules.
///
/// ```rust,ignore
/// let result = ValidationRules::new()
///     .required("name", &input.name)
///     .min_length("name", &input.name, 2)
///     .pattern("phone", &input.phone, r"^\+?[0-9]{10,15}$")
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct ValidationRules {
    errors: Vec<FieldError>,
}

impl ValidationRules {
    /// Create a new validation rules builder
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add a custom error
    pub fn add_error(mut self, error: FieldError) -> Self {
        self.errors.push(error);
        self
    }

    /// Validate that a string field is not empty (required)
    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            trace!(field = %field, "Required field is empty");
            self.errors.push(FieldError::required(field));
        }
        self
    }

    /// Validate that an optional field is present and not blank
    pub fn present(mut self, field: &str, value: Option<&str>) -> Self {
        if value.is_none_or(|v| v.trim().is_empty()) {
            trace!(field = %field, "Field missing or blank");
            self.errors.push(FieldError::required(field));
        }
        self
    }

    /// Validate minimum string length
    pub fn min_length(mut self, field: &str, value: &str, min: usize) -> Self {
        if value.chars().count() < min {
            trace!(field = %field, min = min, "Field below minimum length");
            self.errors.push(FieldError::min_length(field, min));
        }
        self
    }

    /// Validate maximum string length
    pub fn max_length(mut self, field: &str, value: &str, max: usize) -> Self {
        if value.chars().count() > max {
            trace!(field = %field, max = max, "Field exceeds maximum length");
            self.errors.push(FieldError::max_length(field, max));
        }
        self
    }

    /// Validate that a number is within a range (inclusive)
    pub fn range(mut self, field: &str, value: i64, min: i64, max: i64) -> Self {
        if value < min || value > max {
            trace!(field = %field, value = value, min = min, max = max, "Field outside valid range");
            self.errors.push(FieldError::range(field, min, max));
        }
        self
    }

    /// Validate that a string matches a regex pattern
    pub fn pattern(mut self, field: &str, value: &str, pattern: &str) -> Self {
        match regex::Regex::new(pattern) {
            Ok(re) => {
                if !re.is_match(value) {
                    trace!(field = %field, pattern = %pattern, "Field does not match pattern");
                    self.errors.push(FieldError::pattern(field, pattern));
                }
            }
            Err(e) => {
                // A broken pattern is a programming error, never a client error.
                warn!(field = %field, pattern = %pattern, error = %e, "Invalid validation regex pattern");
                self.errors.push(FieldError::new(
                    field,
                    format!("Invalid validation pattern: {}", pattern),
                    "invalid_pattern",
                ));
            }
        }
        self
    }

    /// Validate that a string is a valid email address
    pub fn email(mut self, field: &str, value: &str) -> Self {
        let is_valid = match value.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            }
            None => false,
        };

        if !is_valid {
            trace!(field = %field, "Invalid email format");
            self.errors.push(FieldError::email(field));
        }
        self
    }

    /// Add a custom validation with a predicate
    pub fn custom<F>(mut self, field: &str, predicate: F, message: &str) -> Self
    where
        F: FnOnce() -> bool,
    {
        if !predicate() {
            trace!(field = %field, message = %message, "Custom validation failed");
            self.errors.push(FieldError::custom(field, message));
        }
        self
    }

    /// Build the validation result
    pub fn build(self) -> ValidationResult {
        ValidationResult::from_errors(self.errors)
    }
}

/// Validate one key of a route declaration.
///
/// Keys become path segments, so they must be non-empty and free of `/`.
pub fn validate_route_key(key: &str, parent: &str) -> Result<(), RouterError> {
    if key.is_empty() || key.contains('/') {
        return Err(RouterError::InvalidSegment {
            key: key.to_string(),
            parent: parent.to_string(),
        });
    }
    Ok(())
}
