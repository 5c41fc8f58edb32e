//! Input schemas: the seam to whatever validation engine a procedure uses.
//!
//! The dispatcher only needs two things from a schema: where its input comes
//! from ([`InputSource`]) and whether a decoded payload is acceptable. A
//! successful parse produces the typed value handed to the handler; a failed
//! one produces a [`Rejection`], which becomes a 400 response.

use crate::exchange::FormData;
use crate::response::ErrorMessage;
use crate::validation::{FieldError, Validate, ValidationResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::marker::PhantomData;
use tracing::debug;

/// Message used whenever a schema rejects input without field details.
pub const INVALID_INPUT: &str = "Invalid input";

/// Where a schema expects its payload to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// Request body parsed as JSON (raw text when it is not JSON)
    Json,
    /// Request body decoded as form fields
    FormData,
}

/// A decoded request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// JSON (or raw-text-as-string) payload
    Json(Value),
    /// Form fields
    Form(FormData),
}

impl Input {
    /// The JSON payload, if any
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Form(_) => None,
        }
    }

    /// The form payload, if any
    pub fn as_form(&self) -> Option<&FormData> {
        match self {
            Self::Json(_) => None,
            Self::Form(form) => Some(form),
        }
    }
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<FormData> for Input {
    fn from(form: FormData) -> Self {
        Self::Form(form)
    }
}

/// Why a schema refused an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// A single message for the whole input
    Message(String),
    /// Per-field failures
    Fields(Vec<FieldError>),
}

impl Rejection {
    /// The generic `Invalid input` rejection
    pub fn invalid() -> Self {
        Self::Message(INVALID_INPUT.to_string())
    }

    /// Wire message for the 400 body
    pub fn into_message(self) -> ErrorMessage {
        match self {
            Self::Message(message) => ErrorMessage::Single(message),
            Self::Fields(errors) if errors.is_empty() => ErrorMessage::Single(INVALID_INPUT.into()),
            Self::Fields(errors) => {
                ErrorMessage::Many(errors.into_iter().map(|e| e.message).collect())
            }
        }
    }
}

impl From<ValidationResult> for Rejection {
    fn from(result: ValidationResult) -> Self {
        Self::Fields(result.errors)
    }
}

/// A validation collaborator attached to a typed procedure.
pub trait Schema: Send + Sync + 'static {
    /// Value handed to the handler after a successful parse
    type Output: Send + 'static;

    /// Where the dispatcher should read the payload from
    fn source(&self) -> InputSource {
        InputSource::Json
    }

    /// Validate a decoded payload
    fn parse(&self, input: &Input) -> Result<Self::Output, Rejection>;
}

/// Object-safe view of a [`Schema`] stored inside a procedure.
pub(crate) trait ErasedSchema: Send + Sync {
    fn source(&self) -> InputSource;
    fn parse_any(&self, input: &Input) -> Result<Box<dyn Any + Send>, Rejection>;
}

impl<S: Schema> ErasedSchema for S {
    fn source(&self) -> InputSource {
        Schema::source(self)
    }

    fn parse_any(&self, input: &Input) -> Result<Box<dyn Any + Send>, Rejection> {
        self.parse(input)
            .map(|output| Box::new(output) as Box<dyn Any + Send>)
    }
}

fn json_payload(input: &Input) -> Result<&Value, Rejection> {
    input.as_json().ok_or_else(|| {
        debug!("JSON schema received form data");
        Rejection::invalid()
    })
}

/// Schema accepting any JSON that deserializes into `T`.
pub struct JsonInput<T>(PhantomData<fn() -> T>);

impl<T> JsonInput<T> {
    /// Create the schema
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonInput<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned + Send + 'static> Schema for JsonInput<T> {
    type Output = T;

    fn parse(&self, input: &Input) -> Result<T, Rejection> {
        let value = json_payload(input)?;
        T::deserialize(value).map_err(|e| {
            debug!(error = %e, "Input does not match schema");
            Rejection::invalid()
        })
    }
}

/// Shorthand for [`JsonInput::new`].
pub fn json<T: DeserializeOwned + Send + 'static>() -> JsonInput<T> {
    JsonInput::new()
}

/// Schema deserializing into `T` and then running its [`Validate`] rules.
///
/// Failing rules are reported field by field.
pub struct ValidatedInput<T>(PhantomData<fn() -> T>);

impl<T> ValidatedInput<T> {
    /// Create the schema
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for ValidatedInput<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned + Validate + Send + 'static> Schema for ValidatedInput<T> {
    type Output = T;

    fn parse(&self, input: &Input) -> Result<T, Rejection> {
        let value = json_payload(input)?;
        let parsed = T::deserialize(value).map_err(|e| {
            debug!(error = %e, "Input does not match schema");
            Rejection::invalid()
        })?;
        let result = parsed.validate();
        if result.is_valid() {
            Ok(parsed)
        } else {
            Err(result.into())
        }
    }
}

/// Shorthand for [`ValidatedInput::new`].
pub fn validated<T: DeserializeOwned + Validate + Send + 'static>() -> ValidatedInput<T> {
    ValidatedInput::new()
}

/// Schema built from a closure over the JSON payload.
pub struct FnSchema<F, T> {
    check: F,
    _output: PhantomData<fn() -> T>,
}

impl<F, T> Schema for FnSchema<F, T>
where
    F: Fn(&Value) -> Result<T, Rejection> + Send + Sync + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn parse(&self, input: &Input) -> Result<T, Rejection> {
        (self.check)(json_payload(input)?)
    }
}

/// Wrap a closure as a JSON schema.
///
/// ```rust,ignore
/// let positive = schema_fn(|value| value.as_u64().filter(|n| *n > 0).ok_or_else(Rejection::invalid));
/// ```
pub fn schema_fn<F, T>(check: F) -> FnSchema<F, T>
where
    F: Fn(&Value) -> Result<T, Rejection> + Send + Sync + 'static,
    T: Send + 'static,
{
    FnSchema {
        check,
        _output: PhantomData,
    }
}

/// Sentinel schema accepting any form submission.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyFormData;

impl Schema for AnyFormData {
    type Output = FormData;

    fn source(&self) -> InputSource {
        InputSource::FormData
    }

    fn parse(&self, input: &Input) -> Result<FormData, Rejection> {
        input.as_form().cloned().ok_or_else(|| {
            debug!("Form schema received a non-form payload");
            Rejection::invalid()
        })
    }
}

/// Form schema whose fields are checked by a closure.
pub struct FormSchema<F> {
    check: F,
}

impl<F> FormSchema<F>
where
    F: Fn(&FormData) -> ValidationResult + Send + Sync + 'static,
{
    /// Create the schema
    pub fn new(check: F) -> Self {
        Self { check }
    }
}

impl<F> Schema for FormSchema<F>
where
    F: Fn(&FormData) -> ValidationResult + Send + Sync + 'static,
{
    type Output = FormData;

    fn source(&self) -> InputSource {
        InputSource::FormData
    }

    fn parse(&self, input: &Input) -> Result<FormData, Rejection> {
        let form = AnyFormData.parse(input)?;
        let result = (self.check)(&form);
        if result.is_valid() {
            Ok(form)
        } else {
            Err(result.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationRules;
    use serde_json::json;

    #[test]
    fn json_schema_accepts_matching_value() {
        let schema = json::<String>();
        assert_eq!(
            schema.parse(&Input::Json(json!("Pepa"))).unwrap(),
            "Pepa".to_string()
        );
    }

    #[test]
    fn json_schema_rejects_mismatch_with_single_message() {
        let schema = json::<String>();
        let rejection = schema.parse(&Input::Json(json!(42))).unwrap_err();
        assert_eq!(
            rejection.into_message(),
            ErrorMessage::Single("Invalid input".into())
        );
    }

    #[test]
    fn json_schema_rejects_form_payload() {
        let schema = json::<Value>();
        assert!(schema.parse(&Input::Form(FormData::new())).is_err());
    }

    #[test]
    fn form_schema_reports_field_messages() {
        let schema = FormSchema::new(|form: &FormData| {
            ValidationRules::new()
                .present("username", form.get_text("username"))
                .present("password", form.get_text("password"))
                .build()
        });
        let form = FormData::new().with("username", "admin");
        let rejection = schema.parse(&Input::Form(form)).unwrap_err();
        assert_eq!(
            rejection.into_message(),
            ErrorMessage::Many(vec!["password is required".into()])
        );
    }

    #[test]
    fn any_form_data_declares_form_source() {
        assert_eq!(Schema::source(&AnyFormData), InputSource::FormData);
        assert_eq!(Schema::source(&json::<u32>()), InputSource::Json);
        assert!(AnyFormData.parse(&Input::Json(json!({}))).is_err());
    }

    #[test]
    fn schema_fn_runs_closure() {
        let positive = schema_fn(|value: &Value| {
            value
                .as_u64()
                .filter(|n| *n > 0)
                .ok_or_else(Rejection::invalid)
        });
        assert_eq!(positive.parse(&Input::Json(json!(3))).unwrap(), 3);
        assert!(positive.parse(&Input::Json(json!(0))).is_err());
    }
}
