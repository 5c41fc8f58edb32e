//! The host HTTP exchange and form-data payloads.
//!
//! The router never speaks HTTP itself. The host framework hands every request
//! over as an [`Exchange`], which is passed through to the context factory,
//! middleware and handlers unchanged.

use crate::{RpcError, RpcResult};
use async_trait::async_trait;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Request side of the host's request/response object.
#[async_trait]
pub trait Exchange: Send + Sync + 'static {
    /// HTTP method as sent by the client
    fn method(&self) -> &str;

    /// Full request URL or path (`https://host/api/x?y` or `/api/x`)
    fn url(&self) -> &str;

    /// Value of a request cookie
    fn cookie(&self, name: &str) -> Option<String>;

    /// Value of a request header (case-insensitive name)
    fn header(&self, name: &str) -> Option<String>;

    /// Read the body as text
    async fn text(&self) -> RpcResult<String>;

    /// Read the body as multipart / urlencoded form fields
    async fn form_data(&self) -> RpcResult<FormData>;
}

/// Exchange handle shared by every stage of a dispatch.
pub type SharedExchange = Arc<dyn Exchange>;

/// Pathname of a request URL: scheme, authority, query and fragment removed.
pub fn request_path(url: &str) -> &str {
    let without_origin = match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "/",
            }
        }
        None => url,
    };
    let end = without_origin
        .find(['?', '#'])
        .unwrap_or(without_origin.len());
    &without_origin[..end]
}

/// One value of a form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// Plain text field
    Text(String),
    /// Uploaded file
    File {
        /// Client-side file name
        name: String,
        /// Declared media type
        content_type: Option<String>,
        /// File contents
        data: Vec<u8>,
    },
}

impl FormValue {
    /// Text content, if this is a text field
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::File { .. } => None,
        }
    }
}

impl Serialize for FormValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::File {
                name,
                content_type,
                data,
            } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("name", name)?;
                map.serialize_entry("type", content_type)?;
                map.serialize_entry("size", &data.len())?;
                map.end()
            }
        }
    }
}

/// Ordered multi-map of form fields, as decoded by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    /// Create an empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value, keeping existing values of the same name
    pub fn append(&mut self, name: impl Into<String>, value: FormValue) {
        self.fields.push((name.into(), value));
    }

    /// Replace every value of `name` with a single text value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.fields.retain(|(field, _)| *field != name);
        self.fields.push((name, FormValue::Text(value.into())));
    }

    /// Builder-style [`FormData::set`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// First value of `name`
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// First value of `name` when it is a text field
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FormValue::as_text)
    }

    /// All values of `name`, in submission order
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FormValue> + 'a {
        self.fields
            .iter()
            .filter(move |(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Whether a field is present
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All entries in submission order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.fields
            .iter()
            .map(|(field, value)| (field.as_str(), value))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the form has no entries
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON object view; the last value of a repeated field wins.
    pub fn to_json(&self) -> Value {
        let mut object = serde_json::Map::new();
        for (field, value) in &self.fields {
            object.insert(
                field.clone(),
                serde_json::to_value(value).unwrap_or(Value::Null),
            );
        }
        Value::Object(object)
    }
}

impl Serialize for FormData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), FormValue::Text(v.into())))
                .collect(),
        }
    }
}

/// In-memory exchange for server rendering, tests and loopback transports.
#[derive(Debug, Clone, Default)]
pub struct MemoryExchange {
    method: String,
    url: String,
    cookies: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: Option<String>,
    form: Option<FormData>,
}

impl MemoryExchange {
    /// Create an exchange for the given method and URL
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Set a request cookie
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Set a request header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Set a text body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a JSON body
    pub fn with_json(self, body: &Value) -> Self {
        self.with_body(body.to_string())
    }

    /// Set a form body
    pub fn with_form(mut self, form: FormData) -> Self {
        self.form = Some(form);
        self
    }

    /// Wrap into a shared exchange
    pub fn shared(self) -> SharedExchange {
        Arc::new(self)
    }
}

#[async_trait]
impl Exchange for MemoryExchange {
    fn method(&self) -> &str {
        &self.method
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers.get(&name.to_ascii_lowercase()).cloned()
    }

    async fn text(&self) -> RpcResult<String> {
        Ok(self.body.clone().unwrap_or_default())
    }

    async fn form_data(&self) -> RpcResult<FormData> {
        self.form
            .clone()
            .ok_or_else(|| RpcError::bad_request("Request body is not form data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_path_strips_origin_and_query() {
        assert_eq!(request_path("https://example.com/api/a/b?x=1"), "/api/a/b");
        assert_eq!(request_path("http://localhost:5173"), "/");
        assert_eq!(request_path("/api/hello#top"), "/api/hello");
        assert_eq!(request_path("/api/hello"), "/api/hello");
    }

    #[test]
    fn form_set_replaces_all_values() {
        let mut form = FormData::new();
        form.append("tag", FormValue::Text("a".into()));
        form.append("tag", FormValue::Text("b".into()));
        assert_eq!(form.get_all("tag").count(), 2);

        form.set("tag", "c");
        assert_eq!(form.get_all("tag").count(), 1);
        assert_eq!(form.get_text("tag"), Some("c"));
    }

    #[test]
    fn form_json_view_keeps_last_value() {
        let form: FormData = [("name", "Patrik"), ("name", "Pepa"), ("pw", "x")]
            .into_iter()
            .collect();
        assert_eq!(
            form.to_json(),
            serde_json::json!({"name": "Pepa", "pw": "x"})
        );
    }

    #[tokio::test]
    async fn memory_exchange_without_form_rejects_form_read() {
        let exchange = MemoryExchange::new("POST", "/api/form").with_body("{}");
        assert!(exchange.form_data().await.is_err());
        assert_eq!(exchange.text().await.unwrap(), "{}");
    }
}
