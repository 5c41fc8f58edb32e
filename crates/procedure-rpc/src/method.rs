//! HTTP methods a procedure can be bound to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five HTTP verbs understood by the router.
///
/// The uppercase name is also the wire vocabulary of the hydration payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Read-only call without a body schema
    Get,
    /// Create / generic call with input
    Post,
    /// Replace call with input
    Put,
    /// Delete call
    Delete,
    /// Partial update call
    Patch,
}

impl Method {
    /// All methods in canonical order.
    pub const ALL: [Method; 5] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Patch,
    ];

    /// Returns the uppercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }

    /// Parses a method name as sent by an HTTP host, ignoring case.
    ///
    /// Returns `None` for verbs outside the supported set (`OPTIONS`, `HEAD`, ...).
    pub fn from_http(name: &str) -> Option<Self> {
        name.parse().ok()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unsupported method name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnsupportedMethod(pub String);

impl FromStr for Method {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnsupportedMethod(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("Patch".parse::<Method>().unwrap(), Method::Patch);
        assert_eq!(Method::from_http("DELETE"), Some(Method::Delete));
    }

    #[test]
    fn rejects_unsupported_verbs() {
        assert!("OPTIONS".parse::<Method>().is_err());
        assert_eq!(Method::from_http("HEAD"), None);
    }

    #[test]
    fn serializes_as_uppercase_name() {
        assert_eq!(serde_json::to_string(&Method::Put).unwrap(), "\"PUT\"");
        let m: Method = serde_json::from_str("\"PATCH\"").unwrap();
        assert_eq!(m, Method::Patch);
    }
}
