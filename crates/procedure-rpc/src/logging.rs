//! Request correlation and dispatch logging
//!
//! Every dispatch gets a [`RequestId`] and runs inside an `rpc.dispatch`
//! span. The outcome is logged once, at a level chosen from the response
//! code: client errors at `debug`, server errors at `error`.

use crate::response::ApiResponse;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{Span, debug, error, info_span};

/// Number of characters kept by [`RequestId::short`].
pub const SHORT_ID_LENGTH: usize = 8;

/// Unique identifier for a request, used for tracing and correlation.
///
/// Uses UUID v7 for time-ordered, sortable identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(uuid::Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)))
    }

    /// Returns the short form of the request ID.
    pub fn short(&self) -> String {
        let full = self.0.to_string();
        full.chars().take(SHORT_ID_LENGTH).collect()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for RequestId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl std::str::FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

/// Span wrapping one dispatch.
pub(crate) fn dispatch_span(request_id: &RequestId, path: &str, method: &str) -> Span {
    info_span!(
        "rpc.dispatch",
        request_id = %request_id.short(),
        path = %path,
        method = %method,
    )
}

/// Log the final outcome of a dispatch.
pub(crate) fn log_outcome(response: &ApiResponse, duration: Duration) {
    let duration_ms = duration.as_secs_f64() * 1000.0;
    match response.error() {
        None => debug!(duration_ms = duration_ms, "Dispatch completed"),
        Some(failure) if failure.code >= 500 => error!(
            code = failure.code,
            message = %failure.message,
            duration_ms = duration_ms,
            "Dispatch failed"
        ),
        Some(failure) => debug!(
            code = failure.code,
            message = %failure.message,
            duration_ms = duration_ms,
            "Dispatch rejected"
        ),
    }
}

/// Readable form of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
