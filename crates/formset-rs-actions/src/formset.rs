//! The formset collaborator.
//!
//! A button never validates or aggregates form data itself; it delegates to
//! the [`Formset`] it belongs to. This module defines that contract and the
//! [`Response`] a submission produces.

use async_trait::async_trait;
use http::StatusCode;
use serde::Serialize;

use formset_rs_core::error::FormsetError;

/// The server's answer to a formset submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// HTTP status of the response.
    #[serde(with = "status_code")]
    pub status: StatusCode,
    /// Decoded JSON body; `null` when the body was empty or not JSON.
    pub body: serde_json::Value,
}

impl Response {
    /// Creates a response with the given status and JSON body.
    pub const fn new(status: StatusCode, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    /// A `200 OK` response with the given body.
    pub const fn ok(body: serde_json::Value) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Returns `true` for exactly HTTP 200; other 2xx codes do not count.
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// The `success_url` member of the JSON body, if it is a string.
    pub fn success_url(&self) -> Option<&str> {
        self.body.get("success_url").and_then(serde_json::Value::as_str)
    }
}

mod status_code {
    use http::StatusCode;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(status.as_u16())
    }
}

/// The operations a button needs from the formset it belongs to.
///
/// A formset is shared by every button attached to the same root element, so
/// implementations take `&self` and use interior mutability.
#[async_trait]
pub trait Formset: Send + Sync {
    /// Validates and submits the formset's data, merged with `extra_data`.
    ///
    /// Returns `Ok(None)` when nothing was sent (for instance because the
    /// form did not validate), `Ok(Some(response))` for any answer from the
    /// endpoint, whatever its status.
    async fn submit(
        &self,
        extra_data: Option<serde_json::Value>,
    ) -> Result<Option<Response>, FormsetError>;

    /// Restores every field to its initial value.
    fn reset_to_initial(&self);

    /// Aborts the formset's in-flight request, if any.
    fn abort(&self);

    /// Reads the current value at a dotted data path such as `person.email`.
    fn get_data_value(&self, path: &str) -> Option<serde_json::Value>;

    /// Removes all displayed validation errors.
    fn clear_errors(&self) {}
}
