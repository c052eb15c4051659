//! Responses and response helpers.

use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use isle_core::Method;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

const HTML: &str = "text/html; charset=utf-8";
const TEXT: &str = "text/plain; charset=utf-8";
const JSON: &str = "application/json";

/// A dispatched response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Response {
    /// An empty response with a status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }

    /// `200` HTML response.
    pub fn html(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK)
            .with_header(header::CONTENT_TYPE, HTML)
            .with_body(body)
    }

    /// `200` plain-text response.
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK)
            .with_header(header::CONTENT_TYPE, TEXT)
            .with_body(body)
    }

    /// `200` JSON response. A value that fails to serialize yields a `500`.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self::new(StatusCode::OK)
                .with_header(header::CONTENT_TYPE, JSON)
                .with_body(body),
            Err(e) => Self::internal_error(e.to_string()),
        }
    }

    /// `302` redirect.
    pub fn redirect(location: &str) -> Self {
        Self::redirect_with(location, StatusCode::FOUND)
    }

    /// Redirect with an explicit status.
    pub fn redirect_with(location: &str, status: StatusCode) -> Self {
        Self::new(status).with_header(header::LOCATION, location)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::error(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::error(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::error(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::error(StatusCode::NOT_FOUND, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// `405` listing the supported methods in the `Allow` header.
    pub fn method_not_allowed(allowed: &[Method]) -> Self {
        let allow = allowed
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Self::error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
            .with_header(header::ALLOW, &allow)
    }

    /// Error response with a `{"error": message}` JSON body.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        let body = json!({ "error": message.into() }).to_string();
        Self::new(status)
            .with_header(header::CONTENT_TYPE, JSON)
            .with_body(body)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Set a header. Values that are not valid header text are dropped.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(_) => warn!(header = %name, "Dropping invalid header value"),
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Header value as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Convert into an [`http::Response`].
    pub fn into_http(self) -> http::Response<String> {
        let mut response = http::Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
