//! Transport-neutral request and response values.

use std::time::Duration;

use bytes::Bytes;
use hyper::Method;
use serde_json::Value;

use crate::cookies;
use crate::error::{TransportError, TransportResult};

/// A fully bound outbound HTTP request.
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundRequest {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    timeout: Option<Duration>,
}

impl OutboundRequest {
    /// Creates a request without headers or body.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Appends a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a header, replacing any existing value with the same
    /// (case-insensitive) name.
    #[must_use]
    pub fn with_header_replaced(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Serializes `body` as the JSON request body.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidRequest`] if the value cannot be
    /// serialized.
    pub fn with_json_body(mut self, body: &Value) -> TransportResult<Self> {
        let bytes = serde_json::to_vec(body)
            .map_err(|err| TransportError::invalid_request(format!("failed to encode body: {err}")))?;
        self.body = Some(Bytes::from(bytes));
        Ok(self)
    }

    /// Overrides the transport's default timeout for this request.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute URL including the query string.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Request body.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Per-request timeout override.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// A received HTTP response with its body fully read.
#[derive(Clone, Debug, PartialEq)]
pub struct InboundResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl InboundResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Headers in received order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Every value of a header, matched case-insensitively.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Value of the cookie `name` set by this response.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<String> {
        cookies::find_set_cookie(self.header_values("set-cookie"), name)
    }

    /// Raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON, or `None` if it is not JSON.
    #[must_use]
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn replaced_headers_are_case_insensitive() {
        let request = OutboundRequest::new(Method::GET, "http://x")
            .with_header("accept", "text/plain")
            .with_header_replaced("Accept", "application/json");
        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.header("ACCEPT"), Some("application/json"));
    }

    #[test]
    fn response_body_helpers() {
        let response = InboundResponse::new(
            201,
            vec![("Set-Cookie".into(), "JSESSIONID=abc123; Path=/; HttpOnly".into())],
            Bytes::from_static(b"{\"id\":1}"),
        );
        assert!(response.is_success());
        assert_eq!(response.json(), Some(json!({ "id": 1 })));
        assert_eq!(response.cookie("JSESSIONID").as_deref(), Some("abc123"));

        let text = InboundResponse::new(500, Vec::new(), Bytes::from_static(b"oops"));
        assert!(!text.is_success());
        assert_eq!(text.json(), None);
        assert_eq!(text.text(), "oops");
    }
}
