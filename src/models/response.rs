//! HTTP response data models.
//!
//! This module defines the buffered response returned by the fetcher, and the
//! [`Resolved`] value produced when a resolver decodes the body.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Represents an HTTP response received from a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// HTTP status code (e.g., 200, 404, 500).
    pub status_code: u16,

    /// HTTP status text (e.g., "OK", "Not Found").
    pub status_text: String,

    /// Final URL of the response, after redirects.
    pub url: String,

    /// Response headers as key-value pairs, with lowercase names.
    ///
    /// Repeated headers are joined with ", ".
    pub headers: HashMap<String, String>,

    /// Response body as raw bytes.
    pub body: Vec<u8>,

    /// Time from dispatch to the complete body being received.
    pub duration: Duration,
}

impl HttpResponse {
    /// Creates a new HttpResponse with the given status code and text.
    pub fn new(status_code: u16, status_text: String) -> Self {
        Self {
            status_code,
            status_text,
            url: String::new(),
            headers: HashMap::new(),
            body: Vec::new(),
            duration: Duration::from_secs(0),
        }
    }

    /// Checks if the response status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Checks if the response status indicates a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    /// Checks if the response status indicates a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }

    /// Looks up a header value, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Gets the Content-Type header value if present.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Whether the server returned no body bytes.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Attempts to parse the response body as UTF-8 text.
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.clone())
    }

    /// Parses the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Adds a header to the response.
    pub fn add_header(&mut self, name: String, value: String) {
        self.headers.insert(name, value);
    }

    /// Sets the response body.
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }
}

/// Raw body bytes tagged with their content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Result of [`Highway::handle`](crate::client::Highway::handle).
///
/// Without a resolver the response itself comes back; with one, the decoded
/// body. `Empty` stands for "no value": the `Void` resolver, or an empty body
/// with any resolver when the request did not require one.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Response(HttpResponse),
    Text(String),
    Json(serde_json::Value),
    Blob(Blob),
    Bytes(Vec<u8>),
    Form(Vec<(String, String)>),
    Empty,
}

impl Resolved {
    pub fn is_empty(&self) -> bool {
        matches!(self, Resolved::Empty)
    }

    pub fn into_response(self) -> Option<HttpResponse> {
        match self {
            Resolved::Response(response) => Some(response),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Resolved::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the body bytes of a `Bytes`, `Blob` or `Response` value.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Resolved::Bytes(bytes) => Some(bytes),
            Resolved::Blob(blob) => Some(blob.bytes),
            Resolved::Response(response) => Some(response.body),
            _ => None,
        }
    }

    pub fn into_form(self) -> Option<Vec<(String, String)>> {
        match self {
            Resolved::Form(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Deserializes a `Json` value into `T`.
    ///
    /// Returns `Ok(None)` for any other variant.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<Option<T>, serde_json::Error> {
        match self {
            Resolved::Json(value) => serde_json::from_value(value).map(Some),
            _ => Ok(None),
        }
    }
}
