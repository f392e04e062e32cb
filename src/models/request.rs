//! HTTP request data models.
//!
//! This module defines the request description handed to
//! [`Highway::handle`](crate::client::Highway::handle): the method, the path
//! (relative to the instance base or absolute), headers, query parameters, the
//! body, and how the response should be resolved.

use crate::config::RequestOptions;
use serde::{Deserialize, Serialize};

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// HTTP GET method - retrieve a resource
    GET,
    /// HTTP POST method - submit data to create a resource
    POST,
    /// HTTP PUT method - replace a resource
    PUT,
    /// HTTP PATCH method - partially modify a resource
    PATCH,
    /// HTTP DELETE method - remove a resource
    DELETE,
}

impl HttpMethod {
    /// Returns the string representation of the HTTP method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
        }
    }

    /// Parses a string into an HttpMethod.
    ///
    /// # Returns
    ///
    /// `Some(HttpMethod)` if the string is a supported method (case-insensitive),
    /// `None` otherwise.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "PATCH" => Some(HttpMethod::PATCH),
            "DELETE" => Some(HttpMethod::DELETE),
            _ => None,
        }
    }

    /// Whether a request with this method may carry a body.
    pub fn allows_body(&self) -> bool {
        !matches!(self, HttpMethod::GET)
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::GET => reqwest::Method::GET,
            HttpMethod::POST => reqwest::Method::POST,
            HttpMethod::PUT => reqwest::Method::PUT,
            HttpMethod::PATCH => reqwest::Method::PATCH,
            HttpMethod::DELETE => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request body.
///
/// Raw bodies are sent untouched. JSON bodies are serialized when the request
/// is dispatched; no `Content-Type` header is added for them.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

/// How a successful response body is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resolver {
    /// UTF-8 text.
    Text,
    /// Any JSON value.
    Json,
    /// Raw bytes together with the response content type.
    Blob,
    /// Raw bytes.
    Bytes,
    /// `application/x-www-form-urlencoded` pairs.
    Form,
    /// Ignore the body.
    Void,
}

impl Resolver {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolver::Text => "text",
            Resolver::Json => "json",
            Resolver::Blob => "blob",
            Resolver::Bytes => "bytes",
            Resolver::Form => "form",
            Resolver::Void => "void",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(Resolver::Text),
            "json" => Some(Resolver::Json),
            "blob" => Some(Resolver::Blob),
            "bytes" | "arraybuffer" => Some(Resolver::Bytes),
            "form" | "formdata" => Some(Resolver::Form),
            "void" => Some(Resolver::Void),
            _ => None,
        }
    }
}

/// What to do with the response once it arrives.
///
/// `Soft` and resolvers are mutually exclusive: a soft request always gets the
/// response back untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseMode {
    /// Fail on non-success statuses, return the response otherwise.
    #[default]
    Raw,
    /// Never fail on status, return the response as the server sent it.
    Soft,
    /// Fail on non-success statuses, decode the body otherwise.
    Resolve(Resolver),
}

/// A request to dispatch through a [`Highway`](crate::client::Highway) instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// HTTP method. Shorthands such as `get` and `post` overwrite it.
    pub method: HttpMethod,

    /// Path of the request. It may be relative only if the instance has a base URL.
    pub path: String,

    /// Headers for this request, merged with (and overriding) the instance headers.
    ///
    /// Names and values are validated when the request is dispatched.
    pub headers: Vec<(String, String)>,

    /// Query parameters appended after the merged URL's own query.
    pub params: Vec<(String, String)>,

    pub body: Option<Body>,

    /// Options merged with (and overriding) the instance options.
    pub options: RequestOptions,

    pub mode: ResponseMode,

    /// When set, an empty response body is an error.
    ///
    /// This is independent of the status: a 204 response with `must` set still
    /// fails, while any status with an empty body passes when it is unset.
    pub must: bool,
}

impl Request {
    /// Creates a new request with the given method and path.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            params: Vec::new(),
            body: None,
            options: RequestOptions::default(),
            mode: ResponseMode::Raw,
            must: false,
        }
    }

    /// Creates a GET request for `path`, meant to be passed to a shorthand.
    pub fn to(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::GET, path)
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Adds a header. A later header with the same name overrides earlier ones.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds a query parameter. Repeated keys are kept.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `value` as the JSON body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(Body::Json(serde_json::to_value(value)?));
        Ok(self)
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the per-request timeout in milliseconds.
    pub fn timeout(mut self, timeout_ms: u64) -> Self {
        self.options.timeout = Some(timeout_ms);
        self
    }

    /// Decodes the body with `resolver` instead of returning the response.
    pub fn resolver(mut self, resolver: Resolver) -> Self {
        self.mode = ResponseMode::Resolve(resolver);
        self
    }

    /// Returns the response as-is, whatever its status.
    pub fn soft(mut self) -> Self {
        self.mode = ResponseMode::Soft;
        self
    }

    pub fn must(mut self) -> Self {
        self.must = true;
        self
    }

    /// Checks if the request has a body.
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}
