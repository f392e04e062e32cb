//! Error types for request dispatch and response resolution.
//!
//! Failures are split in two families: [`HighwayError`] covers everything that
//! prevents a usable result (bad URLs, network failures, empty bodies...), and
//! [`ApiError`] wraps a response that came back with a non-success status.

use crate::models::request::HttpMethod;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::OnceCell;
use url::Url;

/// Errors that can occur while building, sending or resolving a request.
#[derive(Debug, Error)]
pub enum HighwayError {
    /// The URL could not be parsed or is malformed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A relative path was given to an instance without a base URL.
    #[error("Relative path {0:?} requires a base URL")]
    MissingBase(String),

    /// A header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The instance configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A body was attached to a method that cannot carry one.
    #[error("{0} requests cannot carry a body")]
    BodyNotAllowed(HttpMethod),

    /// The request body could not be serialized.
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Connection failures, DNS errors, and other transport issues.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The request took longer than the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The response body was empty although the request required one.
    #[error("api call returned an empty response body")]
    EmptyBody,

    /// The response body could not be decoded with the requested resolver.
    #[error("Failed to decode response body: {0}")]
    Decode(String),
}

impl HighwayError {
    /// Returns the wrapped [`ApiError`] if this error comes from a non-success status.
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            HighwayError::Api(e) => Some(e),
            _ => None,
        }
    }
}

/// Type check for [`ApiError`].
pub fn is_api_error(error: &HighwayError) -> bool {
    error.as_api_error().is_some()
}

impl From<reqwest::Error> for HighwayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HighwayError::Timeout
        } else {
            HighwayError::Network(err)
        }
    }
}

impl From<url::ParseError> for HighwayError {
    fn from(err: url::ParseError) -> Self {
        HighwayError::InvalidUrl(err.to_string())
    }
}

/// Wraps a non-success HTTP response into a convenient error.
///
/// Status, URL and headers are available immediately. The body is only read
/// when [`ApiError::text`] is first awaited, and the text is kept afterwards
/// because a response body can only be consumed once. Clones share the same
/// underlying response and cached text.
#[derive(Clone)]
pub struct ApiError {
    inner: Arc<ApiErrorInner>,
}

struct ApiErrorInner {
    status: StatusCode,
    url: Url,
    headers: HeaderMap,
    response: Mutex<Option<reqwest::Response>>,
    text: OnceCell<String>,
}

impl ApiError {
    pub fn new(response: reqwest::Response) -> Self {
        Self {
            inner: Arc::new(ApiErrorInner {
                status: response.status(),
                url: response.url().clone(),
                headers: response.headers().clone(),
                response: Mutex::new(Some(response)),
                text: OnceCell::new(),
            }),
        }
    }

    /// HTTP status code of the response.
    pub fn status(&self) -> u16 {
        self.inner.status.as_u16()
    }

    pub fn status_code(&self) -> StatusCode {
        self.inner.status
    }

    /// Canonical reason phrase for the status, e.g. "Not Found".
    pub fn status_text(&self) -> &'static str {
        self.inner.status.canonical_reason().unwrap_or("Unknown")
    }

    /// Final URL of the response, after redirects.
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    /// Returns the text body of the response.
    ///
    /// The first call reads the body; later calls return the cached text.
    /// Concurrent callers wait for the same read. If that read fails, the
    /// body is gone: later calls fail with `Decode` instead of returning text.
    pub async fn text(&self) -> Result<&str, HighwayError> {
        let text = self
            .inner
            .text
            .get_or_try_init(|| async {
                let response = self
                    .inner
                    .response
                    .lock()
                    .ok()
                    .and_then(|mut slot| slot.take());

                match response {
                    Some(response) => response.text().await.map_err(HighwayError::from),
                    None => Err(HighwayError::Decode(
                        "response body already consumed".to_string(),
                    )),
                }
            })
            .await?;

        Ok(text.as_str())
    }
}

impl fmt::Debug for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiError")
            .field("status", &self.inner.status)
            .field("url", &self.inner.url.as_str())
            .finish()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API error: {} {} ({})",
            self.status(),
            self.status_text(),
            self.inner.url
        )
    }
}

impl std::error::Error for ApiError {}
