//! Configuration schema for Highway instances.
//!
//! This module defines the settings structure applied to every request made
//! through an instance, and the per-request options that can be partially
//! overridden on each call.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Main configuration structure for a [`Highway`](crate::client::Highway) instance.
///
/// Values in this configuration are applied to all requests made with the
/// instance. Headers and request options can be overridden per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighwayConfig {
    /// The base URL to prepend to every request.
    ///
    /// If not provided, the path given to each request must be absolute.
    /// The base pathname is preserved when merging, so a base of
    /// `https://example.com/api` and a path of `/user` yields
    /// `https://example.com/api/user`. This differs from standard relative URL
    /// resolution, which would drop the `/api` segment.
    #[serde(default)]
    pub base: Option<String>,

    /// Default headers sent with every request.
    ///
    /// Names are case-insensitive and never held twice under different
    /// casings: when a settings object repeats a name, the last entry wins.
    /// Insert through [`HighwayConfig::header`] to keep that guarantee.
    #[serde(default, deserialize_with = "deserialize_headers")]
    pub headers: HashMap<String, String>,

    /// Default options for every request.
    #[serde(default)]
    pub request: RequestOptions,

    /// Whether to automatically follow HTTP redirects. Defaults to true.
    #[serde(default = "default_follow_redirects")]
    pub follow_redirects: bool,

    /// Maximum number of redirects to follow. Defaults to 10.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,

    /// Whether to validate TLS certificates. Defaults to true.
    ///
    /// **Warning:** disabling validation exposes requests to interception.
    #[serde(default = "default_validate_ssl")]
    pub validate_ssl: bool,

    /// Connection timeout in milliseconds. Defaults to 10000ms.
    ///
    /// Must be greater than 0.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// User-Agent sent when a request does not set one.
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// HTTP protocol version to force on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpVersion {
    Http1,
    Http2,
}

impl HttpVersion {
    pub(crate) fn to_reqwest(self) -> reqwest::Version {
        match self {
            HttpVersion::Http1 => reqwest::Version::HTTP_11,
            HttpVersion::Http2 => reqwest::Version::HTTP_2,
        }
    }
}

/// Per-request options.
///
/// When merged, every field set on the overriding side wins; unset fields
/// keep the inherited value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    /// Total request timeout in milliseconds.
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Forced HTTP version.
    #[serde(default)]
    pub http_version: Option<HttpVersion>,
}

impl RequestOptions {
    /// Overlays `other` on top of `self`.
    pub fn merge(&self, other: &RequestOptions) -> Self {
        Self {
            timeout: other.timeout.or(self.timeout),
            http_version: other.http_version.or(self.http_version),
        }
    }

    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_millis)
    }
}

impl Default for HighwayConfig {
    fn default() -> Self {
        Self {
            base: None,
            headers: HashMap::new(),
            request: RequestOptions::default(),
            follow_redirects: default_follow_redirects(),
            max_redirects: default_max_redirects(),
            validate_ssl: default_validate_ssl(),
            connect_timeout: default_connect_timeout(),
            user_agent: None,
        }
    }
}

impl HighwayConfig {
    /// Creates a configuration with the given base URL and defaults elsewhere.
    pub fn with_base(base: impl Into<String>) -> Self {
        Self {
            base: Some(base.into()),
            ..Self::default()
        }
    }

    /// Adds a default header, replacing any previous value for the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(&mut self.headers, name.into(), value.into());
        self
    }

    /// Sets the default request options.
    pub fn request_options(mut self, options: RequestOptions) -> Self {
        self.request = options;
        self
    }

    /// Validates the configuration and returns errors if any settings are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.connect_timeout == 0 {
            return Err("connectTimeout must be greater than 0".to_string());
        }

        if self.request.timeout == Some(0) {
            return Err("request.timeout must be greater than 0".to_string());
        }

        // max_redirects can be 0 (no redirects), so no validation needed

        Ok(())
    }

    /// Returns the connection timeout as a `Duration`.
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.connect_timeout)
    }

    /// Merges this configuration with a child configuration.
    ///
    /// Headers and request options are overlaid. Client-level settings
    /// (redirects, TLS, timeouts, user agent) stay with `self`, since child
    /// instances share the parent's connection pool. The base is kept verbatim
    /// when `other` has none; otherwise `other.base` is returned as-is and
    /// merged against the parent URL by
    /// [`Highway::create_instance`](crate::client::Highway::create_instance),
    /// which owns the parsed base.
    pub fn merge(&self, other: &HighwayConfig) -> Self {
        let mut headers = self.headers.clone();
        for (name, value) in &other.headers {
            insert_header(&mut headers, name.clone(), value.clone());
        }

        Self {
            base: other.base.clone().or_else(|| self.base.clone()),
            headers,
            request: self.request.merge(&other.request),
            follow_redirects: self.follow_redirects,
            max_redirects: self.max_redirects,
            validate_ssl: self.validate_ssl,
            connect_timeout: self.connect_timeout,
            user_agent: self.user_agent.clone(),
        }
    }
}

// Header names are case-insensitive; drop any differently-cased key first.
fn insert_header(headers: &mut HashMap<String, String>, name: String, value: String) {
    headers.retain(|k, _| !k.eq_ignore_ascii_case(&name));
    headers.insert(name, value);
}

fn deserialize_headers<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct HeadersVisitor;

    impl<'de> Visitor<'de> for HeadersVisitor {
        type Value = HashMap<String, String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of header names to values")
        }

        // Entries arrive in document order, so a later casing replaces an earlier one.
        fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
        where
            M: MapAccess<'de>,
        {
            let mut headers = HashMap::new();
            while let Some((name, value)) = map.next_entry::<String, String>()? {
                insert_header(&mut headers, name, value);
            }
            Ok(headers)
        }
    }

    deserializer.deserialize_map(HeadersVisitor)
}

// Default value functions for serde

fn default_follow_redirects() -> bool {
    true
}

fn default_max_redirects() -> u32 {
    10
}

fn default_validate_ssl() -> bool {
    true
}

fn default_connect_timeout() -> u64 {
    10000 // 10 seconds in milliseconds
}
