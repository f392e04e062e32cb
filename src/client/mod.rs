//! The `Highway` fetcher.
//!
//! Extends a plain HTTP client to be parameterized: an instance carries a base
//! URL, default headers and default request options, and every request is
//! merged on top of them. Like axios, but smaller: non-success statuses fail,
//! and response bodies can be decoded automatically.
//!
//! # Example
//!
//! ```no_run
//! use highway::client::Highway;
//! use highway::config::HighwayConfig;
//! use highway::models::{Request, Resolver};
//!
//! # async fn example() -> Result<(), highway::error::HighwayError> {
//! let api = Highway::new(HighwayConfig::with_base("https://snowball.aq/api"))?;
//! let penguins = api
//!     .get(Request::to("/penguins").param("page", "2").resolver(Resolver::Json))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod resolve;

use crate::config::{get_config, HighwayConfig, RequestOptions};
use crate::error::HighwayError;
use crate::merge::{append_query, encode_body, header_map, merge_headers, merge_urls};
use crate::models::request::{HttpMethod, Request};
use crate::models::response::Resolved;
use log::debug;
use once_cell::sync::Lazy;
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::sync::Mutex;
use std::time::Instant;
use url::Url;

/// A parameterized HTTP fetcher.
///
/// Cloning is cheap: clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct Highway {
    base: Option<Url>,
    headers: HeaderMap,
    options: RequestOptions,
    config: HighwayConfig,
    client: Client,
}

impl Highway {
    /// Creates a new instance.
    ///
    /// If a base URL is provided, it must be a full, valid absolute URL.
    pub fn new(config: HighwayConfig) -> Result<Self, HighwayError> {
        config.validate().map_err(HighwayError::InvalidConfig)?;

        let base = config.base.as_deref().map(Url::parse).transpose()?;
        let headers = header_map(&config.headers)?;
        let client = build_client(&config)?;

        Ok(Self {
            base,
            headers,
            options: config.request,
            config,
            client,
        })
    }

    /// The effective configuration of this instance.
    pub fn config(&self) -> &HighwayConfig {
        &self.config
    }

    pub fn base(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Dispatches a request and resolves its response.
    ///
    /// Headers and options of the request override those of the instance. The
    /// URL is the request path merged onto the instance base (see
    /// [`merge_urls`]), followed by the request's query parameters.
    ///
    /// # Errors
    ///
    /// - `BodyNotAllowed` if a GET request carries a body
    /// - `MissingBase`, `InvalidUrl`, `InvalidHeader`, `Encode` for bad input
    /// - `Network` or `Timeout` if the request could not complete
    /// - `Api` for non-success statuses, unless the request is soft
    /// - `EmptyBody` when `must` is set and the body is empty
    /// - `Decode` when the resolver cannot decode the body
    pub async fn handle(&self, request: Request) -> Result<Resolved, HighwayError> {
        if request.has_body() && !request.method.allows_body() {
            return Err(HighwayError::BodyNotAllowed(request.method));
        }

        let options = self.options.merge(&request.options);
        let request_headers = header_map(request.headers.iter().map(|(k, v)| (k, v)))?;
        let headers = merge_headers(&self.headers, &request_headers);
        let body = request.body.as_ref().map(encode_body).transpose()?;

        let mut url = merge_urls(&request.path, self.base.as_ref())?;
        append_query(&mut url, &request.params);

        debug!("Dispatching {} {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.to_reqwest(), url)
            .headers(headers);
        if let Some(timeout) = options.timeout_duration() {
            builder = builder.timeout(timeout);
        }
        if let Some(version) = options.http_version {
            builder = builder.version(version.to_reqwest());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let started = Instant::now();
        let response = builder.send().await?;
        debug!(
            "Received {} for {} {} in {:?}",
            response.status(),
            request.method,
            response.url(),
            started.elapsed()
        );

        resolve::resolve_response(response, request.mode, request.must, started).await
    }

    /// Sends `request` as a GET request.
    pub async fn get(&self, request: Request) -> Result<Resolved, HighwayError> {
        self.handle(request.method(HttpMethod::GET)).await
    }

    /// Sends `request` as a POST request.
    pub async fn post(&self, request: Request) -> Result<Resolved, HighwayError> {
        self.handle(request.method(HttpMethod::POST)).await
    }

    /// Sends `request` as a PUT request.
    pub async fn put(&self, request: Request) -> Result<Resolved, HighwayError> {
        self.handle(request.method(HttpMethod::PUT)).await
    }

    /// Sends `request` as a PATCH request.
    pub async fn patch(&self, request: Request) -> Result<Resolved, HighwayError> {
        self.handle(request.method(HttpMethod::PATCH)).await
    }

    /// Sends `request` as a DELETE request.
    pub async fn destroy(&self, request: Request) -> Result<Resolved, HighwayError> {
        self.handle(request.method(HttpMethod::DELETE)).await
    }

    /// Creates a child instance inheriting this instance's parameters.
    ///
    /// The child base is `config.base` merged onto this base (or this base
    /// when unset). Headers and request options are overlaid. The child shares
    /// this instance's connection pool, so client-level settings of `config`
    /// (redirects, TLS, timeouts, user agent) are not applied.
    pub fn create_instance(&self, config: HighwayConfig) -> Result<Highway, HighwayError> {
        config.validate().map_err(HighwayError::InvalidConfig)?;

        let base = match config.base.as_deref() {
            Some(base) => Some(merge_urls(base, self.base.as_ref())?),
            None => self.base.clone(),
        };
        let headers = merge_headers(&self.headers, &header_map(&config.headers)?);

        let mut merged = self.config.merge(&config);
        merged.base = base.as_ref().map(Url::to_string);

        Ok(Highway {
            base,
            headers,
            options: merged.request,
            config: merged,
            client: self.client.clone(),
        })
    }
}

fn build_client(config: &HighwayConfig) -> Result<Client, HighwayError> {
    let redirect = if config.follow_redirects {
        Policy::limited(config.max_redirects as usize)
    } else {
        Policy::none()
    };

    let mut builder = Client::builder()
        .redirect(redirect)
        .danger_accept_invalid_certs(!config.validate_ssl)
        .connect_timeout(config.connect_timeout_duration())
        .gzip(true)
        .brotli(true)
        .deflate(true);

    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent.as_str());
    }

    builder
        .build()
        .map_err(|e| HighwayError::InvalidConfig(format!("failed to build HTTP client: {}", e)))
}

/// Default instance, rebuilt whenever the global configuration changes.
static DEFAULT_INSTANCE: Lazy<Mutex<Option<Highway>>> = Lazy::new(|| Mutex::new(None));

/// Returns the instance built from the global configuration.
pub fn default_instance() -> Result<Highway, HighwayError> {
    let config = get_config();
    let mut slot = DEFAULT_INSTANCE
        .lock()
        .map_err(|e| HighwayError::InvalidConfig(format!("default instance unavailable: {}", e)))?;

    if let Some(instance) = slot.as_ref() {
        if instance.config == config {
            return Ok(instance.clone());
        }
    }

    let instance = Highway::new(config)?;
    *slot = Some(instance.clone());
    Ok(instance)
}

/// [`Highway::handle`] on the default instance.
pub async fn handle(request: Request) -> Result<Resolved, HighwayError> {
    default_instance()?.handle(request).await
}

/// [`Highway::get`] on the default instance.
pub async fn get(request: Request) -> Result<Resolved, HighwayError> {
    default_instance()?.get(request).await
}

/// [`Highway::post`] on the default instance.
pub async fn post(request: Request) -> Result<Resolved, HighwayError> {
    default_instance()?.post(request).await
}

/// [`Highway::put`] on the default instance.
pub async fn put(request: Request) -> Result<Resolved, HighwayError> {
    default_instance()?.put(request).await
}

/// [`Highway::patch`] on the default instance.
pub async fn patch(request: Request) -> Result<Resolved, HighwayError> {
    default_instance()?.patch(request).await
}

/// [`Highway::destroy`] on the default instance.
pub async fn destroy(request: Request) -> Result<Resolved, HighwayError> {
    default_instance()?.destroy(request).await
}

/// [`Highway::create_instance`] on the default instance.
pub fn create_instance(config: HighwayConfig) -> Result<Highway, HighwayError> {
    default_instance()?.create_instance(config)
}
