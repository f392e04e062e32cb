//! Highway: a parameterized HTTP fetcher.
//!
//! Highway extends a plain HTTP client with axios-like conveniences while
//! staying small: instances carry a base URL, default headers and default
//! request options; non-success statuses become typed errors; and response
//! bodies can be decoded automatically.
//!
//! # Architecture
//!
//! - **config**: instance settings, validation and the global configuration
//! - **models**: request description, buffered responses and resolved values
//! - **merge**: URL, header and body merging
//! - **client**: the [`Highway`] fetcher and the default-instance shorthands
//! - **error**: [`HighwayError`] and the [`ApiError`] response wrapper
//! - **hooks**: async state helpers to trigger and periodically re-trigger calls
//!
//! # URL merging
//!
//! The base pathname is preserved when merging URLs:
//!
//! ```text
//! base: https://snowball.aq/api?foo=bar   path: /penguin?page=2
//! =>    https://snowball.aq/api/penguin?foo=bar&page=2
//! ```
//!
//! A path carrying its own host replaces the base entirely.
//!
//! # Usage
//!
//! ```no_run
//! use highway::{Highway, HighwayConfig, Request, Resolver};
//!
//! # async fn example() -> Result<(), highway::HighwayError> {
//! let api = Highway::new(
//!     HighwayConfig::with_base("https://snowball.aq/api").header("Accept", "application/json"),
//! )?;
//!
//! // GET https://snowball.aq/api/penguins?page=2, decoded as JSON
//! let penguins = api
//!     .get(Request::to("/penguins").param("page", "2").resolver(Resolver::Json))
//!     .await?;
//!
//! // Child instances inherit base, headers and options
//! let admin = api.create_instance(
//!     HighwayConfig::with_base("/admin").header("Authorization", "Bearer [token]"),
//! )?;
//! if let Err(err) = admin.destroy(Request::to("/penguins/42")).await {
//!     if let Some(api_error) = err.as_api_error() {
//!         eprintln!("{}: {}", api_error.status(), api_error.text().await?);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod hooks;
pub mod merge;
pub mod models;

pub use client::{create_instance, default_instance, destroy, get, handle, patch, post, put, Highway};
pub use config::{HighwayConfig, HttpVersion, RequestOptions};
pub use error::{is_api_error, ApiError, HighwayError};
pub use hooks::{FetchHook, FetchState, Ping, PingParams};
pub use models::{Blob, Body, HttpMethod, HttpResponse, Request, Resolved, Resolver, ResponseMode};
