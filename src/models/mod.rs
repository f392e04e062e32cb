//! Data models for requests and responses.
//!
//! This module contains the request description passed to the fetcher, the
//! buffered response it returns, and the resolved values produced by resolvers.

pub mod request;
pub mod response;

pub use request::{Body, HttpMethod, Request, Resolver, ResponseMode};
pub use response::{Blob, HttpResponse, Resolved};
