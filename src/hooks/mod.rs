//! Async state helpers for UI layers.
//!
//! - [`FetchHook`]: trigger a call and observe loading, response and errors.
//! - [`Ping`]: re-trigger a call on a fixed interval.
//!
//! Both are framework-neutral and run on Tokio.

pub mod fetch;
pub mod ping;

pub use fetch::{FetchHook, FetchState};
pub use ping::{Ping, PingParams};
