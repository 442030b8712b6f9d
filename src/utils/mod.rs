//! Shared helpers for outbound HTTP calls.

pub mod http_headers;

pub use http_headers::{HeaderMapBuilder, mask_secret};
