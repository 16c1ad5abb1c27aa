//! Transport layer for the Kit SDK.

pub mod http;

pub use http::HttpTransport;
