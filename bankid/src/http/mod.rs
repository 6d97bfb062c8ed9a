//! HTTP client building with mutual TLS.

mod client;
mod tls;

pub use client::{ClientBuilder, HttpClientConfig};
pub use tls::{TlsMaterial, TlsPaths};
