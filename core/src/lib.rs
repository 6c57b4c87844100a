//! Synchronous HTTP client core.
//!
//! # Overview
//! `HttpClient` turns a method, URL, header map, query map and body into one
//! HTTP exchange and always hands back a complete `HttpResponse`. Retry
//! count, retry delay, per-phase timeout, proxy and certificate verification
//! are enforced on every attempt.
//!
//! # Design
//! - Network I/O sits behind the `Transport` trait. `UreqTransport` is the
//!   production implementation; tests drive the client with in-memory stubs.
//! - Query strings and header blocks are emitted in sorted key order, so the
//!   same input always yields the same wire bytes.
//! - Only transport failures are retried. Malformed input fails before any
//!   attempt, and any HTTP status (4xx/5xx included) is a completed exchange.
//! - A `CancellationToken` aborts the current attempt and the retry delay.

pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod http;
pub mod query;
pub mod transport;
pub mod ureq_transport;
pub mod url;

pub use cancel::CancellationToken;
pub use client::HttpClient;
pub use config::ClientConfig;
pub use error::{CertificateError, ClientError, ConfigError, ParseError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{CertificateStatus, ConnectOptions, RawResponse, Transport, WireRequest};
pub use ureq_transport::UreqTransport;
pub use url::{ParsedUrl, Scheme};
