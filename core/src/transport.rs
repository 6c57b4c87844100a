//! The seam between `HttpClient` and the network.
//!
//! # Design
//! `HttpClient` never touches sockets. It drives a `Transport` through four
//! phases per attempt (connect, send, receive, close) and decides on its
//! own whether a failure is worth another attempt. This keeps the retry,
//! timeout and certificate policy testable against in-memory stubs, while
//! `UreqTransport` does the real work in production.

use std::time::Duration;

use crate::error::TransportError;
use crate::headers::format_headers;
use crate::http::HttpMethod;

/// Everything a transport needs to open one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions<'a> {
    pub host: &'a str,
    pub port: u16,
    pub secure: bool,
    pub proxy: Option<&'a str>,
    /// Applies separately to connect, send and receive.
    pub timeout: Duration,
    pub verify_certificates: bool,
}

/// A fully prepared request, ready to be written to a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRequest {
    pub method: HttpMethod,
    /// Path plus encoded query, e.g. `/items?id=42`.
    pub target: String,
    /// Sorted by name.
    pub headers: Vec<(String, String)>,
    /// `None` for GET and DELETE.
    pub body: Option<Vec<u8>>,
}

impl WireRequest {
    /// `METHOD target HTTP/1.1`, without the trailing CRLF.
    pub fn request_line(&self) -> String {
        format!("{} {} HTTP/1.1", self.method, self.target)
    }

    pub fn header_block(&self) -> String {
        format_headers(self.headers.iter().map(|(k, v)| (k, v)))
    }
}

/// Status, headers and body as read off the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status_code: u16,
    pub reason: String,
    /// In the order received.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// What the transport learned about the peer's certificate chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateStatus {
    /// Plain-text connection.
    NotApplicable,
    Trusted,
    /// The chain was not checked, e.g. verification was switched off.
    Unverified,
    Expired,
    SelfSigned,
    Revoked,
}

pub trait Transport {
    type Connection;

    fn connect(&self, options: &ConnectOptions<'_>) -> Result<Self::Connection, TransportError>;

    fn send_request(
        &self,
        connection: &mut Self::Connection,
        request: &WireRequest,
    ) -> Result<(), TransportError>;

    /// Read the status, headers and full body. A body longer than
    /// `max_body_bytes` must fail with `TransportError::BodyTooLarge`.
    fn read_response(
        &self,
        connection: &mut Self::Connection,
        max_body_bytes: u64,
    ) -> Result<RawResponse, TransportError>;

    /// Only consulted for secure connections after `send_request` succeeded.
    fn certificate_status(&self, _connection: &Self::Connection) -> CertificateStatus {
        CertificateStatus::NotApplicable
    }

    /// Release the session. Called exactly once per successful `connect`.
    fn close(&self, _connection: &mut Self::Connection) {}
}

/// Closes its connection when dropped, on every exit path of an attempt.
pub(crate) struct Session<'t, T: Transport> {
    transport: &'t T,
    connection: T::Connection,
}

impl<'t, T: Transport> Session<'t, T> {
    pub(crate) fn open(transport: &'t T, options: &ConnectOptions<'_>) -> Result<Self, TransportError> {
        let connection = transport.connect(options)?;
        Ok(Self { transport, connection })
    }

    pub(crate) fn connection(&self) -> &T::Connection {
        &self.connection
    }

    pub(crate) fn connection_mut(&mut self) -> &mut T::Connection {
        &mut self.connection
    }
}

impl<T: Transport> Drop for Session<'_, T> {
    fn drop(&mut self) {
        self.transport.close(&mut self.connection);
    }
}
