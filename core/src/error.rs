//! Error types for the Rift HTTP client.
//!
//! # Design
//! Errors are layered by how the client reacts to them. `ParseError` covers
//! malformed caller input and is never retried. `TransportError` covers
//! anything that went wrong on the wire and feeds the retry loop.
//! `ClientError` is the value a caller finally sees in
//! `HttpResponse::error`; it records how many attempts were made so a
//! transport failure can be told apart from a cancellation.

use thiserror::Error;

/// The request could not be built from the caller's input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("URL is empty")]
    Empty,

    #[error("URL has no scheme delimiter \"://\"")]
    MissingSchemeDelimiter,

    #[error("unsupported scheme {0:?}, expected \"http\" or \"https\"")]
    UnsupportedScheme(String),

    #[error("invalid port {0:?}")]
    InvalidPort(String),

    #[error("URL has no host")]
    EmptyHost,

    /// Header name is not a token, or the value contains a control byte.
    #[error("invalid header {0:?}")]
    InvalidHeader(String),

    /// Host, path or query holds characters that cannot appear in a URI.
    #[error("invalid URI {0:?}")]
    InvalidUri(String),
}

/// A certificate chain the client refuses to trust.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CertificateError {
    #[error("certificate has expired")]
    Expired,

    #[error("certificate is self-signed and not trusted")]
    SelfSigned,

    #[error("certificate has been revoked")]
    Revoked,

    /// Verification was requested but the transport did not perform it.
    #[error("certificate chain was not verified")]
    Unverified,

    /// The TLS stack rejected the chain during the handshake.
    #[error("{0}")]
    Rejected(String),
}

/// A single attempt failed below the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("proxy error: {0}")]
    Proxy(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("failed to send request: {0}")]
    Send(String),

    #[error("failed to read response: {0}")]
    Receive(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("certificate rejected: {0}")]
    Certificate(#[from] CertificateError),

    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge { limit: u64 },
}

impl TransportError {
    /// Whether another attempt may succeed. An oversized body is fatal.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::BodyTooLarge { .. })
    }
}

/// Final outcome of a failed send, stored in `HttpResponse::error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("invalid request: {0}")]
    Parse(#[from] ParseError),

    #[error("transport failed after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("request cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
}

impl ClientError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled { .. })
    }

    pub fn is_certificate(&self) -> bool {
        matches!(
            self,
            ClientError::Transport {
                source: TransportError::Certificate(_),
                ..
            }
        )
    }

    /// Number of attempts started before the error was final.
    pub fn attempts(&self) -> u32 {
        match self {
            ClientError::Parse(_) => 0,
            ClientError::Transport { attempts, .. } | ClientError::Cancelled { attempts } => *attempts,
        }
    }
}

/// A `ClientConfig` could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid client configuration: {0}")]
    Json(#[from] serde_json::Error),
}
