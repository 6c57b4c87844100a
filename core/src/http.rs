//! Request and response values exchanged with `HttpClient`.
//!
//! # Design
//! Both types are plain data with owned fields. An `HttpRequest` is built by
//! the caller and consumed by one send; an `HttpResponse` is assembled by
//! the client and handed back by value. Failures are stored in the response
//! rather than returned as `Err`, so a caller always gets a complete value
//! and checks `is_ok()`.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::ClientError;
use crate::headers::format_headers;
use crate::transport::RawResponse;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Only POST and PUT transmit a body.
    pub fn carries_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical request as described by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub params: HashMap<String, String>,
    /// Ignored for GET and DELETE.
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            params: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// Outcome of a send.
///
/// When `error` is set, `status_code` is 0 and the other fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status_code: u16,
    /// Header names as reported by the transport; repeated names are joined
    /// with `", "`.
    pub headers: BTreeMap<String, String>,
    /// Status line followed by the CRLF-terminated header block.
    pub raw_headers: String,
    pub body: Vec<u8>,
    /// Attempts started, including the one that produced this response.
    pub attempts: u32,
    pub error: Option<ClientError>,
}

impl HttpResponse {
    pub(crate) fn from_raw(raw: RawResponse, attempts: u32) -> Self {
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in &raw.headers {
            headers
                .entry(name.clone())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.clone());
        }
        let raw_headers = format!(
            "HTTP/1.1 {} {}\r\n{}",
            raw.status_code,
            raw.reason,
            format_headers(raw.headers.iter().map(|(k, v)| (k, v)))
        );

        Self {
            status_code: raw.status_code,
            headers,
            raw_headers,
            body: raw.body,
            attempts,
            error: None,
        }
    }

    pub(crate) fn failed(error: ClientError) -> Self {
        Self {
            attempts: error.attempts(),
            error: Some(error),
            ..Self::default()
        }
    }

    /// True when an HTTP exchange completed, whatever its status code.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Description of the failure, empty on success.
    pub fn error_message(&self) -> String {
        self.error.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
