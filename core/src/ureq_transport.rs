//! `Transport` backed by `ureq`.
//!
//! # Design
//! Every `connect` builds a dedicated `ureq::Agent` with idle pooling
//! switched off, so no socket outlives the attempt that opened it. The agent
//! never follows redirects and hands 4xx/5xx back as data; status
//! interpretation belongs to the caller. TLS verification is done by the
//! agent's TLS stack during the handshake, which is why a connection that
//! got through `send_request` with verification on reports `Trusted`.
//!
//! # Limitations
//! The default rustls verifier checks the chain, expiry and host name but
//! performs no CRL or OCSP lookups, so a revoked certificate that is
//! otherwise valid is accepted. This transport never reports `Expired`,
//! `SelfSigned` or `Revoked`; chain failures surface as handshake errors
//! and are classified as `CertificateError::Rejected`.

use ureq::http::{self, Response};
use ureq::tls::TlsConfig;
use ureq::{Agent, Body, Proxy};

use crate::error::{CertificateError, TransportError};
use crate::transport::{CertificateStatus, ConnectOptions, RawResponse, Transport, WireRequest};

pub const DEFAULT_USER_AGENT: &str = "RiftNet_Client";

#[derive(Debug, Clone)]
pub struct UreqTransport {
    user_agent: String,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

pub struct UreqConnection {
    agent: Agent,
    origin: String,
    secure: bool,
    verified: bool,
    response: Option<Response<Body>>,
}

impl Transport for UreqTransport {
    type Connection = UreqConnection;

    fn connect(&self, options: &ConnectOptions<'_>) -> Result<UreqConnection, TransportError> {
        let timeout = Some(options.timeout);
        let mut config = Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .max_idle_connections(0)
            .max_idle_connections_per_host(0)
            .user_agent(self.user_agent.as_str())
            .timeout_connect(timeout)
            .timeout_send_request(timeout)
            .timeout_send_body(timeout)
            .timeout_recv_response(timeout)
            .timeout_recv_body(timeout);

        if let Some(proxy) = options.proxy {
            let proxy = Proxy::new(proxy).map_err(|e| TransportError::Proxy(format!("{proxy}: {e}")))?;
            config = config.proxy(Some(proxy));
        }
        let verified = options.secure && options.verify_certificates;
        if options.secure && !options.verify_certificates {
            config = config.tls_config(TlsConfig::builder().disable_verification(true).build());
        }

        let scheme = if options.secure { "https" } else { "http" };
        Ok(UreqConnection {
            agent: config.build().new_agent(),
            origin: format!("{scheme}://{}:{}", options.host, options.port),
            secure: options.secure,
            verified,
            response: None,
        })
    }

    fn send_request(
        &self,
        connection: &mut UreqConnection,
        request: &WireRequest,
    ) -> Result<(), TransportError> {
        let mut builder = http::Request::builder()
            .method(request.method.as_str())
            .uri(format!("{}{}", connection.origin, request.target));
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = match &request.body {
            Some(body) => {
                let request = builder
                    .body(body.clone())
                    .map_err(|e| TransportError::Send(e.to_string()))?;
                connection.agent.run(request)
            }
            None => {
                let request = builder.body(()).map_err(|e| TransportError::Send(e.to_string()))?;
                connection.agent.run(request)
            }
        }
        .map_err(classify)?;

        connection.response = Some(response);
        Ok(())
    }

    fn read_response(
        &self,
        connection: &mut UreqConnection,
        max_body_bytes: u64,
    ) -> Result<RawResponse, TransportError> {
        let mut response = connection
            .response
            .take()
            .ok_or_else(|| TransportError::Receive("no request was sent on this connection".into()))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(max_body_bytes)
            .read_to_vec()
            .map_err(|e| match e {
                ureq::Error::BodyExceedsLimit(_) => TransportError::BodyTooLarge {
                    limit: max_body_bytes,
                },
                other => match classify(other) {
                    TransportError::Send(msg) => TransportError::Receive(msg),
                    err => err,
                },
            })?;

        Ok(RawResponse {
            status_code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }

    fn certificate_status(&self, connection: &UreqConnection) -> CertificateStatus {
        match (connection.secure, connection.verified) {
            (false, _) => CertificateStatus::NotApplicable,
            (true, true) => CertificateStatus::Trusted,
            (true, false) => CertificateStatus::Unverified,
        }
    }

    fn close(&self, connection: &mut UreqConnection) {
        connection.response = None;
    }
}

/// Map a `ureq` failure onto the client's taxonomy.
///
/// The TLS stack reports chain problems through several error variants, so
/// certificate failures are recognised by their description.
fn classify(err: ureq::Error) -> TransportError {
    let message = err.to_string();
    if message.to_ascii_lowercase().contains("certificate") {
        return TransportError::Certificate(CertificateError::Rejected(message));
    }
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout(message),
        ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => TransportError::Connect(message),
        ureq::Error::InvalidProxyUrl => TransportError::Proxy(message),
        ureq::Error::Io(_) => TransportError::Io(message),
        _ if message.to_ascii_lowercase().contains("proxy") => TransportError::Proxy(message),
        _ => TransportError::Send(message),
    }
}
