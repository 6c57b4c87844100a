//! Request orchestration: URL parsing, query and header preparation, and the
//! attempt loop with retry, timeout, certificate and cancellation policy.
//!
//! # Design
//! `HttpClient` owns a `ClientConfig` and a shared `Transport`. Configuration
//! is changed through `&mut self` setters and only read during a send, so a
//! shared `&HttpClient` can serve concurrent sends without locking.
//!
//! Each attempt runs on its own worker thread while the calling thread
//! waits on the result and the `CancellationToken` together. A cancel
//! therefore returns control at once, even while the transport is blocked
//! in a read. The abandoned worker finishes in the background and its
//! `Session` closes the connection whichever way the attempt ends.

use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use tracing::{debug, debug_span, info, warn, Span};
use uuid::Uuid;

use crate::cancel::{CancellationToken, Outcome};
use crate::config::ClientConfig;
use crate::error::{CertificateError, ClientError, ParseError, TransportError};
use crate::headers::{sorted_headers, validate_header};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::query::encode_query;
use crate::transport::{CertificateStatus, ConnectOptions, RawResponse, Session, Transport, WireRequest};
use crate::ureq_transport::UreqTransport;
use crate::url::ParsedUrl;

/// Synchronous HTTP client with enforced retry, timeout and certificate
/// policy.
#[derive(Debug, Clone, Default)]
pub struct HttpClient<T = UreqTransport> {
    config: ClientConfig,
    transport: Arc<T>,
}

/// Why a single attempt ended early.
enum AttemptError {
    Transport(TransportError),
    Cancelled,
}

impl From<TransportError> for AttemptError {
    fn from(err: TransportError) -> Self {
        AttemptError::Transport(err)
    }
}

/// Everything one attempt needs, owned so it can move to a worker thread.
struct AttemptPlan {
    url: ParsedUrl,
    wire: WireRequest,
    proxy: Option<String>,
    timeout: Duration,
    verify_certificates: bool,
    max_body_bytes: u64,
}

/// Wakes the waiting caller when the worker is done, including on panic.
struct NotifyOnDrop(CancellationToken);

impl Drop for NotifyOnDrop {
    fn drop(&mut self) {
        self.0.notify();
    }
}

impl HttpClient<UreqTransport> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T> HttpClient<T>
where
    T: Transport + Send + Sync + 'static,
{
    pub fn with_transport(transport: T) -> Self {
        Self {
            config: ClientConfig::default(),
            transport: Arc::new(transport),
        }
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config.normalized();
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    /// An empty address clears the proxy.
    pub fn set_proxy(&mut self, proxy: impl Into<String>) {
        let proxy = proxy.into();
        self.config.proxy = if proxy.trim().is_empty() { None } else { Some(proxy) };
    }

    pub fn clear_proxy(&mut self) {
        self.config.proxy = None;
    }

    pub fn set_retry_count(&mut self, retry_count: u32) {
        self.config.retry_count = retry_count;
    }

    pub fn set_retry_delay(&mut self, retry_delay: Duration) {
        self.config.retry_delay = retry_delay;
    }

    pub fn set_verify_certificates(&mut self, verify: bool) {
        self.config.verify_certificates = verify;
    }

    pub fn set_max_body_bytes(&mut self, max_body_bytes: u64) {
        self.config.max_body_bytes = max_body_bytes;
    }

    /// Send one request. Failures are reported through `HttpResponse::error`.
    pub fn send(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &HashMap<String, String>,
        params: &HashMap<String, String>,
        body: &[u8],
    ) -> HttpResponse {
        let request = HttpRequest {
            method,
            url: url.to_string(),
            headers: headers.clone(),
            params: params.clone(),
            body: body.to_vec(),
        };
        self.execute(&request)
    }

    pub fn execute(&self, request: &HttpRequest) -> HttpResponse {
        self.execute_with_cancel(request, &CancellationToken::new())
    }

    pub fn execute_with_cancel(&self, request: &HttpRequest, cancel: &CancellationToken) -> HttpResponse {
        let request_id = Uuid::new_v4();
        let span = debug_span!("http_request", %request_id, method = %request.method, url = %request.url);
        let _enter = span.enter();

        let (url, wire) = match prepare(request) {
            Ok(prepared) => prepared,
            Err(err) => {
                warn!(error = %err, "rejecting malformed request");
                return HttpResponse::failed(err.into());
            }
        };
        let plan = Arc::new(AttemptPlan {
            url,
            wire,
            proxy: self.config.proxy.clone(),
            timeout: self.config.timeout,
            verify_certificates: self.config.verify_certificates,
            max_body_bytes: self.config.max_body_bytes,
        });

        match self.run_attempts(&plan, cancel) {
            Ok((raw, attempts)) => {
                info!(
                    status = raw.status_code,
                    attempts,
                    body_bytes = raw.body.len(),
                    "request completed"
                );
                HttpResponse::from_raw(raw, attempts)
            }
            Err(err) => {
                warn!(error = %err, "request failed");
                HttpResponse::failed(err)
            }
        }
    }

    fn run_attempts(
        &self,
        plan: &Arc<AttemptPlan>,
        cancel: &CancellationToken,
    ) -> Result<(RawResponse, u32), ClientError> {
        let max_attempts = self.config.total_attempts();
        let mut attempts = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled { attempts });
            }
            attempts += 1;
            debug!(
                attempt = attempts,
                max_attempts,
                host = %plan.url.host,
                port = plan.url.port,
                "{}",
                plan.wire.request_line()
            );

            let err = match self.spawn_attempt(plan, cancel) {
                Ok(raw) => return Ok((raw, attempts)),
                Err(AttemptError::Cancelled) => return Err(ClientError::Cancelled { attempts }),
                // A failure caused by tearing the attempt down is still a cancellation.
                Err(AttemptError::Transport(_)) if cancel.is_cancelled() => {
                    return Err(ClientError::Cancelled { attempts });
                }
                Err(AttemptError::Transport(err)) => err,
            };
            if !err.is_retryable() || attempts >= max_attempts {
                return Err(ClientError::Transport { attempts, source: err });
            }

            warn!(
                attempt = attempts,
                error = %err,
                delay_ms = u64::try_from(self.config.retry_delay.as_millis()).unwrap_or(u64::MAX),
                "attempt failed, retrying"
            );
            if cancel.wait_timeout(self.config.retry_delay) {
                return Err(ClientError::Cancelled { attempts });
            }
        }
    }

    /// Run one attempt on a worker thread and wait for its result or a
    /// cancel, whichever comes first.
    fn spawn_attempt(
        &self,
        plan: &Arc<AttemptPlan>,
        cancel: &CancellationToken,
    ) -> Result<RawResponse, AttemptError> {
        let (tx, rx) = mpsc::channel();
        let transport = Arc::clone(&self.transport);
        let plan = Arc::clone(plan);
        let token = cancel.clone();
        let span = Span::current();

        thread::Builder::new()
            .name("rift-attempt".to_string())
            .spawn(move || {
                // Declared first so it drops last, after the sender hangs up.
                let _notify = NotifyOnDrop(token.clone());
                let tx = tx;
                let _enter = span.enter();
                let _ = tx.send(attempt(transport.as_ref(), &plan, &token));
            })
            .map_err(|e| TransportError::Io(format!("could not start attempt thread: {e}")))?;

        match cancel.wait_for(&rx) {
            Outcome::Ready(result) => result,
            Outcome::Cancelled => Err(AttemptError::Cancelled),
            Outcome::Abandoned => Err(TransportError::Io("attempt ended without a result".to_string()).into()),
        }
    }
}

/// One connect, send, verify, receive cycle on a fresh session.
fn attempt<T: Transport>(
    transport: &T,
    plan: &AttemptPlan,
    cancel: &CancellationToken,
) -> Result<RawResponse, AttemptError> {
    let secure = plan.url.scheme.is_secure();
    let options = ConnectOptions {
        host: &plan.url.host,
        port: plan.url.port,
        secure,
        proxy: plan.proxy.as_deref(),
        timeout: plan.timeout,
        verify_certificates: plan.verify_certificates,
    };

    let mut session = Session::open(transport, &options)?;
    check_cancelled(cancel)?;

    transport.send_request(session.connection_mut(), &plan.wire)?;
    check_cancelled(cancel)?;

    if secure && plan.verify_certificates {
        verify_certificate(transport.certificate_status(session.connection()))?;
    }

    Ok(transport.read_response(session.connection_mut(), plan.max_body_bytes)?)
}

/// Parse the URL, append the query and validate headers. Nothing here is
/// transient, so failures are never retried.
fn prepare(request: &HttpRequest) -> Result<(ParsedUrl, WireRequest), ParseError> {
    let url = ParsedUrl::parse(&request.url)?.with_query(&encode_query(&request.params));

    let full = format!("{}{}", url.origin(), url.path);
    if ureq::http::Uri::try_from(full.as_str()).is_err() {
        return Err(ParseError::InvalidUri(full));
    }

    for (name, value) in &request.headers {
        validate_header(name, value)?;
    }

    let wire = WireRequest {
        method: request.method,
        target: url.path.clone(),
        headers: sorted_headers(&request.headers),
        body: request.method.carries_body().then(|| request.body.clone()),
    };
    Ok((url, wire))
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), AttemptError> {
    if cancel.is_cancelled() {
        Err(AttemptError::Cancelled)
    } else {
        Ok(())
    }
}

fn verify_certificate(status: CertificateStatus) -> Result<(), TransportError> {
    let problem = match status {
        CertificateStatus::Trusted | CertificateStatus::NotApplicable => return Ok(()),
        CertificateStatus::Unverified => CertificateError::Unverified,
        CertificateStatus::Expired => CertificateError::Expired,
        CertificateStatus::SelfSigned => CertificateError::SelfSigned,
        CertificateStatus::Revoked => CertificateError::Revoked,
    };
    Err(problem.into())
}
