//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives
//! `HttpClient<UreqTransport>` over real HTTP. Validates that query
//! encoding, header forwarding, body suppression, status-as-data, retry,
//! timeout and the body cap all behave the same on the wire as they do
//! against the in-memory stubs.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use mock_server::{Echo, Hits};
use rift_core::{CancellationToken, ClientError, HttpClient, HttpMethod, HttpRequest, ParseError, TransportError};

/// Serve the mock app from a background thread and return its address.
fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });
    addr
}

fn client() -> HttpClient {
    let mut client = HttpClient::new();
    client.set_timeout(Duration::from_secs(5));
    client.set_retry_delay(Duration::from_millis(10));
    client
}

fn echo_of(response: &rift_core::HttpResponse) -> Echo {
    assert!(response.is_ok(), "{}", response.error_message());
    serde_json::from_slice(&response.body).unwrap()
}

fn hits(client: &HttpClient, addr: SocketAddr) -> u64 {
    let response = client.execute(&HttpRequest::new(HttpMethod::Get, format!("http://{addr}/hits")));
    let hits: Hits = serde_json::from_slice(&response.body).unwrap();
    hits.hits
}

#[test]
fn get_with_query_reaches_server() {
    let addr = start_server();
    let params = HashMap::from([
        ("q".to_string(), "a b".to_string()),
        ("id".to_string(), "42".to_string()),
    ]);

    let response = client().send(
        HttpMethod::Get,
        &format!("http://{addr}/echo/items"),
        &HashMap::new(),
        &params,
        b"",
    );
    assert_eq!(response.status_code, 200);
    assert_eq!(response.attempts, 1);
    assert!(response.raw_headers.starts_with("HTTP/1.1 200 OK\r\n"));
    assert_eq!(response.header("Content-Type"), Some("application/json"));

    let echo = echo_of(&response);
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.path, "/echo/items");
    assert_eq!(echo.query, "id=42&q=a%20b");
}

#[test]
fn post_and_put_deliver_body_and_headers() {
    let addr = start_server();
    let client = client();
    for method in [HttpMethod::Post, HttpMethod::Put] {
        let request = HttpRequest::new(method, format!("http://{addr}/echo"))
            .header("Content-Type", "application/json")
            .header("X-Trace", "abc")
            .body(r#"{"title":"Buy milk"}"#);
        let echo = echo_of(&client.execute(&request));
        assert_eq!(echo.method, method.as_str());
        assert_eq!(echo.body, r#"{"title":"Buy milk"}"#);
        assert_eq!(echo.headers["content-type"], "application/json");
        assert_eq!(echo.headers["x-trace"], "abc");
        assert_eq!(echo.headers["user-agent"], "RiftNet_Client");
    }
}

#[test]
fn get_and_delete_drop_supplied_body() {
    let addr = start_server();
    let client = client();
    for method in [HttpMethod::Get, HttpMethod::Delete] {
        let request = HttpRequest::new(method, format!("http://{addr}/echo")).body("should not arrive");
        let echo = echo_of(&client.execute(&request));
        assert_eq!(echo.method, method.as_str());
        assert!(echo.body.is_empty(), "{method} sent a body");
    }
}

#[test]
fn error_statuses_are_data_and_not_retried() {
    let addr = start_server();
    let client = client();
    for code in [404u16, 500, 503] {
        let response = client.execute(&HttpRequest::new(
            HttpMethod::Delete,
            format!("http://{addr}/status/{code}"),
        ));
        assert!(response.is_ok(), "{}", response.error_message());
        assert_eq!(response.status_code, code);
        assert_eq!(response.attempts, 1);
    }
    assert_eq!(hits(&client, addr), 3);
}

#[test]
fn refused_connection_is_retried_then_reported() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let mut client = client();
    client.set_retry_count(2);

    let response = client.execute(&HttpRequest::new(HttpMethod::Get, format!("http://{addr}/")));
    match response.error {
        Some(ClientError::Transport { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected transport failure, got {other:?}"),
    }
    assert_eq!(response.status_code, 0);
    assert!(!response.error_message().is_empty());
}

#[test]
fn slow_response_times_out() {
    let addr = start_server();
    let mut client = client();
    client.set_timeout(Duration::from_millis(100));
    client.set_retry_count(1);

    let response = client.execute(&HttpRequest::new(HttpMethod::Get, format!("http://{addr}/slow/2000")));
    match response.error {
        Some(ClientError::Transport {
            attempts,
            source: TransportError::Timeout(_),
        }) => assert_eq!(attempts, 2),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[test]
fn oversized_body_fails_without_retry() {
    let addr = start_server();
    let mut client = client();
    client.set_max_body_bytes(1024);

    let response = client.execute(&HttpRequest::new(HttpMethod::Get, format!("http://{addr}/bytes/4096")));
    assert_eq!(
        response.error,
        Some(ClientError::Transport {
            attempts: 1,
            source: TransportError::BodyTooLarge { limit: 1024 },
        })
    );
    assert_eq!(hits(&client, addr), 1);

    let response = client.execute(&HttpRequest::new(HttpMethod::Get, format!("http://{addr}/bytes/1000")));
    assert!(response.is_ok(), "{}", response.error_message());
    assert_eq!(response.body.len(), 1000);
}

#[test]
fn malformed_url_never_touches_network() {
    let response = client().send(HttpMethod::Get, "localhost/echo", &HashMap::new(), &HashMap::new(), b"");
    assert!(matches!(response.error, Some(ClientError::Parse(_))));
    assert_eq!(response.attempts, 0);
}

#[test]
fn cancel_interrupts_slow_response() {
    let addr = start_server();
    let mut client = client();
    client.set_timeout(Duration::from_secs(30));

    let token = CancellationToken::new();
    let canceller = {
        let token = token.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            token.cancel();
        })
    };
    let started = Instant::now();
    let response = client.execute_with_cancel(
        &HttpRequest::new(HttpMethod::Get, format!("http://{addr}/slow/3000")),
        &token,
    );
    let elapsed = started.elapsed();
    canceller.join().unwrap();

    assert_eq!(response.error, Some(ClientError::Cancelled { attempts: 1 }));
    assert!(elapsed < Duration::from_secs(1), "cancel took {elapsed:?}");
}

#[test]
fn bad_header_and_uri_are_rejected_before_sending() {
    let addr = start_server();
    let mut client = client();
    client.set_retry_count(2);

    let response = client.execute(
        &HttpRequest::new(HttpMethod::Get, format!("http://{addr}/echo")).header("X-A", "a\x01b"),
    );
    assert_eq!(
        response.error,
        Some(ClientError::Parse(ParseError::InvalidHeader("X-A".to_string())))
    );
    assert_eq!(response.attempts, 0);

    let response = client.execute(&HttpRequest::new(HttpMethod::Get, format!("http://{addr}/a b")));
    assert!(
        matches!(response.error, Some(ClientError::Parse(ParseError::InvalidUri(_)))),
        "{:?}",
        response.error
    );
    assert_eq!(response.attempts, 0);

    assert_eq!(hits(&client, addr), 0);
}
