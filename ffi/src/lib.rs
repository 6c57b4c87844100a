//! C-ABI wrapper around `rift-core`.
//!
//! # Overview
//! Exposes `HttpClient` through `extern "C"` functions so any language with a
//! C FFI can configure a client, send a request and read back the full
//! response without touching Rust types.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `rift_send` always returns an `FfiHttpResponse`; success and failure
//!   travel through the same envelope, tagged by `FfiErrorCode`.
//! - The C caller owns all returned pointers and must call the matching
//!   `rift_*_free` / `rift_free_*` function to release them.

pub mod types;

use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use rift_core::HttpRequest;

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client with default settings.
///
/// Returns null if an internal panic occurs.
/// The caller must free the returned pointer with `rift_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn rift_client_new() -> *mut FfiRiftClient {
    catch_unwind(|| {
        Box::into_raw(Box::new(FfiRiftClient {
            inner: rift_core::HttpClient::new(),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `rift_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rift_client_free(client: *mut FfiRiftClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

/// Run `f` against the client behind `client`. Returns false when the
/// pointer is null or `f` panics.
fn with_client(client: *mut FfiRiftClient, f: impl FnOnce(&mut rift_core::HttpClient)) -> bool {
    if client.is_null() {
        return false;
    }
    catch_unwind(AssertUnwindSafe(|| {
        let client = unsafe { &mut *client };
        f(&mut client.inner);
    }))
    .is_ok()
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Set the per-phase timeout in milliseconds.
#[unsafe(no_mangle)]
pub extern "C" fn rift_client_set_timeout_ms(client: *mut FfiRiftClient, timeout_ms: u64) -> bool {
    with_client(client, |c| c.set_timeout(Duration::from_millis(timeout_ms)))
}

/// Route requests through `proxy` (`host:port` or a URL).
///
/// A null or empty `proxy` clears any configured proxy.
#[unsafe(no_mangle)]
pub extern "C" fn rift_client_set_proxy(client: *mut FfiRiftClient, proxy: *const c_char) -> bool {
    with_client(client, |c| {
        let proxy = unsafe { read_str(proxy) };
        c.set_proxy(proxy);
    })
}

/// Set how many extra attempts follow a transport failure.
#[unsafe(no_mangle)]
pub extern "C" fn rift_client_set_retry_count(client: *mut FfiRiftClient, retry_count: u32) -> bool {
    with_client(client, |c| c.set_retry_count(retry_count))
}

/// Set the pause between attempts in milliseconds.
#[unsafe(no_mangle)]
pub extern "C" fn rift_client_set_retry_delay_ms(client: *mut FfiRiftClient, delay_ms: u64) -> bool {
    with_client(client, |c| c.set_retry_delay(Duration::from_millis(delay_ms)))
}

#[unsafe(no_mangle)]
pub extern "C" fn rift_client_set_verify_certificates(client: *mut FfiRiftClient, verify: bool) -> bool {
    with_client(client, |c| c.set_verify_certificates(verify))
}

/// Cap the number of response body bytes read per attempt.
#[unsafe(no_mangle)]
pub extern "C" fn rift_client_set_max_body_bytes(client: *mut FfiRiftClient, max_body_bytes: u64) -> bool {
    with_client(client, |c| c.set_max_body_bytes(max_body_bytes))
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Create a cancellation handle that can be passed to `rift_send` and
/// cancelled from any thread.
///
/// The caller must free the returned pointer with `rift_cancellation_free`.
#[unsafe(no_mangle)]
pub extern "C" fn rift_cancellation_new() -> *mut FfiCancellation {
    catch_unwind(|| {
        Box::into_raw(Box::new(FfiCancellation {
            inner: rift_core::CancellationToken::new(),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Request cancellation. Returns false if `cancel` is null.
#[unsafe(no_mangle)]
pub extern "C" fn rift_cancellation_cancel(cancel: *const FfiCancellation) -> bool {
    if cancel.is_null() {
        return false;
    }
    catch_unwind(AssertUnwindSafe(|| {
        let cancel = unsafe { &*cancel };
        cancel.inner.cancel();
    }))
    .is_ok()
}

/// Free a handle created by `rift_cancellation_new`. Safe to call with null.
///
/// Must not be called while a `rift_send` using the handle is in flight.
#[unsafe(no_mangle)]
pub extern "C" fn rift_cancellation_free(cancel: *mut FfiCancellation) {
    if !cancel.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(cancel) });
        });
    }
}

// ---------------------------------------------------------------------------
// Send
// ---------------------------------------------------------------------------

/// Send one request and block until it completes, fails or is cancelled.
///
/// `headers` and `params` are arrays of `headers_len` / `params_len` pairs
/// and may be null when their length is 0. `body` may be null when
/// `body_len` is 0; it is ignored for GET and DELETE. `cancel` may be null.
///
/// Never returns null. The caller must free the result with
/// `rift_free_response`.
#[unsafe(no_mangle)]
pub extern "C" fn rift_send(
    client: *const FfiRiftClient,
    method: FfiHttpMethod,
    url: *const c_char,
    headers: *const FfiKeyValue,
    headers_len: u32,
    params: *const FfiKeyValue,
    params_len: u32,
    body: *const u8,
    body_len: usize,
    cancel: *const FfiCancellation,
) -> *mut FfiHttpResponse {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiHttpResponse::null_arg("client");
        }
        if url.is_null() {
            return FfiHttpResponse::null_arg("url");
        }
        let client = unsafe { &*client };

        let body = if body.is_null() || body_len == 0 {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(body, body_len) }.to_vec()
        };
        let request = HttpRequest {
            method: method.into(),
            url: unsafe { read_str(url) },
            headers: unsafe { read_pairs(headers, headers_len) },
            params: unsafe { read_pairs(params, params_len) },
            body,
        };

        let response = if cancel.is_null() {
            client.inner.execute(&request)
        } else {
            let cancel = unsafe { &*cancel };
            client.inner.execute_with_cancel(&request, &cancel.inner)
        };
        FfiHttpResponse::from_core(response)
    }))
    .unwrap_or_else(|_| FfiHttpResponse::panic("panic in rift_send"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpResponse` returned by `rift_send`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rift_free_response(resp: *mut FfiHttpResponse) {
    if resp.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let resp = unsafe { Box::from_raw(resp) };
        if !resp.error_message.is_null() {
            drop(unsafe { CString::from_raw(resp.error_message) });
        }
        if !resp.headers.is_null() && resp.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    resp.headers,
                    resp.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
        if !resp.body.is_null() && resp.body_len > 0 {
            drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(resp.body, resp.body_len)) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rift_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
