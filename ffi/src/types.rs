//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, pointer + length instead of `Vec`, and
//! enums with explicit discriminants. Conversion functions live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use rift_core::{ClientError, HttpMethod, HttpResponse, TransportError};

/// Opaque handle to an `HttpClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiRiftClient {
    pub(crate) inner: rift_core::HttpClient,
}

/// Opaque handle to a `CancellationToken`.
pub struct FfiCancellation {
    pub(crate) inner: rift_core::CancellationToken,
}

// ---------------------------------------------------------------------------
// Request input (caller-provided, not freed by us)
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<FfiHttpMethod> for HttpMethod {
    fn from(m: FfiHttpMethod) -> Self {
        match m {
            FfiHttpMethod::Get => HttpMethod::Get,
            FfiHttpMethod::Post => HttpMethod::Post,
            FfiHttpMethod::Put => HttpMethod::Put,
            FfiHttpMethod::Delete => HttpMethod::Delete,
        }
    }
}

/// A borrowed key/value pair of C strings, used for headers and query
/// parameters passed into `rift_send`.
#[repr(C)]
pub struct FfiKeyValue {
    pub key: *const c_char,
    pub value: *const c_char,
}

/// Copy `len` pairs into a map. Pairs with a null key are skipped; a null
/// value reads as the empty string.
///
/// # Safety
/// `pairs` must be null or point to `len` readable `FfiKeyValue`s whose
/// non-null pointers are valid NUL-terminated strings.
pub(crate) unsafe fn read_pairs(pairs: *const FfiKeyValue, len: u32) -> HashMap<String, String> {
    if pairs.is_null() || len == 0 {
        return HashMap::new();
    }
    std::slice::from_raw_parts(pairs, len as usize)
        .iter()
        .filter(|pair| !pair.key.is_null())
        .map(|pair| (read_str(pair.key), read_str(pair.value)))
        .collect()
}

/// # Safety
/// `s` must be null or a valid NUL-terminated string.
pub(crate) unsafe fn read_str(s: *const c_char) -> String {
    if s.is_null() {
        return String::new();
    }
    CStr::from_ptr(s).to_string_lossy().into_owned()
}

/// Allocate a C string, dropping interior NULs rather than failing.
pub(crate) fn to_c_string(s: &str) -> *mut c_char {
    CString::new(s.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}

// ---------------------------------------------------------------------------
// Response output (heap-allocated by us, freed by `rift_free_response`)
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiHttpResponse`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Parse = 1,
    Transport = 2,
    Certificate = 3,
    Cancelled = 4,
    NullArg = 5,
    Panic = 6,
}

impl From<&ClientError> for FfiErrorCode {
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::Parse(_) => FfiErrorCode::Parse,
            ClientError::Transport {
                source: TransportError::Certificate(_),
                ..
            } => FfiErrorCode::Certificate,
            ClientError::Transport { .. } => FfiErrorCode::Transport,
            ClientError::Cancelled { .. } => FfiErrorCode::Cancelled,
        }
    }
}

/// A single response header owned by the library.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// Result envelope for `rift_send`.
///
/// On success `error_code` is `Ok`, `error_message` is null and the status,
/// headers and body describe the exchange (any status code counts).
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string, `status_code` is 0 and headers/body are empty.
#[repr(C)]
pub struct FfiHttpResponse {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub status_code: u16,
    pub attempts: u32,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut u8,
    pub body_len: usize,
}

impl FfiHttpResponse {
    /// Convert a core `HttpResponse` into a heap-allocated `FfiHttpResponse`.
    pub(crate) fn from_core(resp: HttpResponse) -> *mut Self {
        let (error_code, error_message) = match &resp.error {
            None => (FfiErrorCode::Ok, std::ptr::null_mut()),
            Some(err) => (FfiErrorCode::from(err), to_c_string(&err.to_string())),
        };

        let headers: Box<[FfiHeader]> = resp
            .headers
            .iter()
            .map(|(k, v)| FfiHeader {
                key: to_c_string(k),
                value: to_c_string(v),
            })
            .collect();
        let headers_len = headers.len() as u32;
        let headers = if headers.is_empty() {
            std::ptr::null_mut()
        } else {
            Box::into_raw(headers) as *mut FfiHeader
        };

        let body_len = resp.body.len();
        let body = if resp.body.is_empty() {
            std::ptr::null_mut()
        } else {
            Box::into_raw(resp.body.into_boxed_slice()) as *mut u8
        };

        Box::into_raw(Box::new(FfiHttpResponse {
            error_code,
            error_message,
            status_code: resp.status_code,
            attempts: resp.attempts,
            headers,
            headers_len,
            body,
            body_len,
        }))
    }

    fn error(error_code: FfiErrorCode, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiHttpResponse {
            error_code,
            error_message: to_c_string(msg),
            status_code: 0,
            attempts: 0,
            headers: std::ptr::null_mut(),
            headers_len: 0,
            body: std::ptr::null_mut(),
            body_len: 0,
        }))
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, msg)
    }
}
