//! Session-scoped client configuration.
//!
//! # Design
//! A `ClientConfig` is set up once, either field by field through the
//! `HttpClient` setters or wholesale from JSON, and is only read while a
//! request is in flight. Durations travel as integer milliseconds in JSON
//! (`timeout_ms`, `retry_delay_ms`); every field has a default so partial
//! documents are accepted.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_RETRY_COUNT: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2_000);
pub const DEFAULT_MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Bound on each of connect, send and receive, per attempt.
    #[serde(rename = "timeout_ms", with = "millis")]
    pub timeout: Duration,
    pub proxy: Option<String>,
    /// Retries after the first attempt; total attempts are `retry_count + 1`.
    pub retry_count: u32,
    #[serde(rename = "retry_delay_ms", with = "millis")]
    pub retry_delay: Duration,
    pub verify_certificates: bool,
    /// Responses with a larger body fail without retry.
    pub max_body_bytes: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_delay: DEFAULT_RETRY_DELAY,
            verify_certificates: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// An empty proxy string means "no proxy".
    pub(crate) fn normalized(mut self) -> Self {
        if self.proxy.as_deref().is_some_and(|p| p.trim().is_empty()) {
            self.proxy = None;
        }
        self
    }

    pub fn total_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
