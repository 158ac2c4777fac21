//! Configuration module
//!
//! Client configuration for the conversion service: base HTTP address, base
//! live-channel address, and request timeout. Values come from the
//! environment with localhost defaults matching the service's development
//! setup.

use std::env;

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_WS_BASE_URL: &str = "ws://localhost:8080";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Client configuration for the conversion service.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base HTTP address, e.g. `http://localhost:5000`. No trailing slash.
    pub api_base_url: String,
    /// Base WebSocket address, e.g. `ws://localhost:8080`. No trailing slash.
    pub ws_base_url: String,
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    pub fn new(api_base_url: impl Into<String>, ws_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: trim_base_url(&api_base_url.into()),
            ws_base_url: trim_base_url(&ws_base_url.into()),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Read configuration from the environment: RECODE_API_URL, RECODE_WS_URL,
    /// RECODE_REQUEST_TIMEOUT_SECS. Missing values fall back to localhost
    /// defaults.
    pub fn from_env() -> Self {
        let api_base_url = env_or("RECODE_API_URL", DEFAULT_API_BASE_URL);
        let ws_base_url = env_or("RECODE_WS_URL", DEFAULT_WS_BASE_URL);
        let request_timeout_secs = env::var("RECODE_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Self {
            api_base_url: trim_base_url(&api_base_url),
            ws_base_url: trim_base_url(&ws_base_url),
            request_timeout_secs,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL, DEFAULT_WS_BASE_URL)
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn trim_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
