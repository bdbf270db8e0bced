use std::time::Duration;

pub const BASE_URL_ENV: &str = "OPSDESK_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the remote stores send requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server origin without the API prefix, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    /// Per-request timeout covering connect and body transfer.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `OPSDESK_BASE_URL`, falling back to the local default.
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(raw) if !raw.trim().is_empty() => Self::new(raw),
            _ => Self::default(),
        }
    }
}
