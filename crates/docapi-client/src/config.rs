use std::time::Duration;

use docapi_core::ApiError;

/// Part size used when the server omits one from the initiate response.
pub const DEFAULT_PART_SIZE: u64 = 10 * 1024 * 1024;

/// Configuration for a [`DocumentClient`](crate::DocumentClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API server, e.g. `https://docs.example.com`.
    pub base_url: String,

    /// Per-request timeout for API calls and part PUTs.
    pub timeout: Duration,

    /// Fallback part size when the server's initiate response omits one.
    pub default_part_size: u64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            timeout: Duration::from_secs(120),
            default_part_size: DEFAULT_PART_SIZE,
        }
    }

    /// Read configuration from `DOCAPI_BASE_URL`, `DOCAPI_TIMEOUT_SECS` and
    /// `DOCAPI_PART_SIZE_BYTES`.
    pub fn from_env() -> Result<Self, ApiError> {
        let base_url = std::env::var("DOCAPI_BASE_URL")
            .map_err(|_| ApiError::Validation("DOCAPI_BASE_URL is not set".to_string()))?;
        let mut config = Self::new(base_url);

        if let Ok(secs) = std::env::var("DOCAPI_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                ApiError::Validation(format!("invalid DOCAPI_TIMEOUT_SECS: {}", secs))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Ok(bytes) = std::env::var("DOCAPI_PART_SIZE_BYTES") {
            let bytes: u64 = bytes.parse().map_err(|_| {
                ApiError::Validation(format!("invalid DOCAPI_PART_SIZE_BYTES: {}", bytes))
            })?;
            if bytes == 0 {
                return Err(ApiError::Validation(
                    "DOCAPI_PART_SIZE_BYTES must be positive".to_string(),
                ));
            }
            config.default_part_size = bytes;
        }
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default_part_size(mut self, part_size: u64) -> Self {
        self.default_part_size = part_size;
        self
    }
}
