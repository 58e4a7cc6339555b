//! Fetcher configuration.
//!
//! Defaults suit interactive validation of public badges. Override via
//! environment variables or explicit construction for tests.

use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default redirect hop limit.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;
/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = concat!("badgecheck/", env!("CARGO_PKG_VERSION"));

/// Transport settings for [`Fetcher`](crate::Fetcher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Per-request timeout in seconds. A timeout surfaces as `unreachable`.
    pub timeout_secs: u64,
    /// Maximum redirects followed before the request fails.
    pub max_redirects: usize,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `BADGECHECK_TIMEOUT_SECS` (default: 10)
    /// - `BADGECHECK_MAX_REDIRECTS` (default: 10)
    /// - `BADGECHECK_USER_AGENT` (default: `badgecheck/<version>`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            timeout_secs: env_number("BADGECHECK_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            max_redirects: env_number("BADGECHECK_MAX_REDIRECTS", DEFAULT_MAX_REDIRECTS)?,
            user_agent: std::env::var("BADGECHECK_USER_AGENT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        })
    }

    /// Short timeout for local mock servers.
    pub fn local_mock() -> Self {
        Self {
            timeout_secs: 5,
            ..Self::default()
        }
    }

    /// Timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn env_number<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(var.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(String, String),
    #[error("could not build HTTP client: {0}")]
    Client(String),
}
