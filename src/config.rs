use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Environment variable holding the backend base URL, e.g. `http://localhost:8001/api/`.
pub const ENV_API_URL: &str = "PAYSLIP_API_URL";
/// Environment variable overriding the per-request timeout, in whole seconds.
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "PAYSLIP_REQUEST_TIMEOUT_SECS";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_RETRY_ATTEMPTS: usize = 3;

/// Connection settings for the payroll backend.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) base_url: Url,
    pub(crate) request_timeout: Duration,
    pub(crate) max_retry_attempts: usize,
}

impl Config {
    /// Creates a configuration for the backend rooted at `base_url`.
    ///
    /// A trailing slash is added when missing so endpoint paths join below it
    /// rather than replacing its last segment.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url).map_err(|e| Error::Configuration {
            message: format!("invalid base URL '{base_url}': {e}"),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidEndpoint);
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
        })
    }

    /// Creates a configuration from `PAYSLIP_API_URL` and `PAYSLIP_REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(ENV_API_URL).map_err(|_| Error::Configuration {
            message: format!("{ENV_API_URL} not set"),
        })?;
        let mut config = Self::new(&base_url)?;

        if let Ok(timeout) = std::env::var(ENV_REQUEST_TIMEOUT_SECS) {
            let secs = timeout.trim().parse::<u64>().map_err(|_| Error::Configuration {
                message: format!("{ENV_REQUEST_TIMEOUT_SECS} must be a whole number of seconds, got '{timeout}'"),
            })?;
            config = config.with_request_timeout(Duration::from_secs(secs));
        }

        debug!(base_url = %config.base_url, timeout = ?config.request_timeout, "loaded configuration from environment");
        Ok(config)
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_retry_attempts(mut self, attempts: usize) -> Self {
        self.max_retry_attempts = attempts;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let config = Config::new("http://localhost:8001/api").unwrap();
        assert_eq!(config.base_url().as_str(), "http://localhost:8001/api/");
        assert_eq!(config.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn rejects_relative_urls() {
        assert!(matches!(
            Config::new("api/v1"),
            Err(Error::Configuration { .. })
        ));
    }
}
