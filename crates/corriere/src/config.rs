//! Configuration loading from environment variables.

use anyhow::{bail, Context, Result};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the group API lives and how long to wait for it.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Expects `ORARIO_API_URL` to be set, either in the environment or in a `.env`
    /// file. `ORARIO_TIMEOUT_SECS` is optional.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url =
            std::env::var("ORARIO_API_URL").context("ORARIO_API_URL environment variable not set")?;
        let timeout = std::env::var("ORARIO_TIMEOUT_SECS").ok();

        Self::new(&base_url, timeout.as_deref())
    }

    /// Validate and normalise raw values
    pub fn new(base_url: &str, timeout_secs: Option<&str>) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            bail!("API URL must start with http:// or https://, got \"{}\"", base_url);
        }

        let secs = match timeout_secs {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid ORARIO_TIMEOUT_SECS: \"{}\"", raw))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(secs),
        })
    }

    /// Full URL of an API path such as `/api/schedule`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
