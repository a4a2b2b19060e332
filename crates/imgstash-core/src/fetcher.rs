use crate::config::HttpConfig;
use crate::{Error, Result};
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// HTTP client for image bytes.
///
/// Requests are anonymous: there is no cookie store and no credentials are
/// attached, matching a cross-origin image request.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a new fetcher with default HTTP settings
    pub fn new() -> Result<Self> {
        Self::from_config(&HttpConfig::default())
    }

    /// Creates a new fetcher from configuration
    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        Self::build(&config.user_agent, config.request_timeout())
    }

    /// Creates a new fetcher with a custom request timeout (primarily for tests)
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::build(&HttpConfig::default().user_agent, timeout)
    }

    fn build(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client })
    }

    /// Fetches the body of `url`, failing on any non-2xx status
    pub async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);

        Ok(bytes)
    }
}
