use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::app_config::HttpConfig;
use crate::errors::FetchError;
use crate::providers::CaptionFetcher;

// @const: Upper bound for a single retry delay
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Caption fetcher backed by a pooled reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// HTTP client for making requests
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

impl HttpFetcher {
    /// Create a fetcher from the HTTP section of the configuration
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| FetchError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_retries: config.retry_count,
            backoff_base_ms: config.retry_backoff_ms,
        })
    }

    /// Create a fetcher around an existing client
    pub fn with_client(client: Client, max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            client,
            max_retries,
            backoff_base_ms,
        }
    }

    /// Delay before retry number `attempt` (1-based): the base doubled per
    /// retry, capped at [`MAX_BACKOFF_MS`]
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
        self.backoff_base_ms.saturating_mul(factor).min(MAX_BACKOFF_MS)
    }

    async fn fetch_once(&self, url: &Url) -> Result<Value, FetchError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status_code: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| FetchError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl CaptionFetcher for HttpFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let mut attempt = 0;
        loop {
            match self.fetch_once(&parsed).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let backoff_ms = self.backoff_ms(attempt);
                    warn!(
                        "Caption request failed: {} - retrying in {}ms (attempt {}/{})",
                        e, backoff_ms, attempt.saturating_add(1), self.max_retries.saturating_add(1)
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
                Err(e) => {
                    debug!("Caption request for {} failed after {} attempt(s)", url, attempt.saturating_add(1));
                    return Err(e);
                }
            }
        }
    }
}
