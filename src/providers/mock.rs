/*!
 * Mock caption fetcher for testing.
 *
 * Responses are registered per URL:
 * - `with_json` - succeeds with the given JSON body
 * - `with_failure` - fails with a request error
 * - `with_delay` - delays the response for that URL
 *
 * Unknown URLs fail with HTTP 404, so a test never reaches the network.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::FetchError;
use crate::providers::CaptionFetcher;

/// Canned behavior for one URL
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Succeed with this JSON body
    Json(Value),
    /// Fail as if the connection broke
    Failure(String),
}

/// Mock fetcher returning registered responses
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    responses: HashMap<String, MockResponse>,
    delays: HashMap<String, Duration>,
    /// URLs requested so far, in request order
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`
    pub fn with_json(mut self, url: impl Into<String>, body: Value) -> Self {
        self.responses.insert(url.into(), MockResponse::Json(body));
        self
    }

    /// Fail every request for `url`
    pub fn with_failure(mut self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses.insert(url.into(), MockResponse::Failure(message.into()));
        self
    }

    /// Delay the response for `url`
    pub fn with_delay(mut self, url: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(url.into(), delay);
        self
    }

    /// URLs requested so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl CaptionFetcher for MockFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        self.requests.lock().push(url.to_string());

        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }

        match self.responses.get(url) {
            Some(MockResponse::Json(body)) => Ok(body.clone()),
            Some(MockResponse::Failure(message)) => Err(FetchError::RequestFailed(message.clone())),
            None => Err(FetchError::HttpStatus {
                status_code: 404,
                url: url.to_string(),
            }),
        }
    }
}
