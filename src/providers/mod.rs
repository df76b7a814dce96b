/*!
 * Collaborators of the caption pipeline.
 *
 * The pipeline talks to the outside world through two traits:
 * - `PageSource`: a rendered video page (browser tab, saved HTML, ...)
 * - `CaptionFetcher`: an HTTP client returning caption JSON
 *
 * Implementations:
 * - `page::StaticPage`: page backed by already-rendered HTML
 * - `http::HttpFetcher`: reqwest-based fetcher with retries
 * - `mock::MockFetcher`: canned responses for tests
 */

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::errors::FetchError;

/// Prefix of the inline script carrying the player response
pub const PLAYER_RESPONSE_PREFIX: &str = "var ytInitialPlayerResponse";

/// A loaded video page
#[async_trait]
pub trait PageSource: Send + Sync + Debug {
    /// Return the text of the inline script starting with `prefix`.
    /// When several scripts match, the one latest in the document wins.
    ///
    /// # Returns
    /// * `Ok(None)` when no script matches
    async fn inline_script(&self, prefix: &str) -> anyhow::Result<Option<String>>;

    /// Current URL of the page, used for diagnostics
    fn url(&self) -> String;
}

/// HTTP access to caption documents
///
/// Implementations must be usable from several concurrent futures at once.
#[async_trait]
pub trait CaptionFetcher: Send + Sync + Debug {
    /// GET `url` and decode the body as JSON
    ///
    /// # Arguments
    /// * `url` - Fully built caption URL, including the format parameter
    ///
    /// # Returns
    /// * `Result<Value, FetchError>` - The decoded body or the failure
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError>;
}

pub mod http;
pub mod mock;
pub mod page;
