/*!
 * HTTP fetcher tests against a local server
 */

use std::sync::Arc;
use reqwest::Client;
use capgrab::app_config::HttpConfig;
use capgrab::caption_tracks::TrackSelection;
use capgrab::errors::FetchError;
use capgrab::providers::CaptionFetcher;
use capgrab::providers::http::{HttpFetcher, MAX_BACKOFF_MS};
use capgrab::subtitle_fetcher::SubtitleFetcher;
use crate::common;
use crate::common::http_server::{CannedResponse, TestServer};

fn fast_fetcher(max_retries: u32) -> HttpFetcher {
    HttpFetcher::with_client(Client::new(), max_retries, 1)
}

/// A 200 JSON body is decoded
#[tokio::test]
async fn test_fetch_json_withJsonResponse_shouldDecodeBody() {
    let server = TestServer::start(vec![
        ("/tt?lang=en&fmt=json3", vec![CannedResponse::json(&common::hello_world_document())]),
    ]).await;

    let fetcher = HttpFetcher::new(&HttpConfig::default()).unwrap();
    let body = fetcher.fetch_json(&server.url("/tt?lang=en&fmt=json3")).await.unwrap();

    assert_eq!(body, common::hello_world_document());
}

/// Client errors fail immediately
#[tokio::test]
async fn test_fetch_json_withNotFound_shouldNotRetry() {
    let server = TestServer::start(vec![]).await;

    let result = fast_fetcher(3).fetch_json(&server.url("/missing")).await;

    assert!(matches!(result, Err(FetchError::HttpStatus { status_code: 404, .. })));
    assert_eq!(server.hits("/missing"), 1);
}

/// Server errors are retried until a success
#[tokio::test]
async fn test_fetch_json_withTransientServerError_shouldRetryAndSucceed() {
    common::init_logger();
    let server = TestServer::start(vec![
        ("/tt", vec![
            CannedResponse::status(500, "oops"),
            CannedResponse::status(503, "busy"),
            CannedResponse::json(&common::caption_document(&["ok"])),
        ]),
    ]).await;

    let body = fast_fetcher(2).fetch_json(&server.url("/tt")).await.unwrap();

    assert_eq!(body, common::caption_document(&["ok"]));
    assert_eq!(server.hits("/tt"), 3);
}

/// Retries stop after the configured count
#[tokio::test]
async fn test_fetch_json_withPersistentServerError_shouldGiveUp() {
    let server = TestServer::start(vec![
        ("/tt", vec![CannedResponse::status(502, "bad gateway")]),
    ]).await;

    let result = fast_fetcher(2).fetch_json(&server.url("/tt")).await;

    assert!(matches!(result, Err(FetchError::HttpStatus { status_code: 502, .. })));
    assert_eq!(server.hits("/tt"), 3);
}

/// Retry counts past the width of the backoff exponent still settle with an error
#[tokio::test]
async fn test_fetch_json_withRetryCountBeyondShiftWidth_shouldReturnError() {
    let server = TestServer::start(vec![
        ("/tt?fmt=json3", vec![CannedResponse::status(500, "oops")]),
    ]).await;

    let fetcher = HttpFetcher::with_client(Client::new(), 70, 0);
    let result = fetcher.fetch_json(&server.url("/tt?fmt=json3")).await;

    assert!(matches!(result, Err(FetchError::HttpStatus { status_code: 500, .. })));
    assert_eq!(server.hits("/tt?fmt=json3"), 71);
}

/// Backoff doubles per retry and never overflows
#[test]
fn test_backoff_ms_withLargeAttempts_shouldSaturateAtCap() {
    let fetcher = HttpFetcher::with_client(Client::new(), 10, 500);
    assert_eq!(fetcher.backoff_ms(1), 500);
    assert_eq!(fetcher.backoff_ms(2), 1000);
    assert_eq!(fetcher.backoff_ms(3), 2000);
    assert_eq!(fetcher.backoff_ms(65), MAX_BACKOFF_MS);
    assert_eq!(fetcher.backoff_ms(u32::MAX), MAX_BACKOFF_MS);

    let no_wait = HttpFetcher::with_client(Client::new(), 70, 0);
    assert_eq!(no_wait.backoff_ms(70), 0);
}

/// A non-JSON body is a parse error
#[tokio::test]
async fn test_fetch_json_withHtmlBody_shouldReturnParseError() {
    let server = TestServer::start(vec![
        ("/tt", vec![CannedResponse::status(200, "<html>consent</html>")]),
    ]).await;

    let result = fast_fetcher(2).fetch_json(&server.url("/tt")).await;

    assert!(matches!(result, Err(FetchError::ParseError(_))));
    assert_eq!(server.hits("/tt"), 1);
}

/// An unparseable URL never reaches the network
#[tokio::test]
async fn test_fetch_json_withRelativeUrl_shouldReturnInvalidUrl() {
    let result = fast_fetcher(2).fetch_json("/api/timedtext?v=abc&fmt=json3").await;

    assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
}

/// Tracks are fetched over HTTP and one broken track does not affect the other
#[tokio::test]
async fn test_select_and_fetch_withHttpFetcher_shouldContainFailures() {
    common::init_logger();
    let server = TestServer::start(vec![
        ("/tt?lang=en&fmt=json3", vec![CannedResponse::json(&common::hello_world_document())]),
        ("/tt?lang=fr&kind=asr&fmt=json3", vec![CannedResponse::status(403, "forbidden")]),
    ]).await;

    let script = common::player_script(&[
        common::track_json(&server.url("/tt?lang=en"), "en", false),
        common::track_json(&server.url("/tt?lang=fr&kind=asr"), "fr", true),
    ]);
    let fetcher = SubtitleFetcher::new(Arc::new(fast_fetcher(1)));

    let results = fetcher
        .select_and_fetch("https://www.youtube.com/watch?v=abc123", &script, &TrackSelection::all())
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].language(), "en");
    assert_eq!(results[0].srt(), common::HELLO_WORLD_SRT);
    assert_eq!(server.total_hits(), 2);
}
