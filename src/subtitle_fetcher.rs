/*!
 * Caption download and conversion.
 *
 * Given the player-response script of a video page, this module selects the
 * caption tracks to download, fetches them concurrently and converts each
 * one to SRT. Failures are contained per track: a broken track is logged and
 * dropped while its siblings complete normally.
 */

use futures::future::join_all;
use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::caption_tracks::{extract_caption_tracks, TrackRequest, TrackSelection};
use crate::errors::AppError;
use crate::providers::{CaptionFetcher, PageSource, PLAYER_RESPONSE_PREFIX};
use crate::subtitle_processor::{CaptionDocument, SrtConverter, SubtitleResult};

/// Downloads caption tracks and converts them to SRT
#[derive(Debug, Clone)]
pub struct SubtitleFetcher {
    fetcher: Arc<dyn CaptionFetcher>,
}

impl SubtitleFetcher {
    pub fn new(fetcher: Arc<dyn CaptionFetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetch subtitles for a loaded page.
    ///
    /// A page without a player-response script yields no subtitles.
    pub async fn fetch_subtitles(
        &self,
        page: &dyn PageSource,
        selection: &TrackSelection,
    ) -> Vec<SubtitleResult> {
        let page_url = page.url();
        debug!(
            "Fetching subtitles for {}, lang:{}...",
            page_url,
            selection.language.as_deref().unwrap_or("all")
        );

        match page.inline_script(PLAYER_RESPONSE_PREFIX).await {
            Ok(Some(script)) => self.select_and_fetch(&page_url, &script, selection).await,
            Ok(None) => {
                warn!("No subtitles found for {}.", page_url);
                Vec::new()
            }
            Err(e) => {
                warn!("No subtitles found for {}: {}", page_url, e);
                Vec::new()
            }
        }
    }

    /// Select tracks from `track_list_source` and download them concurrently.
    ///
    /// Returns once every download has settled. Results come back in
    /// completion order.
    pub async fn select_and_fetch(
        &self,
        page_url: &str,
        track_list_source: &str,
        selection: &TrackSelection,
    ) -> Vec<SubtitleResult> {
        let tracks = match extract_caption_tracks(track_list_source) {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!("No subtitles found for {}: {}", page_url, e);
                return Vec::new();
            }
        };

        let requests = selection.select(&tracks);
        if requests.is_empty() {
            debug!(
                "No caption track of {} matches lang:{}, auto_generated:{}",
                page_url,
                selection.language.as_deref().unwrap_or("all"),
                selection.prefer_auto_generated
            );
            return Vec::new();
        }

        let results = Arc::new(Mutex::new(Vec::with_capacity(requests.len())));

        let tasks = requests.iter().map(|request| {
            let results = Arc::clone(&results);
            async move {
                match self.fetch_track(request).await {
                    Ok(result) => results.lock().push(result),
                    Err(AppError::Fetch(e)) => warn!(
                        "Unable to fetch subtitles for {}, language:{}\nReason:{}",
                        page_url, request.language, e
                    ),
                    Err(e) => warn!(
                        "Unable to convert subtitles for {}, language:{}\nReason:{}",
                        page_url, request.language, e
                    ),
                }
            }
        });

        // Settle every download; one failure never cancels its siblings
        join_all(tasks).await;

        let results = std::mem::take(&mut *results.lock());
        debug!(
            "Converted {}/{} subtitle track(s) for {}",
            results.len(),
            requests.len(),
            page_url
        );
        results
    }

    /// Download and convert a single track
    pub async fn fetch_track(&self, request: &TrackRequest) -> Result<SubtitleResult, AppError> {
        let body = self.fetcher.fetch_json(&request.url).await?;

        debug!(
            "Subtitle lang:{}, type:{} fetched, converting to SRT...",
            request.language, request.kind
        );

        let document = CaptionDocument::from_value(body)?;
        Ok(SrtConverter::new(document, request.language.clone(), request.kind).into_result())
    }
}
