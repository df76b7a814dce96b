/*!
 * Caption track discovery and selection.
 *
 * The player response embedded in a video page lists every caption track
 * under a `captionTracks` key. This module pulls that list out of the raw
 * script text and decides which tracks to download.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use log::debug;

use crate::errors::ExtractionError;
use crate::subtitle_processor::SubtitleKind;

// @const: Query suffix selecting the json3 timed-text representation
pub const JSON3_FORMAT_SUFFIX: &str = "&fmt=json3";

// @const: Value of `kind` marking speech-recognition tracks
const ASR_KIND: &str = "asr";

// @const: Start of the caption track list inside the player response
static CAPTION_TRACKS_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""captionTracks"\s*:\s*"#).unwrap()
});

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCaptionTrack {
    language_code: String,
    base_url: String,
    #[serde(default)]
    kind: Option<String>,
}

/// A caption track advertised by the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrackDescriptor {
    pub language_code: String,
    pub base_url: String,
    pub is_generated: bool,
}

impl CaptionTrackDescriptor {
    pub fn new(language_code: impl Into<String>, base_url: impl Into<String>, is_generated: bool) -> Self {
        Self {
            language_code: language_code.into(),
            base_url: base_url.into(),
            is_generated,
        }
    }

    // @returns: URL of the json3 representation of this track
    pub fn fetch_url(&self) -> String {
        format!("{}{}", self.base_url, JSON3_FORMAT_SUFFIX)
    }

    pub fn kind(&self) -> SubtitleKind {
        SubtitleKind::from_generated(self.is_generated)
    }
}

impl From<RawCaptionTrack> for CaptionTrackDescriptor {
    fn from(raw: RawCaptionTrack) -> Self {
        Self {
            is_generated: raw.kind.as_deref() == Some(ASR_KIND),
            language_code: raw.language_code,
            base_url: raw.base_url,
        }
    }
}

/// Extract the caption track list from a page script.
///
/// Only the array following the first `"captionTracks"` key is parsed;
/// whatever follows it in the script is ignored.
pub fn extract_caption_tracks(source: &str) -> Result<Vec<CaptionTrackDescriptor>, ExtractionError> {
    let key = CAPTION_TRACKS_KEY.find(source).ok_or(ExtractionError::NotFound)?;

    let mut deserializer = serde_json::Deserializer::from_str(&source[key.end()..]);
    let tracks: Vec<RawCaptionTrack> = Vec::deserialize(&mut deserializer)
        .map_err(|e| ExtractionError::Malformed(e.to_string()))?;

    debug!("Found {} caption track(s) in page script", tracks.len());
    Ok(tracks.into_iter().map(CaptionTrackDescriptor::from).collect())
}

/// One track scheduled for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRequest {
    pub language: String,
    pub url: String,
    pub kind: SubtitleKind,
}

impl From<&CaptionTrackDescriptor> for TrackRequest {
    fn from(track: &CaptionTrackDescriptor) -> Self {
        Self {
            language: track.language_code.clone(),
            url: track.fetch_url(),
            kind: track.kind(),
        }
    }
}

/// Which tracks to download
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackSelection {
    /// Preferred language code; `None` (or empty) selects every track
    pub language: Option<String>,

    /// With a language set, take only ASR tracks when true and only
    /// human-authored tracks when false
    pub prefer_auto_generated: bool,
}

impl TrackSelection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn language(language: impl Into<String>, prefer_auto_generated: bool) -> Self {
        Self {
            language: Some(language.into()),
            prefer_auto_generated,
        }
    }

    fn preferred_language(&self) -> Option<&str> {
        self.language.as_deref().filter(|lang| !lang.is_empty())
    }

    /// Apply the policy. There is no fallback to the other kind when the
    /// preferred one is missing.
    pub fn select(&self, tracks: &[CaptionTrackDescriptor]) -> Vec<TrackRequest> {
        match self.preferred_language() {
            None => tracks.iter().map(TrackRequest::from).collect(),
            Some(language) => tracks
                .iter()
                .filter(|track| track.language_code == language)
                .filter(|track| track.is_generated == self.prefer_auto_generated)
                .map(TrackRequest::from)
                .collect(),
        }
    }
}
