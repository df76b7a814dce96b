use std::fmt;
use std::str::FromStr;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::errors::{ConfigError, ConversionError};

// @module: Timed-text JSON to SRT conversion

// @enum: Origin of a caption track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleKind {
    // @kind: Speech recognition output
    AutoGenerated,
    // @kind: Authored by a human
    UserGenerated,
}

impl SubtitleKind {
    // @returns: Stable identifier used in record ids and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoGenerated => "auto_generated",
            Self::UserGenerated => "user_generated",
        }
    }

    // @returns: Kind matching the track's ASR flag
    pub fn from_generated(is_generated: bool) -> Self {
        if is_generated {
            Self::AutoGenerated
        } else {
            Self::UserGenerated
        }
    }
}

impl fmt::Display for SubtitleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubtitleKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto_generated" => Ok(Self::AutoGenerated),
            "user_generated" => Ok(Self::UserGenerated),
            other => Err(ConfigError::UnknownSubtitleKind(other.to_string())),
        }
    }
}

/// One text fragment of a caption event
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptionSegment {
    #[serde(default)]
    pub utf8: Option<String>,
}

/// A timed event of a caption document. Events without segments are
/// window or timing markers and carry no text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionEvent {
    #[serde(default)]
    pub t_start_ms: Option<u64>,

    #[serde(default)]
    pub d_duration_ms: Option<u64>,

    #[serde(default)]
    pub segs: Option<Vec<CaptionSegment>>,
}

impl CaptionEvent {
    // @returns: Concatenated segment text with newlines flattened to spaces
    pub fn line(&self) -> Option<String> {
        let segs = self.segs.as_ref()?;
        let mut line = String::new();
        for seg in segs {
            if let Some(text) = &seg.utf8 {
                line.push_str(&text.replace('\n', " "));
            }
        }
        Some(line)
    }
}

/// Caption track document in the json3 timed-text format
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptionDocument {
    pub events: Vec<CaptionEvent>,
}

impl CaptionDocument {
    /// Build a document from a decoded JSON body
    pub fn from_value(value: Value) -> Result<Self, ConversionError> {
        if value.get("events").is_none() {
            return Err(ConversionError::MissingEvents);
        }

        serde_json::from_value(value)
            .map_err(|e| ConversionError::InvalidDocument(e.to_string()))
    }

    /// Parse a document from raw JSON text
    pub fn from_json_str(json: &str) -> Result<Self, ConversionError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ConversionError::InvalidDocument(e.to_string()))?;
        Self::from_value(value)
    }
}

// @struct: Single SRT cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrtCue {
    // @field: 1-based sequence number
    pub index: usize,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Single-line cue text
    pub text: String,
}

impl SrtCue {
    pub fn new(index: usize, start_ms: u64, end_ms: u64, text: String) -> Self {
        SrtCue {
            index,
            start_ms,
            end_ms,
            text,
        }
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    ///
    /// The hour field is padded to two digits and grows as needed, so a
    /// timestamp past 99 hours renders as `100:00:00,000`.
    pub fn format_timestamp(ms: u64) -> String {
        let fraction = ms % 1000;
        let mut seconds = ms / 1000;
        let hours = seconds / 3600;
        seconds -= hours * 3600;
        let minutes = seconds / 60;
        seconds -= minutes * 60;

        if hours > 0 {
            format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, fraction)
        } else {
            format!("00:{:02}:{:02},{:03}", minutes, seconds, fraction)
        }
    }
}

impl fmt::Display for SrtCue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(
            f,
            "{} --> {}",
            Self::format_timestamp(self.start_ms),
            Self::format_timestamp(self.end_ms)
        )?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// A converted caption track. Built once by the converter and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleResult {
    language: String,
    kind: SubtitleKind,
    srt: String,
}

impl SubtitleResult {
    pub fn new(language: impl Into<String>, kind: SubtitleKind, srt: String) -> Self {
        Self {
            language: language.into(),
            kind,
            srt,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn kind(&self) -> SubtitleKind {
        self.kind
    }

    /// The complete SRT document
    pub fn srt(&self) -> &str {
        &self.srt
    }
}

/// Converts one caption document into an SRT document
#[derive(Debug, Clone)]
pub struct SrtConverter {
    document: CaptionDocument,
    language: String,
    kind: SubtitleKind,
}

impl SrtConverter {
    pub fn new(document: CaptionDocument, language: impl Into<String>, kind: SubtitleKind) -> Self {
        Self {
            document,
            language: language.into(),
            kind,
        }
    }

    /// Create a converter from a textual kind name.
    ///
    /// Fails with [`ConfigError::UnknownSubtitleKind`] for anything other
    /// than `auto_generated` or `user_generated`.
    pub fn with_kind_name(
        document: CaptionDocument,
        language: impl Into<String>,
        kind: &str,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(document, language, kind.parse()?))
    }

    /// Build the cue list in event order.
    ///
    /// Events without segments, without timing, or whose text is blank are
    /// skipped and do not consume a sequence number.
    pub fn cues(&self) -> Vec<SrtCue> {
        let mut cues = Vec::new();

        for (position, event) in self.document.events.iter().enumerate() {
            let Some(line) = event.line() else {
                continue;
            };
            if line.trim().is_empty() {
                continue;
            }

            let (Some(start_ms), Some(duration_ms)) = (event.t_start_ms, event.d_duration_ms) else {
                debug!(
                    "Skipping caption event {} for {} without timing information",
                    position, self.language
                );
                continue;
            };

            cues.push(SrtCue::new(
                cues.len() + 1,
                start_ms,
                start_ms.saturating_add(duration_ms),
                line,
            ));
        }

        cues
    }

    /// Render the document as SRT text. An empty string means no cues.
    pub fn convert(&self) -> String {
        self.cues().iter().map(|cue| cue.to_string()).collect()
    }

    /// Convert and package the output with the track's language and kind
    pub fn into_result(self) -> SubtitleResult {
        let srt = self.convert();
        SubtitleResult::new(self.language, self.kind, srt)
    }
}

/// Convert a caption document to SRT text
pub fn convert(document: &CaptionDocument) -> String {
    SrtConverter::new(document.clone(), String::new(), SubtitleKind::UserGenerated).convert()
}
