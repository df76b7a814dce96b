/*!
 * # capgrab - caption grabber for video pages
 *
 * A Rust library that pulls closed captions out of a rendered video page
 * and converts them to SubRip (.srt) documents.
 *
 * ## Features
 *
 * - Discover caption tracks from the page's player response
 * - Select every track, or one language with an ASR/human preference
 * - Download the selected tracks concurrently; a failed track never
 *   affects the others
 * - Convert json3 timed text to SRT with millisecond timestamps
 * - Optionally store results in a key-value store with public URLs
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `caption_tracks`: Track list extraction and selection policy
 * - `subtitle_fetcher`: Concurrent download and conversion of tracks
 * - `subtitle_processor`: json3 to SRT conversion
 * - `storage`: Key-value persistence and public records
 * - `providers`: Page and HTTP collaborators:
 *   - `providers::page`: Saved/rendered HTML pages
 *   - `providers::http`: reqwest caption fetcher
 *   - `providers::mock`: Canned fetcher for tests
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod app_config;
pub mod caption_tracks;
pub mod errors;
pub mod file_utils;
pub mod providers;
pub mod storage;
pub mod subtitle_fetcher;
pub mod subtitle_processor;

// Re-export main types for easier usage
pub use app_config::Config;
pub use caption_tracks::{CaptionTrackDescriptor, TrackRequest, TrackSelection, extract_caption_tracks};
pub use subtitle_fetcher::SubtitleFetcher;
pub use subtitle_processor::{CaptionDocument, SrtConverter, SrtCue, SubtitleKind, SubtitleResult};
pub use storage::{KeyValueStore, PublicSubtitleRecord, process_fetched_subtitles};
pub use errors::{AppError, ConfigError, ConversionError, ExtractionError, FetchError, StorageError};
