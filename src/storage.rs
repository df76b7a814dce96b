/*!
 * Persistence of converted subtitles.
 *
 * Converted tracks are optionally written to a key-value store and turned
 * into public records pointing at the stored copy.
 */

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use url::Url;

use crate::app_config::StorageConfig;
use crate::errors::StorageError;
use crate::subtitle_processor::{SubtitleKind, SubtitleResult};

/// Key-value store holding stored subtitle records
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Store `value` under `id`, replacing any previous value
    async fn set_value(&self, id: &str, value: &Value) -> Result<(), StorageError>;

    /// Public URL of the record stored under `id`
    fn public_url(&self, id: &str) -> Result<String, StorageError>;
}

/// Value written to the store for each track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSubtitles {
    pub subtitles: String,
    #[serde(rename = "type")]
    pub kind: SubtitleKind,
    pub language: String,
}

/// Record handed to the caller for each converted track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSubtitleRecord {
    pub srt: String,
    pub srt_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: SubtitleKind,
    pub language: String,
}

// @returns: Store key of a track, e.g. `subtitles_abc_en_user_generated`
pub fn record_id(video_id: &str, language: &str, kind: SubtitleKind) -> String {
    format!("subtitles_{}_{}_{}", video_id, language, kind)
}

/// Turn converted tracks into public records.
///
/// With a store, every track is saved first and its public URL recorded;
/// without one `srt_url` stays empty.
pub async fn process_fetched_subtitles(
    page_url: &str,
    video_id: &str,
    results: &[SubtitleResult],
    store: Option<&dyn KeyValueStore>,
) -> Result<Vec<PublicSubtitleRecord>, StorageError> {
    let mut records = Vec::with_capacity(results.len());

    for result in results {
        let mut srt_url = None;

        if let Some(store) = store {
            let id = record_id(video_id, result.language(), result.kind());
            debug!(
                "Saving subtitles for {}, lang:{}, type:{} to key-value store, id={}",
                page_url,
                result.language(),
                result.kind(),
                id
            );

            let stored = StoredSubtitles {
                subtitles: result.srt().to_string(),
                kind: result.kind(),
                language: result.language().to_string(),
            };
            store.set_value(&id, &serde_json::to_value(&stored)?).await?;
            srt_url = Some(store.public_url(&id)?);
        }

        records.push(PublicSubtitleRecord {
            srt: result.srt().to_string(),
            srt_url,
            kind: result.kind(),
            language: result.language().to_string(),
        });
    }

    Ok(records)
}

fn validate_key(id: &str) -> Result<(), StorageError> {
    if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
        return Err(StorageError::InvalidKey(id.to_string()));
    }
    Ok(())
}

/// Store keeping one `<id>.json` file per record in a directory
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    directory: PathBuf,
    public_url_base: Url,
}

impl FileKeyValueStore {
    /// `public_url_base` must end with `/` for records to resolve beneath it
    pub fn new<P: AsRef<Path>>(directory: P, public_url_base: Url) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            public_url_base,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        Ok(Self::new(&config.directory, config.resolved_public_url_base()?))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.directory.join(format!("{}.json", id))
    }

    /// Read a stored value back
    pub async fn get_value(&self, id: &str) -> Result<Option<Value>, StorageError> {
        validate_key(id)?;
        match tokio::fs::read_to_string(self.record_path(id)).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn set_value(&self, id: &str, value: &Value) -> Result<(), StorageError> {
        validate_key(id)?;
        tokio::fs::create_dir_all(&self.directory).await?;
        let content = serde_json::to_string_pretty(value)?;
        tokio::fs::write(self.record_path(id), content).await?;
        Ok(())
    }

    fn public_url(&self, id: &str) -> Result<String, StorageError> {
        validate_key(id)?;
        self.public_url_base
            .join(&format!("{}.json", id))
            .map(|url| url.to_string())
            .map_err(|e| StorageError::InvalidKey(format!("{}: {}", id, e)))
    }
}

/// In-memory store, for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_value(&self, id: &str) -> Option<Value> {
        self.values.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn set_value(&self, id: &str, value: &Value) -> Result<(), StorageError> {
        validate_key(id)?;
        self.values.write().insert(id.to_string(), value.clone());
        Ok(())
    }

    fn public_url(&self, id: &str) -> Result<String, StorageError> {
        validate_key(id)?;
        Ok(format!("memory://kvs/{}", id))
    }
}
