/*!
 * Tests for key-value persistence and public records
 */

use anyhow::Result;
use serde_json::json;
use url::Url;
use capgrab::errors::StorageError;
use capgrab::storage::{
    FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, PublicSubtitleRecord,
    process_fetched_subtitles, record_id,
};
use capgrab::subtitle_processor::{SubtitleKind, SubtitleResult};
use crate::common;

fn sample_results() -> Vec<SubtitleResult> {
    vec![
        SubtitleResult::new("en", SubtitleKind::UserGenerated, common::HELLO_WORLD_SRT.to_string()),
        SubtitleResult::new("fr", SubtitleKind::AutoGenerated, String::new()),
    ]
}

#[test]
fn test_record_id_shouldCombineVideoLanguageAndKind() {
    assert_eq!(record_id("abc", "en", SubtitleKind::UserGenerated), "subtitles_abc_en_user_generated");
    assert_eq!(record_id("abc", "pt-BR", SubtitleKind::AutoGenerated), "subtitles_abc_pt-BR_auto_generated");
}

/// Without a store records carry no URL
#[tokio::test]
async fn test_process_fetched_subtitles_withoutStore_shouldLeaveUrlEmpty() -> Result<()> {
    let records = process_fetched_subtitles("https://page", "abc", &sample_results(), None).await?;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0], PublicSubtitleRecord {
        srt: common::HELLO_WORLD_SRT.to_string(),
        srt_url: None,
        kind: SubtitleKind::UserGenerated,
        language: "en".to_string(),
    });
    assert_eq!(records[1].srt_url, None);
    Ok(())
}

/// With a store every track is saved and linked
#[tokio::test]
async fn test_process_fetched_subtitles_withMemoryStore_shouldSaveEachTrack() -> Result<()> {
    let store = MemoryKeyValueStore::new();
    let records = process_fetched_subtitles("https://page", "abc", &sample_results(), Some(&store)).await?;

    assert_eq!(store.len(), 2);
    assert_eq!(
        store.get_value("subtitles_abc_en_user_generated"),
        Some(json!({
            "subtitles": common::HELLO_WORLD_SRT,
            "type": "user_generated",
            "language": "en"
        }))
    );
    assert_eq!(records[0].srt_url.as_deref(), Some("memory://kvs/subtitles_abc_en_user_generated"));
    assert_eq!(records[1].srt_url.as_deref(), Some("memory://kvs/subtitles_abc_fr_auto_generated"));
    Ok(())
}

/// The public record serializes with camelCase keys and a `type` field
#[test]
fn test_public_record_serialization_shouldUseExternalFieldNames() {
    let record = PublicSubtitleRecord {
        srt: "1\n".to_string(),
        srt_url: None,
        kind: SubtitleKind::AutoGenerated,
        language: "en".to_string(),
    };

    assert_eq!(
        serde_json::to_value(&record).unwrap(),
        json!({"srt": "1\n", "srtUrl": null, "type": "auto_generated", "language": "en"})
    );
}

/// The file store writes one JSON file per record
#[tokio::test]
async fn test_file_store_withSetValue_shouldWriteJsonAndPublishUrl() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let directory = temp_dir.path().join("kvs");
    let store = FileKeyValueStore::new(&directory, Url::parse("https://cdn.example.com/kvs/")?);

    let value = json!({"subtitles": "x", "type": "user_generated", "language": "en"});
    store.set_value("subtitles_abc_en_user_generated", &value).await?;

    let on_disk = std::fs::read_to_string(directory.join("subtitles_abc_en_user_generated.json"))?;
    assert_eq!(serde_json::from_str::<serde_json::Value>(&on_disk)?, value);
    assert_eq!(store.get_value("subtitles_abc_en_user_generated").await?, Some(value));
    assert_eq!(store.get_value("subtitles_missing").await?, None);
    assert_eq!(
        store.public_url("subtitles_abc_en_user_generated")?,
        "https://cdn.example.com/kvs/subtitles_abc_en_user_generated.json"
    );
    Ok(())
}

/// Ids that would escape the store directory are rejected
#[tokio::test]
async fn test_file_store_withPathLikeKey_shouldReject() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let store = FileKeyValueStore::new(temp_dir.path(), Url::parse("https://cdn.example.com/")?);

    let result = store.set_value("../escape", &json!({})).await;
    assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    assert!(matches!(store.public_url("a/b"), Err(StorageError::InvalidKey(_))));
    Ok(())
}

/// Writing the same id twice keeps the latest value
#[test]
fn test_memory_store_withRepeatedId_shouldOverwrite() {
    let store = MemoryKeyValueStore::new();
    assert!(store.is_empty());

    let result = tokio_test::block_on(async {
        store.set_value("subtitles_abc_en_user_generated", &json!({"subtitles": "old"})).await?;
        store.set_value("subtitles_abc_en_user_generated", &json!({"subtitles": "new"})).await
    });

    assert!(result.is_ok());
    assert_eq!(store.len(), 1);
    assert_eq!(store.get_value("subtitles_abc_en_user_generated"), Some(json!({"subtitles": "new"})));
}
