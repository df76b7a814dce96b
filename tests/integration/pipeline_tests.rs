/*!
 * End-to-end tests: saved page to stored public records
 */

use std::sync::Arc;
use anyhow::Result;
use url::Url;
use capgrab::caption_tracks::TrackSelection;
use capgrab::file_utils::FileManager;
use capgrab::providers::PageSource;
use capgrab::providers::mock::MockFetcher;
use capgrab::providers::page::StaticPage;
use capgrab::storage::{FileKeyValueStore, StoredSubtitles, process_fetched_subtitles};
use capgrab::subtitle_fetcher::SubtitleFetcher;
use capgrab::subtitle_processor::SubtitleKind;
use crate::common;

const EN_USER: &str = "https://host/api/timedtext?v=abc123&lang=en";
const DE_ASR: &str = "https://host/api/timedtext?v=abc123&lang=de&kind=asr";

#[tokio::test]
async fn test_pipeline_withSavedPageAndFileStore_shouldPersistRecords() -> Result<()> {
    common::init_logger();
    let temp_dir = common::create_temp_dir()?;
    let page_path = common::create_test_file(
        temp_dir.path(),
        "pages/abc123.html",
        &common::page_html(&[
            common::track_json(EN_USER, "en", false),
            common::track_json(DE_ASR, "de", true),
        ]),
    )?;

    let page = StaticPage::from_file(&page_path).await?;
    let video_id = FileManager::video_id_for(&page_path);
    assert_eq!(video_id, "abc123");

    let mock = MockFetcher::new()
        .with_json(format!("{}&fmt=json3", EN_USER), common::hello_world_document())
        .with_json(format!("{}&fmt=json3", DE_ASR), common::caption_document(&["Hallo"]));
    let fetcher = SubtitleFetcher::new(Arc::new(mock));
    let results = fetcher.fetch_subtitles(&page, &TrackSelection::all()).await;
    assert_eq!(results.len(), 2);

    let store_dir = temp_dir.path().join("kvs");
    let store = FileKeyValueStore::new(&store_dir, Url::parse("https://cdn.example.com/kvs/")?);
    let mut records = process_fetched_subtitles(&page.url(), &video_id, &results, Some(&store)).await?;
    records.sort_by(|a, b| a.language.cmp(&b.language));

    assert_eq!(records[0].language, "de");
    assert_eq!(records[0].kind, SubtitleKind::AutoGenerated);
    assert_eq!(
        records[0].srt_url.as_deref(),
        Some("https://cdn.example.com/kvs/subtitles_abc123_de_auto_generated.json")
    );
    assert_eq!(records[1].srt, common::HELLO_WORLD_SRT);

    let stored: StoredSubtitles = serde_json::from_str(&FileManager::read_to_string(
        store_dir.join("subtitles_abc123_en_user_generated.json"),
    )?)?;
    assert_eq!(stored, StoredSubtitles {
        subtitles: common::HELLO_WORLD_SRT.to_string(),
        kind: SubtitleKind::UserGenerated,
        language: "en".to_string(),
    });
    Ok(())
}

/// Pages without captions produce no records and touch no storage
#[tokio::test]
async fn test_pipeline_withPageWithoutCaptions_shouldProduceNoRecords() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let page = StaticPage::new("https://www.youtube.com/watch?v=none", "<html><body></body></html>");
    let fetcher = SubtitleFetcher::new(Arc::new(MockFetcher::new()));

    let results = fetcher.fetch_subtitles(&page, &TrackSelection::language("en", false)).await;
    let store_dir = temp_dir.path().join("kvs");
    let store = FileKeyValueStore::new(&store_dir, Url::parse("https://cdn.example.com/kvs/")?);
    let records = process_fetched_subtitles(&page.url(), "none", &results, Some(&store)).await?;

    assert!(records.is_empty());
    assert!(!FileManager::dir_exists(&store_dir));
    Ok(())
}
