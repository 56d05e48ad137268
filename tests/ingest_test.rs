//! Ingest pipeline integration tests.
//!
//! Drives [`Ingestor`] against fault-injecting stores to check the records
//! produced on success and what is left behind on each kind of failure.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use bytes::Bytes;

use common::{jpeg, png, FaultyContentStore, FaultyMetadataStore};
use photostore::config::default_variants;
use photostore::ingest::{IngestState, Ingestor, WriteOutcome};
use photostore::store::MetadataStore;
use photostore_common::{ContentKey, Error, StoreTarget, ThumbnailKind};

fn ingestor(
    content: &Arc<FaultyContentStore>,
    metadata: &Arc<FaultyMetadataStore>,
) -> Ingestor {
    Ingestor::new(content.clone(), metadata.clone(), default_variants())
}

// ---------------------------------------------------------------------------
// Success
// ---------------------------------------------------------------------------

#[tokio::test]
async fn jpeg_upload_produces_photo_and_two_thumbnails() {
    let content = Arc::new(FaultyContentStore::healthy());
    let metadata = Arc::new(FaultyMetadataStore::healthy());

    let result = ingestor(&content, &metadata)
        .ingest(Bytes::from(jpeg(1000, 800)), "image/jpeg", 2_000_000)
        .await
        .unwrap();

    let photo = &result.photo;
    assert_eq!(photo.width, 1000);
    assert_eq!(photo.height, 800);
    assert_eq!(photo.mime, "image/jpeg");
    assert_eq!(photo.size, 2_000_000);

    assert_eq!(result.thumbnails.len(), 2);
    let kinds: Vec<_> = result.thumbnails.iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![ThumbnailKind::Normal, ThumbnailKind::Blur]);
    for thumb in &result.thumbnails {
        assert_eq!(thumb.photo_id, photo.id);
        assert_eq!((thumb.width, thumb.height), (500, 400));
        assert_eq!(thumb.mime, "image/png");
        assert!(thumb.size > 0);
        assert_eq!(thumb.uploaded_at, photo.uploaded_at);
    }

    // Every object and row landed.
    assert_eq!(content.inner.len(), 3);
    let original = content.inner.get(&ContentKey::photo(photo.id)).unwrap();
    assert_eq!(original.content_type, "image/jpeg");
    for thumb in &result.thumbnails {
        let stored = content.inner.get(&thumb.content_key()).unwrap();
        assert_eq!(stored.bytes.len() as u64, thumb.size);
        assert_eq!(stored.content_type, "image/png");
    }

    assert_eq!(metadata.find_photo(photo.id).await.unwrap().as_ref(), Some(photo));
    assert_eq!(metadata.find_thumbnails(photo.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn small_image_is_not_enlarged() {
    let content = Arc::new(FaultyContentStore::healthy());
    let metadata = Arc::new(FaultyMetadataStore::healthy());

    let result = ingestor(&content, &metadata)
        .ingest(Bytes::from(png(120, 90)), "image/png", 4_096)
        .await
        .unwrap();

    for thumb in &result.thumbnails {
        assert_eq!((thumb.width, thumb.height), (120, 90));
    }
}

#[tokio::test]
async fn identical_bytes_get_distinct_ids() {
    let content = Arc::new(FaultyContentStore::healthy());
    let metadata = Arc::new(FaultyMetadataStore::healthy());
    let ingestor = ingestor(&content, &metadata);
    let bytes = Bytes::from(png(64, 64));

    let first = ingestor.ingest(bytes.clone(), "image/png", 100).await.unwrap();
    let second = ingestor.ingest(bytes, "image/png", 100).await.unwrap();

    assert_ne!(first.photo.id, second.photo.id);
    assert_eq!(metadata.find_all().await.unwrap().len(), 2);
    assert_eq!(content.inner.len(), 6);
}

#[tokio::test]
async fn detected_mime_wins_over_declared() {
    let content = Arc::new(FaultyContentStore::healthy());
    let metadata = Arc::new(FaultyMetadataStore::healthy());

    let result = ingestor(&content, &metadata)
        .ingest(Bytes::from(png(40, 30)), "image/jpeg", 512)
        .await
        .unwrap();

    assert_eq!(result.photo.mime, "image/png");
}

// ---------------------------------------------------------------------------
// Failures before any write
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_image_is_rejected_without_writes() {
    let content = Arc::new(FaultyContentStore::healthy());
    let metadata = Arc::new(FaultyMetadataStore::healthy());

    let err = ingestor(&content, &metadata)
        .ingest(Bytes::from_static(b"definitely not an image"), "image/jpeg", 23)
        .await
        .unwrap_err();

    assert_matches!(err.source, Error::InvalidImage(_));
    assert_eq!(err.failed_at, IngestState::Received);
    assert!(err.commit_log.is_none());
    assert_eq!(err.http_status(), 422);

    assert_eq!(content.put_attempts(), 0);
    assert_eq!(metadata.save_attempts(), 0);
}

#[tokio::test]
async fn oversized_declared_size_is_rejected_without_writes() {
    let content = Arc::new(FaultyContentStore::healthy());
    let metadata = Arc::new(FaultyMetadataStore::healthy());

    let err = ingestor(&content, &metadata)
        .ingest(Bytes::from(png(10, 10)), "image/png", 10_000_000_001)
        .await
        .unwrap_err();

    assert_matches!(err.source, Error::Validation(ref msg) if msg.contains("photo size"));
    assert_eq!(err.failed_at, IngestState::Received);
    assert_eq!(content.put_attempts(), 0);
    assert_eq!(metadata.save_attempts(), 0);
}

// ---------------------------------------------------------------------------
// Failures during commit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_thumbnail_put_reports_commit_log() {
    let content = Arc::new(FaultyContentStore::failing("thumbnails/"));
    let metadata = Arc::new(FaultyMetadataStore::healthy());

    let err = ingestor(&content, &metadata)
        .ingest(Bytes::from(jpeg(300, 200)), "image/jpeg", 50_000)
        .await
        .unwrap_err();

    assert_matches!(
        err.source,
        Error::StoreWrite {
            target: StoreTarget::Content,
            ..
        }
    );
    assert_eq!(err.failed_at, IngestState::Committing);
    assert_eq!(err.http_status(), 502);

    let log = err.commit_log.expect("commit failure carries a log");
    let failed: Vec<_> = log.failures().collect();
    assert_eq!(failed.len(), 2);
    assert!(failed
        .iter()
        .all(|r| r.target == StoreTarget::Content && r.key.starts_with("thumbnails/")));
    assert!(!log.is_clean());

    // Every write was attempted and nothing is rolled back.
    assert_eq!(content.put_attempts(), 3);
    assert_eq!(content.inner.len(), 1);
    let photos = metadata.find_all().await.unwrap();
    assert_eq!(photos.len(), 1);
    assert_eq!(metadata.find_thumbnails(photos[0].id).await.unwrap().len(), 2);

    // The original and all three rows are orphans.
    assert_eq!(log.orphans().len(), 4);
}

#[tokio::test]
async fn failed_photo_row_skips_thumbnail_rows() {
    let content = Arc::new(FaultyContentStore::healthy());
    let metadata = Arc::new(FaultyMetadataStore::failing_photos());

    let err = ingestor(&content, &metadata)
        .ingest(Bytes::from(png(64, 48)), "image/png", 2_048)
        .await
        .unwrap_err();

    assert_matches!(
        err.source,
        Error::StoreWrite {
            target: StoreTarget::Metadata,
            ..
        }
    );
    let log = err.commit_log.unwrap();

    let skipped: Vec<_> = log
        .records()
        .iter()
        .filter(|r| matches!(r.outcome, WriteOutcome::Skipped(_)))
        .collect();
    assert_eq!(skipped.len(), 2);
    assert!(skipped.iter().all(|r| r.key.starts_with("thumbnails/")));

    // Only the photo row was attempted; content writes still went ahead.
    assert_eq!(metadata.save_attempts(), 1);
    assert_eq!(content.inner.len(), 3);
    assert!(metadata.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_original_put_reports_content_failure() {
    let content = Arc::new(FaultyContentStore::failing("photos/"));
    let metadata = Arc::new(FaultyMetadataStore::healthy());

    let err = ingestor(&content, &metadata)
        .ingest(Bytes::from(png(80, 60)), "image/png", 1_024)
        .await
        .unwrap_err();

    assert_matches!(
        err.source,
        Error::StoreWrite {
            target: StoreTarget::Content,
            ref key,
            ..
        } if key.starts_with("photos/")
    );
    assert_eq!(err.failed_at, IngestState::Committing);

    let log = err.commit_log.unwrap();
    let failed: Vec<_> = log.failures().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].target, StoreTarget::Content);

    // Thumbnails and all rows still landed.
    assert_eq!(content.put_attempts(), 3);
    assert_eq!(content.inner.len(), 2);
    let photos = metadata.find_all().await.unwrap();
    assert_eq!(photos.len(), 1);
    assert!(!content.inner.contains(&ContentKey::photo(photos[0].id)));

    // Two thumbnail objects plus three rows.
    assert_eq!(log.orphans().len(), 5);
}

#[tokio::test]
async fn failed_thumbnail_row_leaves_photo_row_orphaned() {
    let content = Arc::new(FaultyContentStore::healthy());
    let metadata = Arc::new(FaultyMetadataStore::failing_thumbnails());

    let err = ingestor(&content, &metadata)
        .ingest(Bytes::from(jpeg(300, 200)), "image/jpeg", 9_000)
        .await
        .unwrap_err();

    assert_matches!(
        err.source,
        Error::StoreWrite {
            target: StoreTarget::Metadata,
            ref key,
            ..
        } if key.starts_with("thumbnails/")
    );
    assert_eq!(err.failed_at, IngestState::Committing);
    assert_eq!(err.http_status(), 502);

    let log = err.commit_log.unwrap();
    let failed: Vec<_> = log.failures().collect();
    assert_eq!(failed.len(), 2);
    assert!(failed.iter().all(|r| r.target == StoreTarget::Metadata));

    // The photo row committed and is reported as an orphan.
    assert_eq!(metadata.save_attempts(), 3);
    let photos = metadata.find_all().await.unwrap();
    assert_eq!(photos.len(), 1);
    let photo_key = format!("photos/{}", photos[0].id);
    let orphans = log.orphans();
    assert!(orphans
        .iter()
        .any(|r| r.target == StoreTarget::Metadata && r.key == photo_key));

    // All three objects plus the photo row.
    assert_eq!(orphans.len(), 4);
    assert_eq!(content.inner.len(), 3);
}
