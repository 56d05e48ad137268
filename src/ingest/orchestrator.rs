use std::sync::Arc;

use bytes::Bytes;
use chrono::{SubsecRound, Utc};
use futures::future::join_all;
use photostore_common::{ContentKey, Error, PhotoId, Result, StoreTarget, ThumbnailId};
use photostore_db::models::{Photo, PhotoWithThumbnails, Thumbnail};
use photostore_db::validation::{validate_photo, validate_thumbnail};
use photostore_media::{DerivationSpec, DerivedImage};
use tracing::{debug, error, info, warn};

use super::commit::{CommitLog, WriteOutcome};
use super::state::{IngestError, IngestState};
use crate::config::ThumbnailVariant;
use crate::store::{ContentStore, MetadataStore};

/// Drives an upload from raw bytes to committed records.
///
/// Holds no per-ingest state; one instance is shared by all requests.
pub struct Ingestor {
    content: Arc<dyn ContentStore>,
    metadata: Arc<dyn MetadataStore>,
    variants: Arc<[ThumbnailVariant]>,
}

struct PendingThumbnail {
    record: Thumbnail,
    bytes: Bytes,
}

impl Ingestor {
    pub fn new(
        content: Arc<dyn ContentStore>,
        metadata: Arc<dyn MetadataStore>,
        variants: Vec<ThumbnailVariant>,
    ) -> Self {
        Self {
            content,
            metadata,
            variants: variants.into(),
        }
    }

    pub fn variants(&self) -> &[ThumbnailVariant] {
        &self.variants
    }

    /// Ingest one uploaded image.
    ///
    /// `declared_mime` and `declared_size` come from the uploader. The
    /// stored MIME type is the one detected from the bytes; the declared
    /// size is stored as given.
    ///
    /// # Errors
    ///
    /// * `InvalidImage` if the bytes cannot be decoded. Nothing is written.
    /// * `Validation` if the photo or a thumbnail violates a field
    ///   constraint. Nothing is written.
    /// * `StoreWrite` if any write fails. The error carries the commit log;
    ///   writes that did land are not rolled back.
    pub async fn ingest(
        &self,
        source: Bytes,
        declared_mime: &str,
        declared_size: u64,
    ) -> std::result::Result<PhotoWithThumbnails, IngestError> {
        let mut state = IngestState::Received;

        let probed =
            photostore_media::probe(&source).map_err(|e| IngestError::new(e, state))?;

        let photo_id = PhotoId::new();
        // Both metadata backends keep microseconds.
        let uploaded_at = Utc::now().trunc_subsecs(6);
        debug!(%photo_id, width = probed.width, height = probed.height, "probed upload");

        if !declared_mime.eq_ignore_ascii_case(&probed.mime) {
            warn!(
                %photo_id,
                declared = declared_mime,
                detected = %probed.mime,
                "declared MIME type does not match image content; storing detected type"
            );
        }

        let photo = Photo {
            id: photo_id,
            size: declared_size,
            width: probed.width,
            height: probed.height,
            mime: probed.mime,
            uploaded_at,
        };
        validate_photo(&photo).map_err(|e| IngestError::new(e, state))?;
        state = self.advance(photo_id, state, IngestState::Validated);

        let derived = self
            .derive(source.clone())
            .await
            .map_err(|e| IngestError::new(e, state))?;

        let pending = self
            .variants
            .iter()
            .zip(derived)
            .map(|(variant, image)| {
                let record = Thumbnail {
                    id: ThumbnailId::new(),
                    photo_id,
                    size: image.byte_size,
                    width: image.width,
                    height: image.height,
                    mime: image.mime_type(),
                    kind: variant.kind,
                    uploaded_at,
                };
                validate_thumbnail(&record)?;
                Ok(PendingThumbnail {
                    record,
                    bytes: image.bytes,
                })
            })
            .collect::<Result<Vec<_>>>()
            .map_err(|e| IngestError::new(e, state))?;
        state = self.advance(photo_id, state, IngestState::Derived);

        state = self.advance(photo_id, state, IngestState::Committing);
        let log = self.commit(&photo, source, &pending).await;

        if let Some(err) = log.first_failure() {
            for record in log.failures() {
                error!(
                    %photo_id,
                    target = %record.target,
                    key = %record.key,
                    outcome = ?record.outcome,
                    "write failed"
                );
            }
            for orphan in log.orphans() {
                warn!(
                    %photo_id,
                    target = %orphan.target,
                    key = %orphan.key,
                    "orphaned write left behind by failed ingest"
                );
            }
            self.advance(photo_id, state, IngestState::Failed);
            return Err(IngestError::new(err, state).with_commit_log(log));
        }

        self.advance(photo_id, state, IngestState::Committed);
        info!(
            %photo_id,
            thumbnails = pending.len(),
            summary = %log,
            "ingest committed"
        );

        Ok(PhotoWithThumbnails {
            photo,
            thumbnails: pending.into_iter().map(|p| p.record).collect(),
        })
    }

    fn advance(&self, photo_id: PhotoId, from: IngestState, to: IngestState) -> IngestState {
        debug!(%photo_id, %from, %to, "ingest state");
        to
    }

    async fn derive(&self, source: Bytes) -> Result<Vec<DerivedImage>> {
        let specs: Vec<DerivationSpec> = self.variants.iter().map(|v| v.spec()).collect();
        let expected = specs.len();

        let derived = tokio::task::spawn_blocking(move || photostore_media::derive(&source, &specs))
            .await
            .map_err(|e| Error::internal(format!("Derivation task failed: {}", e)))??;

        if derived.len() != expected {
            return Err(Error::internal(format!(
                "expected {} derivatives, got {}",
                expected,
                derived.len()
            )));
        }
        Ok(derived)
    }

    /// Issue every write and wait for all of them to settle.
    ///
    /// Content puts run concurrently with the metadata chain. The photo row
    /// must exist before its thumbnail rows, so the chain writes it first and
    /// then the thumbnail rows concurrently.
    async fn commit(&self, photo: &Photo, source: Bytes, pending: &[PendingThumbnail]) -> CommitLog {
        let source_len = source.len() as u64;
        let content_writes = std::iter::once(self.put_content(
            photo.content_key(),
            source,
            &photo.mime,
            source_len,
        ))
        .chain(pending.iter().map(|p| {
            self.put_content(
                p.record.content_key(),
                p.bytes.clone(),
                &p.record.mime,
                p.record.size,
            )
        }));

        let metadata_chain = async {
            let mut log = CommitLog::new();
            let photo_key = row_key("photos", photo.id);

            let saved = self.metadata.save_photo(photo).await;
            let photo_saved = saved.is_ok();
            log.record(StoreTarget::Metadata, photo_key, &saved);

            if photo_saved {
                let rows = join_all(pending.iter().map(|p| async move {
                    (
                        row_key("thumbnails", p.record.id),
                        self.metadata.save_thumbnail(&p.record).await,
                    )
                }))
                .await;
                for (key, result) in rows {
                    log.record(StoreTarget::Metadata, key, &result);
                }
            } else {
                for p in pending {
                    log.push(
                        StoreTarget::Metadata,
                        row_key("thumbnails", p.record.id),
                        WriteOutcome::Skipped("photo row was not written".to_string()),
                    );
                }
            }
            log
        };

        let (content_results, metadata_log) =
            tokio::join!(join_all(content_writes), metadata_chain);

        let mut log = CommitLog::new();
        for (key, result) in content_results {
            log.record(StoreTarget::Content, key.as_str(), &result);
        }
        for record in metadata_log.records() {
            log.push(record.target, record.key.clone(), record.outcome.clone());
        }
        log
    }

    async fn put_content(
        &self,
        key: ContentKey,
        bytes: Bytes,
        content_type: &str,
        content_length: u64,
    ) -> (ContentKey, Result<()>) {
        let result = self
            .content
            .put(&key, bytes, content_type, content_length)
            .await;
        (key, result)
    }
}

fn row_key(table: &str, id: impl std::fmt::Display) -> String {
    format!("{}/{}", table, id)
}
