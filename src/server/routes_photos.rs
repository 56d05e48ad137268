//! Photo upload, query, deletion and signed URL routes.

use std::str::FromStr;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use photostore_common::{Error, PhotoId, ThumbnailId};
use photostore_db::models::{Photo, PhotoWithThumbnails};

use super::error::AppError;
use super::AppContext;
use crate::ingest::UploadBuffer;
use crate::photos::{DeletionReport, SignedUrl};

/// Multipart field carrying the image.
pub const UPLOAD_FIELD: &str = "photo";

pub fn photo_routes() -> Router<AppContext> {
    Router::new()
        .route("/photos", post(upload_photo).get(list_photos))
        .route("/photos/{id}", get(get_photo).delete(delete_photo))
        .route("/photos/{id}/url", get(photo_url))
        .route("/thumbnails/{id}/url", get(thumbnail_url))
}

fn parse_id<T: FromStr>(entity: &str, raw: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::from(Error::validation(format!("Invalid {} ID: {}", entity, raw))))
}

/// Accept a multipart upload and ingest it.
///
/// The `photo` field is spooled to a temporary file as it streams in; the
/// declared MIME type is the field's content type and the declared size is
/// the number of bytes received.
async fn upload_photo(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<PhotoWithThumbnails>), AppError> {
    let mut upload = None;

    while let Some(mut field) = multipart.next_field().await.map_err(AppError::multipart)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let declared_mime = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let mut buffer = UploadBuffer::new(ctx.config.server.temp_dir.as_deref()).await?;
        while let Some(chunk) = field.chunk().await.map_err(AppError::multipart)? {
            buffer.write(&chunk).await?;
        }

        upload = Some((buffer, declared_mime));
        break;
    }

    let Some((buffer, declared_mime)) = upload else {
        return Err(Error::validation(format!(
            "Missing multipart field '{}'",
            UPLOAD_FIELD
        ))
        .into());
    };

    let declared_size = buffer.len();
    let bytes = buffer.into_bytes().await?;
    tracing::debug!(
        "Received upload of {} bytes declared as {}",
        declared_size,
        declared_mime
    );

    let ingested = ctx
        .ingestor
        .ingest(bytes, &declared_mime, declared_size)
        .await?;

    Ok((StatusCode::CREATED, Json(ingested)))
}

async fn list_photos(State(ctx): State<AppContext>) -> Result<Json<Vec<Photo>>, AppError> {
    Ok(Json(ctx.photos.list().await?))
}

async fn get_photo(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<PhotoWithThumbnails>, AppError> {
    let id: PhotoId = parse_id("photo", &id)?;
    Ok(Json(ctx.photos.get(id).await?))
}

async fn delete_photo(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<DeletionReport>, AppError> {
    let id: PhotoId = parse_id("photo", &id)?;
    Ok(Json(ctx.photos.delete(id).await?))
}

async fn photo_url(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<SignedUrl>, AppError> {
    let id: PhotoId = parse_id("photo", &id)?;
    Ok(Json(ctx.photos.photo_url(id).await?))
}

async fn thumbnail_url(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<SignedUrl>, AppError> {
    let id: ThumbnailId = parse_id("thumbnail", &id)?;
    Ok(Json(ctx.photos.thumbnail_url(id).await?))
}
