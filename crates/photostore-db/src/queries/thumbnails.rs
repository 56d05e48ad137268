//! Thumbnail database queries.

use photostore_common::{Error, PhotoId, Result, ThumbnailId, ThumbnailKind};
use rusqlite::types::Type;
use rusqlite::Connection;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::models::Thumbnail;
use crate::validation::validate_thumbnail;

const THUMBNAIL_COLUMNS: &str = "id, photo_id, size, width, height, mime, kind, uploaded_at";

/// Expects columns in order: id, photo_id, size, width, height, mime, kind, uploaded_at.
fn parse_thumbnail_row(row: &rusqlite::Row) -> rusqlite::Result<Thumbnail> {
    let kind: String = row.get(6)?;
    let kind = kind
        .parse::<ThumbnailKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, e.into()))?;

    Ok(Thumbnail {
        id: ThumbnailId::from(parse_uuid(row, 0)?),
        photo_id: PhotoId::from(parse_uuid(row, 1)?),
        size: row.get::<_, i64>(2)? as u64,
        width: row.get(3)?,
        height: row.get(4)?,
        mime: row.get(5)?,
        kind,
        uploaded_at: parse_timestamp(row, 7)?,
    })
}

/// Insert a thumbnail record after validating it.
///
/// The owning photo row must already exist.
pub fn insert_thumbnail(conn: &Connection, thumbnail: &Thumbnail) -> Result<ThumbnailId> {
    validate_thumbnail(thumbnail)?;

    conn.execute(
        "INSERT INTO thumbnails (id, photo_id, size, width, height, mime, kind, uploaded_at)
         VALUES (:id, :photo_id, :size, :width, :height, :mime, :kind, :uploaded_at)",
        rusqlite::named_params! {
            ":id": thumbnail.id.to_string(),
            ":photo_id": thumbnail.photo_id.to_string(),
            ":size": thumbnail.size as i64,
            ":width": thumbnail.width,
            ":height": thumbnail.height,
            ":mime": &thumbnail.mime,
            ":kind": thumbnail.kind.as_str(),
            ":uploaded_at": format_timestamp(&thumbnail.uploaded_at),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(thumbnail.id)
}

/// Get a thumbnail by ID. Returns `Ok(None)` if it does not exist.
pub fn get_thumbnail(conn: &Connection, id: ThumbnailId) -> Result<Option<Thumbnail>> {
    let result = conn.query_row(
        &format!(
            "SELECT {} FROM thumbnails WHERE id = :id",
            THUMBNAIL_COLUMNS
        ),
        rusqlite::named_params! { ":id": id.to_string() },
        parse_thumbnail_row,
    );

    match result {
        Ok(thumbnail) => Ok(Some(thumbnail)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List the thumbnails of a photo, NORMAL before BLUR.
pub fn list_thumbnails_for_photo(conn: &Connection, photo_id: PhotoId) -> Result<Vec<Thumbnail>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM thumbnails WHERE photo_id = :photo_id
             ORDER BY CASE kind WHEN 'NORMAL' THEN 0 ELSE 1 END, id",
            THUMBNAIL_COLUMNS
        ))
        .map_err(|e| Error::database(e.to_string()))?;

    let thumbnails = stmt
        .query_map(
            rusqlite::named_params! { ":photo_id": photo_id.to_string() },
            parse_thumbnail_row,
        )
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(thumbnails)
}
