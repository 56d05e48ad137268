//! Photo database queries.

use photostore_common::{Error, PhotoId, Result};
use rusqlite::Connection;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::models::Photo;
use crate::validation::validate_photo;

const PHOTO_COLUMNS: &str = "id, size, width, height, mime, uploaded_at";

/// Parse a photo from a database row.
///
/// Expects columns in order: id, size, width, height, mime, uploaded_at.
fn parse_photo_row(row: &rusqlite::Row) -> rusqlite::Result<Photo> {
    Ok(Photo {
        id: PhotoId::from(parse_uuid(row, 0)?),
        size: row.get::<_, i64>(1)? as u64,
        width: row.get(2)?,
        height: row.get(3)?,
        mime: row.get(4)?,
        uploaded_at: parse_timestamp(row, 5)?,
    })
}

/// Insert a photo record after validating it.
///
/// # Errors
///
/// * [`Error::Validation`] if a field is out of range; nothing is written.
/// * [`Error::Database`] if the insert fails.
pub fn insert_photo(conn: &Connection, photo: &Photo) -> Result<PhotoId> {
    validate_photo(photo)?;

    conn.execute(
        "INSERT INTO photos (id, size, width, height, mime, uploaded_at)
         VALUES (:id, :size, :width, :height, :mime, :uploaded_at)",
        rusqlite::named_params! {
            ":id": photo.id.to_string(),
            ":size": photo.size as i64,
            ":width": photo.width,
            ":height": photo.height,
            ":mime": &photo.mime,
            ":uploaded_at": format_timestamp(&photo.uploaded_at),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(photo.id)
}

/// Get a photo by ID. Returns `Ok(None)` if it does not exist.
pub fn get_photo(conn: &Connection, id: PhotoId) -> Result<Option<Photo>> {
    let result = conn.query_row(
        &format!("SELECT {} FROM photos WHERE id = :id", PHOTO_COLUMNS),
        rusqlite::named_params! { ":id": id.to_string() },
        parse_photo_row,
    );

    match result {
        Ok(photo) => Ok(Some(photo)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all photos, newest upload first.
pub fn list_photos(conn: &Connection) -> Result<Vec<Photo>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM photos ORDER BY uploaded_at DESC, id DESC",
            PHOTO_COLUMNS
        ))
        .map_err(|e| Error::database(e.to_string()))?;

    let photos = stmt
        .query_map([], parse_photo_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(photos)
}

/// Delete a photo. Its thumbnails are removed by the foreign key cascade.
///
/// Returns `true` if a row was deleted.
pub fn delete_photo(conn: &Connection, id: PhotoId) -> Result<bool> {
    let affected = conn
        .execute(
            "DELETE FROM photos WHERE id = :id",
            rusqlite::named_params! { ":id": id.to_string() },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(affected > 0)
}
