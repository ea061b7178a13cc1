//! Track metadata store
//!
//! One record per external catalog id. Lookups are by catalog id (unique)
//! or by Telegram file id (not unique, first match in insertion order).
//! A miss is `Ok(None)`, never an error.

use rusqlite::{Connection, OptionalExtension, Result, Row};

use crate::storage::db::now_utc;

/// A cached track record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Internal row id
    pub id: i64,
    /// External catalog identifier, unique and immutable
    pub catalog_id: String,
    pub title: String,
    pub artist: String,
    /// Duration in seconds
    pub duration_secs: i64,
    /// Telegram file reference; several messages may share one upload
    pub telegram_file_id: Option<String>,
    /// Message that carried the upload, together with its channel
    pub telegram_message_id: Option<i64>,
    pub channel_id: Option<i64>,
    pub created_at: String,
}

/// Payload for inserting a new track.
#[derive(Debug, Clone)]
pub struct NewTrack<'a> {
    pub catalog_id: &'a str,
    pub title: &'a str,
    pub artist: &'a str,
    pub duration_secs: i64,
    pub telegram_file_id: Option<&'a str>,
    pub telegram_message_id: Option<i64>,
    pub channel_id: Option<i64>,
}

/// Inserts a track.
///
/// A second insert with the same catalog id fails with a constraint
/// violation and leaves the existing row untouched; callers branch on
/// `AppError::is_unique_violation` when "already exists" is benign.
pub fn create_track(conn: &Connection, track: &NewTrack<'_>) -> Result<Track> {
    conn.execute(
        "INSERT INTO tracks (catalog_id, title, artist, duration_secs, telegram_file_id, telegram_message_id, channel_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        &[
            &track.catalog_id as &dyn rusqlite::ToSql,
            &track.title as &dyn rusqlite::ToSql,
            &track.artist as &dyn rusqlite::ToSql,
            &track.duration_secs as &dyn rusqlite::ToSql,
            &track.telegram_file_id as &dyn rusqlite::ToSql,
            &track.telegram_message_id as &dyn rusqlite::ToSql,
            &track.channel_id as &dyn rusqlite::ToSql,
            &now_utc() as &dyn rusqlite::ToSql,
        ],
    )?;

    conn.query_row(
        "SELECT id, catalog_id, title, artist, duration_secs, telegram_file_id, telegram_message_id, channel_id, created_at
         FROM tracks WHERE id = ?1",
        &[&conn.last_insert_rowid() as &dyn rusqlite::ToSql],
        track_from_row,
    )
}

/// Looks up a track by catalog id. A missing row is `Ok(None)`.
pub fn get_track_by_catalog_id(conn: &Connection, catalog_id: &str) -> Result<Option<Track>> {
    conn.query_row(
        "SELECT id, catalog_id, title, artist, duration_secs, telegram_file_id, telegram_message_id, channel_id, created_at
         FROM tracks WHERE catalog_id = ?1",
        &[&catalog_id as &dyn rusqlite::ToSql],
        track_from_row,
    )
    .optional()
}

/// Looks up a track by Telegram file id.
///
/// The file id column is not unique; the first match in insertion order
/// is returned.
pub fn get_track_by_file_id(conn: &Connection, telegram_file_id: &str) -> Result<Option<Track>> {
    conn.query_row(
        "SELECT id, catalog_id, title, artist, duration_secs, telegram_file_id, telegram_message_id, channel_id, created_at
         FROM tracks WHERE telegram_file_id = ?1 ORDER BY id ASC LIMIT 1",
        &[&telegram_file_id as &dyn rusqlite::ToSql],
        track_from_row,
    )
    .optional()
}

/// Updates where a track's upload lives (file id, message, channel).
///
/// Returns `Ok(false)` when no track with that catalog id exists.
pub fn update_track_location(
    conn: &Connection,
    catalog_id: &str,
    telegram_file_id: &str,
    telegram_message_id: i64,
    channel_id: i64,
) -> Result<bool> {
    let rows_affected = conn.execute(
        "UPDATE tracks SET telegram_file_id = ?1, telegram_message_id = ?2, channel_id = ?3
         WHERE catalog_id = ?4",
        &[
            &telegram_file_id as &dyn rusqlite::ToSql,
            &telegram_message_id as &dyn rusqlite::ToSql,
            &channel_id as &dyn rusqlite::ToSql,
            &catalog_id as &dyn rusqlite::ToSql,
        ],
    )?;
    Ok(rows_affected > 0)
}

/// Administrative removal of a track record.
pub fn delete_track(conn: &Connection, catalog_id: &str) -> Result<bool> {
    let rows_affected = conn.execute(
        "DELETE FROM tracks WHERE catalog_id = ?1",
        &[&catalog_id as &dyn rusqlite::ToSql],
    )?;
    Ok(rows_affected > 0)
}

fn track_from_row(row: &Row<'_>) -> Result<Track> {
    Ok(Track {
        id: row.get(0)?,
        catalog_id: row.get(1)?,
        title: row.get(2)?,
        artist: row.get(3)?,
        duration_secs: row.get(4)?,
        telegram_file_id: row.get(5)?,
        telegram_message_id: row.get(6)?,
        channel_id: row.get(7)?,
        created_at: row.get(8)?,
    })
}
