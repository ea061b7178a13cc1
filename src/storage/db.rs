//! Connection pool and the user store
//!
//! Free functions over a pooled SQLite connection. Misses are always
//! `Ok(None)`; real storage failures surface as `Err` and propagate to the
//! caller unchanged.

use chrono::{SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, Result, Row};

use crate::core::error::{AppError, AppResult};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// A user record, one row per Telegram user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Telegram user id, immutable after creation
    pub telegram_id: i64,
    /// Telegram username, if the user has one
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// IETF language tag reported by the client
    pub language_code: Option<String>,
    /// Last observed activity, RFC 3339 UTC; never moves backward
    pub last_active_at: String,
    pub created_at: String,
}

/// Identity payload extracted from an incoming message.
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
}

/// Create a new database connection pool
///
/// The pool holds up to 10 connections. Schema migrations are a separate
/// startup step (`storage::migrations::run_migrations`), not a side effect
/// of pool creation.
pub fn create_pool(database_path: &str) -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder()
        .max_size(10)
        .build(manager)
        .map_err(AppError::DatabasePool)
}

/// Get a connection from the pool
///
/// The connection is returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> AppResult<DbConnection> {
    pool.get().map_err(AppError::DatabasePool)
}

/// Current time as RFC 3339 UTC, the format of every timestamp column.
pub fn now_utc() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Returns the user for the given profile, creating the row if absent.
///
/// A single `INSERT ... ON CONFLICT DO UPDATE` statement, so two
/// near-simultaneous first messages from the same new user cannot race a
/// lookup against a write. On conflict the profile columns are refreshed
/// and `last_active_at` is advanced; `MAX(...)` keeps it from ever being
/// set backward by a stale writer.
pub fn get_or_create_user(conn: &Connection, profile: &UserProfile) -> Result<User> {
    get_or_create_user_at(conn, profile, &now_utc())
}

fn get_or_create_user_at(conn: &Connection, profile: &UserProfile, now: &str) -> Result<User> {
    conn.execute(
        "INSERT INTO users (telegram_id, username, first_name, last_name, language_code, last_active_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
         ON CONFLICT(telegram_id) DO UPDATE SET
             username = excluded.username,
             first_name = excluded.first_name,
             last_name = excluded.last_name,
             language_code = excluded.language_code,
             last_active_at = MAX(users.last_active_at, excluded.last_active_at)",
        &[
            &profile.telegram_id as &dyn rusqlite::ToSql,
            &profile.username as &dyn rusqlite::ToSql,
            &profile.first_name as &dyn rusqlite::ToSql,
            &profile.last_name as &dyn rusqlite::ToSql,
            &profile.language_code as &dyn rusqlite::ToSql,
            &now as &dyn rusqlite::ToSql,
        ],
    )?;

    conn.query_row(
        "SELECT telegram_id, username, first_name, last_name, language_code, last_active_at, created_at
         FROM users WHERE telegram_id = ?1",
        &[&profile.telegram_id as &dyn rusqlite::ToSql],
        user_from_row,
    )
}

/// Looks up a user by Telegram id. A missing row is `Ok(None)`.
pub fn get_user(conn: &Connection, telegram_id: i64) -> Result<Option<User>> {
    conn.query_row(
        "SELECT telegram_id, username, first_name, last_name, language_code, last_active_at, created_at
         FROM users WHERE telegram_id = ?1",
        &[&telegram_id as &dyn rusqlite::ToSql],
        user_from_row,
    )
    .optional()
}

/// Administrative removal of a user record.
///
/// Returns `Ok(true)` when a row was deleted, `Ok(false)` when no such
/// user existed. Never invoked by normal message processing.
pub fn delete_user(conn: &Connection, telegram_id: i64) -> Result<bool> {
    let rows_affected = conn.execute(
        "DELETE FROM users WHERE telegram_id = ?1",
        &[&telegram_id as &dyn rusqlite::ToSql],
    )?;
    Ok(rows_affected > 0)
}

/// Number of user records.
pub fn count_users(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
}

fn user_from_row(row: &Row<'_>) -> Result<User> {
    Ok(User {
        telegram_id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        language_code: row.get(4)?,
        last_active_at: row.get(5)?,
        created_at: row.get(6)?,
    })
}
