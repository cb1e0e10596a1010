//! Schema migrations for the local bookmark database.
//!
//! Uses a `schema_version` table to track which migrations have been applied.
//! Each migration runs exactly once and is recorded with a timestamp.

use chrono::Utc;
use rusqlite::Connection;

/// Current schema version. Bump this when adding a new migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Returns the current schema version from the database (0 if table doesn't exist).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Runs all pending schema migrations against the provided connection.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);

    if current < 1 {
        migration_v1(conn)?;
        record_version(conn, 1, "Local bookmark table keyed by (user_id, meal_id)")?;
    }

    if current < 2 {
        migration_v2(conn)?;
        record_version(conn, 2, "Index local bookmarks by user and timestamp")?;
    }

    Ok(())
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![version, Utc::now().timestamp(), description],
    )?;
    Ok(())
}

/// V1: one row per (user, meal); the meal id is the key inside the user's namespace.
fn migration_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS local_bookmarks (
            user_id TEXT NOT NULL,
            meal_id TEXT NOT NULL,
            meal_name TEXT NOT NULL,
            meal_thumb TEXT NOT NULL DEFAULT '',
            meal_category TEXT NOT NULL DEFAULT '',
            meal_area TEXT NOT NULL DEFAULT '',
            bookmarked_at TEXT,
            PRIMARY KEY (user_id, meal_id)
        );
        ",
    )
}

/// V2: listing is always per user, newest first.
fn migration_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_local_bookmarks_user_time
             ON local_bookmarks(user_id, bookmarked_at);",
    )
}
