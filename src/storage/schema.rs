//! Database schema and migrations.

use anyhow::Result;
use rusqlite::Connection;

/// Run all pending migrations.
pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS play_records (
            key TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            source_name TEXT NOT NULL,
            year TEXT NOT NULL DEFAULT '',
            cover TEXT NOT NULL DEFAULT '',
            episode_index INTEGER NOT NULL,
            total_episodes INTEGER NOT NULL,
            play_time REAL NOT NULL DEFAULT 0,
            total_time REAL NOT NULL DEFAULT 0,
            save_time INTEGER NOT NULL,
            search_title TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS favorites (
            key TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            source_name TEXT NOT NULL,
            year TEXT NOT NULL DEFAULT '',
            cover TEXT NOT NULL DEFAULT '',
            total_episodes INTEGER NOT NULL,
            save_time INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS skip_configs (
            key TEXT PRIMARY KEY,
            enable INTEGER NOT NULL DEFAULT 0,
            intro_time REAL NOT NULL DEFAULT 0,
            outro_time REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_play_records_save_time ON play_records(save_time);
        CREATE INDEX IF NOT EXISTS idx_favorites_save_time ON favorites(save_time);",
    )?;

    Ok(())
}
