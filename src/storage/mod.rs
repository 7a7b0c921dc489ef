//! SQLite persistence -- play records, favorites, skip configs.
//!
//! Keys follow the `"{source}+{id}"` convention from
//! [`crate::catalog::MediaSource::storage_key`].

pub mod schema;

use anyhow::Result;
use chrono::Utc;
use r2d2::Pool as R2D2Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::player::skip::SkipConfig;

/// Connection Pool type
pub type Pool = R2D2Pool<SqliteConnectionManager>;

/// Open (or create) the SQLite database and return a connection pool.
pub fn open_pool(path: &str) -> Result<Pool> {
    let manager = SqliteConnectionManager::file(path).with_init(|c| {
        c.execute_batch(
            "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA temp_store = MEMORY;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
        )
    });

    let pool = R2D2Pool::new(manager)?;

    // Run migrations on a single connection
    let conn = pool.get()?;
    schema::migrate(&conn)?;

    Ok(pool)
}

/// Current wall-clock time in unix milliseconds, the `save_time` unit.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Watch progress for one title on one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRecord {
    pub title: String,
    pub source_name: String,
    pub year: String,
    pub cover: String,
    /// 1-based episode number being watched.
    pub index: u32,
    pub total_episodes: u32,
    /// Playback position in seconds.
    pub play_time: f64,
    /// Episode duration in seconds.
    pub total_time: f64,
    /// Unix milliseconds of the last save.
    pub save_time: i64,
    pub search_title: String,
}

/// Upsert the play record for `key`.
pub fn save_play_record(pool: &Pool, key: &str, record: &PlayRecord) -> Result<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO play_records
            (key, title, source_name, year, cover, episode_index, total_episodes,
             play_time, total_time, save_time, search_title)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(key) DO UPDATE SET
            title = excluded.title,
            source_name = excluded.source_name,
            year = excluded.year,
            cover = excluded.cover,
            episode_index = excluded.episode_index,
            total_episodes = excluded.total_episodes,
            play_time = excluded.play_time,
            total_time = excluded.total_time,
            save_time = excluded.save_time,
            search_title = excluded.search_title",
        params![
            key,
            record.title,
            record.source_name,
            record.year,
            record.cover,
            record.index,
            record.total_episodes,
            record.play_time,
            record.total_time,
            record.save_time,
            record.search_title
        ],
    )?;
    Ok(())
}

pub fn get_play_record(pool: &Pool, key: &str) -> Result<Option<PlayRecord>> {
    let conn = pool.get()?;
    let record = conn
        .query_row(
            "SELECT title, source_name, year, cover, episode_index, total_episodes,
                    play_time, total_time, save_time, search_title
             FROM play_records WHERE key = ?1",
            params![key],
            |row| {
                Ok(PlayRecord {
                    title: row.get(0)?,
                    source_name: row.get(1)?,
                    year: row.get(2)?,
                    cover: row.get(3)?,
                    index: row.get(4)?,
                    total_episodes: row.get(5)?,
                    play_time: row.get(6)?,
                    total_time: row.get(7)?,
                    save_time: row.get(8)?,
                    search_title: row.get(9)?,
                })
            },
        )
        .optional()?;
    Ok(record)
}

/// All play records, most recently saved first.
pub fn get_all_play_records(pool: &Pool) -> Result<Vec<(String, PlayRecord)>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT key, title, source_name, year, cover, episode_index, total_episodes,
                play_time, total_time, save_time, search_title
         FROM play_records ORDER BY save_time DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        let key: String = row.get(0)?;
        Ok((
            key,
            PlayRecord {
                title: row.get(1)?,
                source_name: row.get(2)?,
                year: row.get(3)?,
                cover: row.get(4)?,
                index: row.get(5)?,
                total_episodes: row.get(6)?,
                play_time: row.get(7)?,
                total_time: row.get(8)?,
                save_time: row.get(9)?,
                search_title: row.get(10)?,
            },
        ))
    })?;

    let mut records = Vec::new();
    for r in rows {
        records.push(r?);
    }
    Ok(records)
}

pub fn delete_play_record(pool: &Pool, key: &str) -> Result<()> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM play_records WHERE key = ?1", params![key])?;
    Ok(())
}

/// A favorited title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub title: String,
    pub source_name: String,
    pub year: String,
    pub cover: String,
    pub total_episodes: u32,
    pub save_time: i64,
}

pub fn save_favorite(pool: &Pool, key: &str, favorite: &Favorite) -> Result<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO favorites (key, title, source_name, year, cover, total_episodes, save_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(key) DO UPDATE SET
            title = excluded.title,
            source_name = excluded.source_name,
            year = excluded.year,
            cover = excluded.cover,
            total_episodes = excluded.total_episodes,
            save_time = excluded.save_time",
        params![
            key,
            favorite.title,
            favorite.source_name,
            favorite.year,
            favorite.cover,
            favorite.total_episodes,
            favorite.save_time
        ],
    )?;
    Ok(())
}

pub fn delete_favorite(pool: &Pool, key: &str) -> Result<()> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM favorites WHERE key = ?1", params![key])?;
    Ok(())
}

pub fn is_favorited(pool: &Pool, key: &str) -> Result<bool> {
    let conn = pool.get()?;
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM favorites WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn get_all_favorites(pool: &Pool) -> Result<Vec<(String, Favorite)>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT key, title, source_name, year, cover, total_episodes, save_time
         FROM favorites ORDER BY save_time DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        let key: String = row.get(0)?;
        Ok((
            key,
            Favorite {
                title: row.get(1)?,
                source_name: row.get(2)?,
                year: row.get(3)?,
                cover: row.get(4)?,
                total_episodes: row.get(5)?,
                save_time: row.get(6)?,
            },
        ))
    })?;

    let mut favorites = Vec::new();
    for r in rows {
        favorites.push(r?);
    }
    Ok(favorites)
}

pub fn save_skip_config(pool: &Pool, key: &str, config: &SkipConfig) -> Result<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO skip_configs (key, enable, intro_time, outro_time)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(key) DO UPDATE SET
            enable = excluded.enable,
            intro_time = excluded.intro_time,
            outro_time = excluded.outro_time",
        params![key, config.enable, config.intro_time, config.outro_time],
    )?;
    Ok(())
}

pub fn get_skip_config(pool: &Pool, key: &str) -> Result<Option<SkipConfig>> {
    let conn = pool.get()?;
    let config = conn
        .query_row(
            "SELECT enable, intro_time, outro_time FROM skip_configs WHERE key = ?1",
            params![key],
            |row| {
                Ok(SkipConfig {
                    enable: row.get(0)?,
                    intro_time: row.get(1)?,
                    outro_time: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(config)
}

pub fn delete_skip_config(pool: &Pool, key: &str) -> Result<()> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM skip_configs WHERE key = ?1", params![key])?;
    Ok(())
}

/// Settings key for the ad-filter toggle.
const SETTING_BLOCK_AD: &str = "enable_blockad";

fn get_setting(pool: &Pool, key: &str) -> Result<Option<String>> {
    let conn = pool.get()?;
    let value = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

fn set_setting(pool: &Pool, key: &str, value: &str) -> Result<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Whether playlist ad filtering is on. Defaults to enabled until the
/// viewer toggles it off.
pub fn block_ad_enabled(pool: &Pool) -> Result<bool> {
    Ok(get_setting(pool, SETTING_BLOCK_AD)?
        .map(|v| v == "true")
        .unwrap_or(true))
}

pub fn set_block_ad(pool: &Pool, enabled: bool) -> Result<()> {
    set_setting(pool, SETTING_BLOCK_AD, if enabled { "true" } else { "false" })
}
