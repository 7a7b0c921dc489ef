//! Playback session bookkeeping.
//!
//! Tracks where the viewer is in an episode, persists progress on a
//! throttle, and answers "where should playback resume". Player control
//! itself stays behind [`crate::player::PlayerBackend`]; this module only
//! touches the storage pool.

use anyhow::Result;
use tracing::debug;

use crate::catalog::MediaSource;
use crate::storage::{self, PlayRecord, Pool};

/// Minimum spacing between two progress saves (ms).
pub const AUTOSAVE_INTERVAL_MS: i64 = 5000;

/// Progress within the final stretch of an episode is not worth resuming.
const RESUME_TAIL_GUARD_SECS: f64 = 2.0;

pub struct PlaybackSession {
    pool: Pool,
    source: MediaSource,
    /// Zero-based episode currently playing.
    episode_index: usize,
    search_title: String,
    last_save_ms: i64,
}

impl PlaybackSession {
    pub fn new(pool: Pool, source: MediaSource, episode_index: usize, search_title: &str) -> Self {
        Self {
            pool,
            source,
            episode_index,
            search_title: search_title.to_string(),
            last_save_ms: 0,
        }
    }

    pub fn source(&self) -> &MediaSource {
        &self.source
    }

    pub fn episode_index(&self) -> usize {
        self.episode_index
    }

    pub fn episode_url(&self) -> Option<&str> {
        self.source.episode_url(self.episode_index)
    }

    /// Position playback should resume from, if a usable record exists.
    ///
    /// Resuming only makes sense when the saved record is for the same
    /// episode and the position is neither at the start nor within the
    /// final seconds of the runtime.
    pub fn resume_position(&self) -> Result<Option<f64>> {
        let record = storage::get_play_record(&self.pool, &self.source.storage_key())?;
        let Some(record) = record else {
            return Ok(None);
        };

        if record.index as usize != self.episode_index + 1 {
            return Ok(None);
        }
        if record.play_time <= 0.0 {
            return Ok(None);
        }
        if record.total_time > 0.0 && record.play_time >= record.total_time - RESUME_TAIL_GUARD_SECS
        {
            return Ok(None);
        }
        Ok(Some(record.play_time))
    }

    /// Report the current playback position; persists at most once per
    /// [`AUTOSAVE_INTERVAL_MS`]. Returns whether a save happened.
    pub fn tick(&mut self, position: f64, duration: f64, now_ms: i64) -> Result<bool> {
        if now_ms - self.last_save_ms < AUTOSAVE_INTERVAL_MS {
            return Ok(false);
        }
        self.save_progress(position, duration, now_ms)?;
        Ok(true)
    }

    /// Persist the current position unconditionally (pause, unload, seek).
    pub fn save_progress(&mut self, position: f64, duration: f64, now_ms: i64) -> Result<()> {
        let record = PlayRecord {
            title: self.source.title.clone(),
            source_name: self.source.source_name.clone(),
            year: self.source.year.clone(),
            cover: self.source.cover.clone(),
            index: self.episode_index as u32 + 1,
            total_episodes: self.source.total_episodes() as u32,
            play_time: position,
            total_time: duration,
            save_time: now_ms,
            search_title: self.search_title.clone(),
        };
        storage::save_play_record(&self.pool, &self.source.storage_key(), &record)?;
        self.last_save_ms = now_ms;
        debug!(
            key = %self.source.storage_key(),
            episode = self.episode_index + 1,
            position,
            "progress saved"
        );
        Ok(())
    }

    /// Switch to another episode, recording the change immediately so the
    /// continue-watching list follows along.
    pub fn switch_episode(&mut self, episode_index: usize, now_ms: i64) -> Result<()> {
        self.episode_index = episode_index;
        self.last_save_ms = 0;
        self.save_progress(0.0, 0.0, now_ms)
    }

    /// Flip the favorite state for this title. Returns the new state.
    pub fn toggle_favorite(&self, now_ms: i64) -> Result<bool> {
        let key = self.source.storage_key();
        if storage::is_favorited(&self.pool, &key)? {
            storage::delete_favorite(&self.pool, &key)?;
            Ok(false)
        } else {
            let favorite = storage::Favorite {
                title: self.source.title.clone(),
                source_name: self.source.source_name.clone(),
                year: self.source.year.clone(),
                cover: self.source.cover.clone(),
                total_episodes: self.source.total_episodes() as u32,
                save_time: now_ms,
            };
            storage::save_favorite(&self.pool, &key, &favorite)?;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use r2d2_sqlite::SqliteConnectionManager;

    fn test_pool() -> Pool {
        let manager = SqliteConnectionManager::memory();
        let pool = r2d2::Pool::builder().max_size(1).build(manager).unwrap();
        let conn = pool.get().unwrap();
        crate::storage::schema::migrate(&conn).unwrap();
        pool
    }

    fn source() -> MediaSource {
        MediaSource {
            source: "site".to_string(),
            id: "1".to_string(),
            source_name: "Site".to_string(),
            title: "Show".to_string(),
            year: "2024".to_string(),
            cover: String::new(),
            douban_id: 0,
            episodes: vec![
                "http://a/1.m3u8".to_string(),
                "http://a/2.m3u8".to_string(),
                "http://a/3.m3u8".to_string(),
            ],
            episodes_titles: Vec::new(),
        }
    }

    #[test]
    fn autosave_is_throttled() {
        let mut session = PlaybackSession::new(test_pool(), source(), 0, "show");
        assert!(session.tick(10.0, 2400.0, 10_000).unwrap());
        assert!(!session.tick(12.0, 2400.0, 12_000).unwrap());
        assert!(session.tick(20.0, 2400.0, 16_000).unwrap());
    }

    #[test]
    fn resume_requires_same_episode_and_sane_position() {
        let pool = test_pool();
        let mut session = PlaybackSession::new(pool.clone(), source(), 0, "show");
        session.save_progress(300.0, 2400.0, 1000).unwrap();

        assert_eq!(session.resume_position().unwrap(), Some(300.0));

        // A different episode invalidates the saved position.
        let other = PlaybackSession::new(pool.clone(), source(), 1, "show");
        assert_eq!(other.resume_position().unwrap(), None);

        // Position at the very end is not resumable.
        session.save_progress(2399.0, 2400.0, 2000).unwrap();
        assert_eq!(session.resume_position().unwrap(), None);

        // Position zero is not resumable.
        session.save_progress(0.0, 2400.0, 3000).unwrap();
        assert_eq!(session.resume_position().unwrap(), None);
    }

    #[test]
    fn switching_episodes_resets_progress() {
        let pool = test_pool();
        let mut session = PlaybackSession::new(pool.clone(), source(), 0, "show");
        session.save_progress(300.0, 2400.0, 1000).unwrap();

        session.switch_episode(1, 2000).unwrap();
        assert_eq!(session.episode_url(), Some("http://a/2.m3u8"));

        let record = crate::storage::get_play_record(&pool, "site+1")
            .unwrap()
            .unwrap();
        assert_eq!(record.index, 2);
        assert_eq!(record.play_time, 0.0);
    }

    #[test]
    fn favorite_toggle_flips_state() {
        let pool = test_pool();
        let session = PlaybackSession::new(pool.clone(), source(), 0, "show");

        assert!(session.toggle_favorite(1000).unwrap());
        assert!(crate::storage::is_favorited(&pool, "site+1").unwrap());
        assert!(!session.toggle_favorite(2000).unwrap());
        assert!(!crate::storage::is_favorited(&pool, "site+1").unwrap());
    }
}
