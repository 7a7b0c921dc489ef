//! Candidate sources: titles, episode lists, storage keys.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One playable stream origin for a title, as returned by an upstream
/// search aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSource {
    /// Aggregator site key, e.g. `"dyttzy"`.
    pub source: String,
    /// Identifier of the title within that site.
    pub id: String,
    /// Human-readable site name.
    pub source_name: String,
    pub title: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub douban_id: u64,
    /// Per-episode playback URLs.
    #[serde(default)]
    pub episodes: Vec<String>,
    #[serde(default)]
    pub episodes_titles: Vec<String>,
}

impl MediaSource {
    /// Key used for persistence and for the selection measurement map.
    pub fn storage_key(&self) -> String {
        format!("{}+{}", self.source, self.id)
    }

    /// Playback URL for a zero-based episode index. Out-of-range or empty
    /// episode lists resolve to nothing rather than an error.
    pub fn episode_url(&self, index: usize) -> Option<&str> {
        self.episodes.get(index).map(String::as_str)
    }

    /// Title for a zero-based episode index, if the aggregator supplied one.
    pub fn episode_title(&self, index: usize) -> Option<&str> {
        self.episodes_titles.get(index).map(String::as_str)
    }

    /// URL probed during selection. Prefers the second episode when there is
    /// one; first episodes are often re-encoded trailers or recaps.
    pub fn probe_url(&self) -> Option<&str> {
        if self.episodes.len() > 1 {
            self.episode_url(1)
        } else {
            self.episode_url(0)
        }
    }

    pub fn total_episodes(&self) -> usize {
        self.episodes.len()
    }
}

/// Load a candidate list from a JSON manifest (an array of sources).
pub fn load_manifest(path: &Path) -> Result<Vec<MediaSource>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest: {}", path.display()))?;
    let sources: Vec<MediaSource> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse manifest: {}", path.display()))?;
    Ok(sources)
}
