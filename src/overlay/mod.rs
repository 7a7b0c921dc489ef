//! Overlay commentary-track synchronization.
//!
//! Commentary providers list their own episodes, whose numbering rarely
//! lines up with the playback source. Matching runs in three passes: exact
//! episode title, then extracted episode number, then positional index.

use serde::{Deserialize, Serialize};

/// One episode on the commentary provider side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayEpisode {
    pub title: String,
    /// URL of the timed-comment document for this episode.
    pub url: String,
}

/// A commentary series picked by the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySeries {
    /// Provider key, e.g. `"dandan"`.
    pub source: String,
    pub title: String,
    pub episodes: Vec<OverlayEpisode>,
}

/// Pull the first run of digits out of an episode title.
///
/// Handles forms like `"第12集"`, `"Episode 12"`, and a bare `"12"`.
pub fn extract_episode_number(title: &str) -> Option<u32> {
    let digits: String = title
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Find the commentary episode matching the currently playing one.
///
/// `episode_title` is the playback source's title for the episode (may be
/// absent); `episode_index` is zero-based. Returns the matched position and
/// episode, or `None` when nothing lines up.
pub fn match_episode<'a>(
    series: &'a OverlaySeries,
    episode_title: Option<&str>,
    episode_index: usize,
) -> Option<(usize, &'a OverlayEpisode)> {
    if let Some(title) = episode_title {
        // Pass 1: exact title.
        if let Some(found) = series
            .episodes
            .iter()
            .enumerate()
            .find(|(_, ep)| ep.title == title)
        {
            return Some(found);
        }

        // Pass 2: episode number extracted from both sides.
        if let Some(wanted) = extract_episode_number(title) {
            if let Some(found) = series
                .episodes
                .iter()
                .enumerate()
                .find(|(_, ep)| extract_episode_number(&ep.title) == Some(wanted))
            {
                return Some(found);
            }
        }
    }

    // Pass 3: same position in both lists.
    series
        .episodes
        .get(episode_index)
        .map(|ep| (episode_index, ep))
}
