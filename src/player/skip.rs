//! Skip-intro / skip-outro decisions.
//!
//! Pure decision logic: the caller feeds in playback position on a timer
//! and applies whatever action comes back. Checks are throttled so a
//! per-frame caller does not hammer the config.

use serde::{Deserialize, Serialize};

/// Minimum spacing between two skip checks (ms).
pub const CHECK_INTERVAL_MS: i64 = 1500;

/// Per-title skip configuration, persisted by key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkipConfig {
    pub enable: bool,
    /// Intro length in seconds; 0 disables intro skipping.
    pub intro_time: f64,
    /// Outro length in seconds, measured back from the end; 0 disables.
    pub outro_time: f64,
}

impl Default for SkipConfig {
    fn default() -> Self {
        Self {
            enable: false,
            intro_time: 0.0,
            outro_time: 0.0,
        }
    }
}

/// Action the player should take right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipAction {
    /// Jump forward to this position (seconds).
    SeekTo(f64),
    /// The outro started; advance to the next episode.
    NextEpisode,
}

/// Decide whether the current position warrants a skip.
///
/// `now_ms` / `last_check_ms` implement the throttle; pass the previous
/// call's `now_ms` back in. Returns `None` while throttled, disabled, or
/// mid-episode.
pub fn check(
    config: &SkipConfig,
    position: f64,
    duration: f64,
    now_ms: i64,
    last_check_ms: i64,
) -> Option<SkipAction> {
    if now_ms - last_check_ms < CHECK_INTERVAL_MS {
        return None;
    }
    if !config.enable {
        return None;
    }

    if config.intro_time > 0.0 && position > 0.0 && position < config.intro_time {
        return Some(SkipAction::SeekTo(config.intro_time));
    }

    if config.outro_time > 0.0 && duration > 0.0 && position >= duration - config.outro_time {
        return Some(SkipAction::NextEpisode);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(intro: f64, outro: f64) -> SkipConfig {
        SkipConfig {
            enable: true,
            intro_time: intro,
            outro_time: outro,
        }
    }

    #[test]
    fn disabled_config_never_skips() {
        let c = SkipConfig::default();
        assert_eq!(check(&c, 10.0, 2400.0, 10_000, 0), None);
    }

    #[test]
    fn intro_window_seeks_past_intro() {
        let c = config(90.0, 0.0);
        assert_eq!(
            check(&c, 30.0, 2400.0, 10_000, 0),
            Some(SkipAction::SeekTo(90.0))
        );
        // Past the intro: nothing to do.
        assert_eq!(check(&c, 120.0, 2400.0, 10_000, 0), None);
        // Not started yet.
        assert_eq!(check(&c, 0.0, 2400.0, 10_000, 0), None);
    }

    #[test]
    fn outro_window_advances_episode() {
        let c = config(0.0, 120.0);
        assert_eq!(
            check(&c, 2290.0, 2400.0, 10_000, 0),
            Some(SkipAction::NextEpisode)
        );
        assert_eq!(check(&c, 2000.0, 2400.0, 10_000, 0), None);
    }

    #[test]
    fn checks_are_throttled() {
        let c = config(90.0, 0.0);
        assert_eq!(check(&c, 30.0, 2400.0, 1000, 0), None);
        assert_eq!(
            check(&c, 30.0, 2400.0, 1600, 0),
            Some(SkipAction::SeekTo(90.0))
        );
    }

    #[test]
    fn unknown_duration_disables_outro_only() {
        let c = config(90.0, 120.0);
        // Duration not yet known: outro check stays quiet, intro still works.
        assert_eq!(
            check(&c, 30.0, 0.0, 10_000, 0),
            Some(SkipAction::SeekTo(90.0))
        );
        assert_eq!(check(&c, 500.0, 0.0, 10_000, 0), None);
    }
}
