//! Composite scoring for candidate playback sources.
//!
//! Each probed source gets a 0-100 score from a weighted combination of
//! resolution tier, measured download speed, and round-trip latency. Scores
//! are ephemeral: recomputed per selection round, never persisted.

pub mod select;

pub use select::{select_best, RankedCandidate, SelectError, SelectionOutcome};

use serde::{Deserialize, Serialize};

use crate::probe::Measurement;

/// Categorical resolution tier reported by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityTier {
    #[serde(rename = "4K")]
    FourK,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "SD")]
    Sd,
    #[serde(rename = "unknown")]
    Unknown,
}

impl QualityTier {
    /// Fixed lookup table for the quality sub-score.
    pub fn points(&self) -> f64 {
        match self {
            QualityTier::FourK => 100.0,
            QualityTier::TwoK => 85.0,
            QualityTier::P1080 => 75.0,
            QualityTier::P720 => 60.0,
            QualityTier::P480 => 40.0,
            QualityTier::Sd => 20.0,
            QualityTier::Unknown => 0.0,
        }
    }

    /// Classify a vertical resolution in pixels.
    pub fn from_height(height: u32) -> Self {
        match height {
            h if h >= 2160 => QualityTier::FourK,
            h if h >= 1440 => QualityTier::TwoK,
            h if h >= 1080 => QualityTier::P1080,
            h if h >= 720 => QualityTier::P720,
            h if h >= 480 => QualityTier::P480,
            _ => QualityTier::Sd,
        }
    }

    pub fn parse(label: &str) -> Self {
        match label {
            "4K" => QualityTier::FourK,
            "2K" => QualityTier::TwoK,
            "1080p" => QualityTier::P1080,
            "720p" => QualityTier::P720,
            "480p" => QualityTier::P480,
            "SD" => QualityTier::Sd,
            _ => QualityTier::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QualityTier::FourK => "4K",
            QualityTier::TwoK => "2K",
            QualityTier::P1080 => "1080p",
            QualityTier::P720 => "720p",
            QualityTier::P480 => "480p",
            QualityTier::Sd => "SD",
            QualityTier::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Measured download throughput, or a sentinel when the probe could not
/// (yet) measure it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "kbps")]
pub enum LoadSpeed {
    Unknown,
    Measuring,
    KBps(f64),
}

impl LoadSpeed {
    /// Normalized throughput in KB/s. `None` for the sentinels.
    pub fn as_kbps(&self) -> Option<f64> {
        match self {
            LoadSpeed::KBps(v) if *v > 0.0 => Some(*v),
            _ => None,
        }
    }

    /// Parse a display string like `"500 KB/s"` or `"2 MB/s"`.
    pub fn parse(display: &str) -> Self {
        let trimmed = display.trim();
        let (value_part, factor) = if let Some(v) = trimmed.strip_suffix("MB/s") {
            (v, 1024.0)
        } else if let Some(v) = trimmed.strip_suffix("KB/s") {
            (v, 1.0)
        } else {
            return LoadSpeed::Unknown;
        };
        match value_part.trim().parse::<f64>() {
            Ok(v) if v >= 0.0 => LoadSpeed::KBps(v * factor),
            _ => LoadSpeed::Unknown,
        }
    }
}

impl std::fmt::Display for LoadSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadSpeed::Unknown => write!(f, "unknown"),
            LoadSpeed::Measuring => write!(f, "measuring"),
            LoadSpeed::KBps(v) if *v >= 1024.0 => write!(f, "{:.1} MB/s", v / 1024.0),
            LoadSpeed::KBps(v) => write!(f, "{:.1} KB/s", v),
        }
    }
}

/// Tunable scoring constants.
///
/// The sentinel handling (flat points for unmeasured speed, zero for invalid
/// latency) and the fallback bounds are policy, not derived from data, so
/// they live here instead of inline literals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub quality_weight: f64,
    pub speed_weight: f64,
    pub latency_weight: f64,
    /// Speed sub-score assigned when throughput is unknown or still measuring.
    pub unmeasured_speed_points: f64,
    /// Round max speed used when no candidate reported a valid speed (KB/s).
    pub fallback_max_speed_kbps: f64,
    /// Ping window used when no candidate reported a valid latency (ms).
    pub fallback_min_ping_ms: f64,
    pub fallback_max_ping_ms: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            quality_weight: 0.4,
            speed_weight: 0.4,
            latency_weight: 0.2,
            unmeasured_speed_points: 30.0,
            fallback_max_speed_kbps: 1024.0,
            fallback_min_ping_ms: 50.0,
            fallback_max_ping_ms: 1000.0,
        }
    }
}

/// Per-round normalization bounds, derived from the successful measurements
/// of the current selection round.
#[derive(Debug, Clone, Copy)]
pub struct RoundStats {
    pub max_speed_kbps: f64,
    pub min_ping_ms: f64,
    pub max_ping_ms: f64,
}

impl RoundStats {
    /// Derive bounds from the round's successful measurements, falling back
    /// to the policy defaults when nothing valid was reported.
    pub fn from_measurements<'a, I>(measurements: I, policy: &ScoringPolicy) -> Self
    where
        I: IntoIterator<Item = &'a Measurement>,
    {
        let mut max_speed: Option<f64> = None;
        let mut min_ping: Option<f64> = None;
        let mut max_ping: Option<f64> = None;

        for m in measurements {
            if let Some(kbps) = m.load_speed.as_kbps() {
                max_speed = Some(max_speed.map_or(kbps, |v: f64| v.max(kbps)));
            }
            if m.ping_time_ms > 0.0 {
                min_ping = Some(min_ping.map_or(m.ping_time_ms, |v: f64| v.min(m.ping_time_ms)));
                max_ping = Some(max_ping.map_or(m.ping_time_ms, |v: f64| v.max(m.ping_time_ms)));
            }
        }

        Self {
            max_speed_kbps: max_speed.unwrap_or(policy.fallback_max_speed_kbps),
            min_ping_ms: min_ping.unwrap_or(policy.fallback_min_ping_ms),
            max_ping_ms: max_ping.unwrap_or(policy.fallback_max_ping_ms),
        }
    }
}

/// Composite 0-100 score for one measurement, rounded to two decimals.
///
/// Quality and speed each carry 40% of the weight, latency 20%. Speed maps
/// linearly against the round maximum; latency maps linearly across the
/// round's ping window (minimum scores 100, maximum scores 0).
pub fn compute_score(m: &Measurement, stats: &RoundStats, policy: &ScoringPolicy) -> f64 {
    let quality_score = m.quality.points();

    // A measured zero is a real (terrible) result and scores 0; only the
    // sentinels fall back to the flat default.
    let speed_score = match m.load_speed {
        LoadSpeed::Unknown | LoadSpeed::Measuring => policy.unmeasured_speed_points,
        LoadSpeed::KBps(kbps) => {
            let ratio = kbps / stats.max_speed_kbps;
            (ratio * 100.0).clamp(0.0, 100.0)
        }
    };

    let ping_score = if m.ping_time_ms <= 0.0 {
        // Invalid or unmeasured latency.
        0.0
    } else if stats.max_ping_ms == stats.min_ping_ms {
        // All valid latencies in the round are equal.
        100.0
    } else {
        let ratio = (stats.max_ping_ms - m.ping_time_ms) / (stats.max_ping_ms - stats.min_ping_ms);
        (ratio * 100.0).clamp(0.0, 100.0)
    };

    let score = quality_score * policy.quality_weight
        + speed_score * policy.speed_weight
        + ping_score * policy.latency_weight;

    (score * 100.0).round() / 100.0
}
