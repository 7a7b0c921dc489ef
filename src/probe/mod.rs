//! Stream measurement probes.
//!
//! A probe fetches a short slice of a candidate stream and reports the
//! resolution tier, download throughput, and round-trip latency that the
//! scorer consumes. Probes carry their own timeouts; a failed probe is an
//! `Err` the selector downgrades to "candidate excluded", never a crash.

pub mod hls;

pub use hls::HlsProbe;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::{LoadSpeed, QualityTier};

/// One probe result for a single candidate source.
///
/// `ping_time_ms <= 0` means latency was not measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub quality: QualityTier,
    pub load_speed: LoadSpeed,
    pub ping_time_ms: f64,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid stream url: {url}")]
    InvalidUrl { url: String },

    #[error("playlist at {url} is empty")]
    EmptyPlaylist { url: String },

    #[error("no media segment found in playlist at {url}")]
    NoSegment { url: String },
}

/// Trait for all stream speed probes.
#[async_trait::async_trait]
pub trait SpeedProbe: Send + Sync {
    /// Measure one episode URL.
    async fn measure(&self, episode_url: &str) -> Result<Measurement, ProbeError>;
}
