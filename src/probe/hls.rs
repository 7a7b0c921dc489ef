//! HLS speed probe.
//!
//! Measures a candidate by fetching its playlist and timing one media
//! segment. This is deliberately not an HLS demuxer: the playlist text is
//! line-parsed for `RESOLUTION=` attributes and segment URIs only.

use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::{debug, warn};

use super::{Measurement, ProbeError, SpeedProbe};
use crate::scoring::{LoadSpeed, QualityTier};

/// Default per-request timeout for probe traffic.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HlsProbe {
    client: Client,
}

impl Default for HlsProbe {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }
}

impl HlsProbe {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    async fn fetch_text(&self, url: &str) -> Result<(String, f64), ProbeError> {
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ProbeError::Request {
                url: url.to_string(),
                source,
            })?;
        // Time-to-headers doubles as the round-trip latency estimate.
        let ttfb_ms = start.elapsed().as_secs_f64() * 1000.0;

        let body = response.text().await.map_err(|source| ProbeError::Request {
            url: url.to_string(),
            source,
        })?;
        Ok((body, ttfb_ms))
    }

    /// Download one media segment and derive KB/s from wall-clock time.
    async fn time_segment(&self, url: &str) -> Result<LoadSpeed, ProbeError> {
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ProbeError::Request {
                url: url.to_string(),
                source,
            })?;
        let bytes = response.bytes().await.map_err(|source| ProbeError::Request {
            url: url.to_string(),
            source,
        })?;
        let elapsed = start.elapsed().as_secs_f64();

        if bytes.is_empty() || elapsed <= 0.0 {
            return Ok(LoadSpeed::Unknown);
        }
        Ok(LoadSpeed::KBps(bytes.len() as f64 / 1024.0 / elapsed))
    }
}

#[async_trait::async_trait]
impl SpeedProbe for HlsProbe {
    async fn measure(&self, episode_url: &str) -> Result<Measurement, ProbeError> {
        let (playlist, ping_time_ms) = self.fetch_text(episode_url).await?;
        if playlist.trim().is_empty() {
            return Err(ProbeError::EmptyPlaylist {
                url: episode_url.to_string(),
            });
        }

        let parsed = parse_playlist(&playlist);

        // Master playlist: descend into the best variant for segments; its
        // advertised resolution decides the tier.
        let (quality, media_playlist_url) = match parsed {
            Playlist::Master { best_variant } => {
                let variant_url = resolve_url(episode_url, &best_variant.uri)?;
                let quality = best_variant
                    .height
                    .map(QualityTier::from_height)
                    .unwrap_or(QualityTier::Unknown);
                (quality, Some(variant_url))
            }
            Playlist::Media => (QualityTier::Unknown, None),
        };

        let segment_source = match &media_playlist_url {
            Some(url) => {
                let (media_playlist, _) = self.fetch_text(url).await?;
                first_segment(&media_playlist).map(|seg| (url.clone(), seg))
            }
            None => first_segment(&playlist).map(|seg| (episode_url.to_string(), seg)),
        };

        let load_speed = match segment_source {
            Some((base, segment)) => {
                let segment_url = resolve_url(&base, &segment)?;
                match self.time_segment(&segment_url).await {
                    Ok(speed) => speed,
                    Err(e) => {
                        warn!(url = %segment_url, error = %e, "segment download failed");
                        LoadSpeed::Unknown
                    }
                }
            }
            None => {
                return Err(ProbeError::NoSegment {
                    url: episode_url.to_string(),
                })
            }
        };

        debug!(
            url = %episode_url,
            quality = %quality,
            speed = %load_speed,
            ping_ms = ping_time_ms,
            "probe complete"
        );

        Ok(Measurement {
            quality,
            load_speed,
            ping_time_ms,
        })
    }
}

struct Variant {
    uri: String,
    height: Option<u32>,
}

enum Playlist {
    Master { best_variant: Variant },
    Media,
}

/// Classify a playlist and, for master playlists, pick the variant with the
/// largest advertised resolution.
fn parse_playlist(text: &str) -> Playlist {
    let mut best: Option<Variant> = None;
    let mut pending_height: Option<Option<u32>> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.starts_with("#EXT-X-STREAM-INF") {
            pending_height = Some(parse_resolution_height(line));
        } else if line.is_empty() || line.starts_with('#') {
            continue;
        } else if let Some(height) = pending_height.take() {
            let candidate = Variant {
                uri: line.to_string(),
                height,
            };
            let better = match &best {
                None => true,
                Some(current) => candidate.height.unwrap_or(0) > current.height.unwrap_or(0),
            };
            if better {
                best = Some(candidate);
            }
        }
    }

    match best {
        Some(best_variant) => Playlist::Master { best_variant },
        None => Playlist::Media,
    }
}

/// Extract the height from a `RESOLUTION=WxH` attribute, if present.
fn parse_resolution_height(stream_inf_line: &str) -> Option<u32> {
    let pos = stream_inf_line.find("RESOLUTION=")?;
    let rest = &stream_inf_line[pos + "RESOLUTION=".len()..];
    let dims = rest.split(',').next()?;
    let height_str = dims.split(['x', 'X']).nth(1)?;
    height_str.trim().parse().ok()
}

/// First media segment URI in a media playlist.
fn first_segment(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_string())
}

fn resolve_url(base: &str, reference: &str) -> Result<String, ProbeError> {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        return Ok(reference.to_string());
    }
    let base_url = reqwest::Url::parse(base).map_err(|_| ProbeError::InvalidUrl {
        url: base.to_string(),
    })?;
    let joined = base_url.join(reference).map_err(|_| ProbeError::InvalidUrl {
        url: reference.to_string(),
    })?;
    Ok(joined.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "#EXTM3U\n\
        #EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=1280x720\n\
        720/index.m3u8\n\
        #EXT-X-STREAM-INF:BANDWIDTH=2500000,RESOLUTION=1920x1080\n\
        1080/index.m3u8\n";

    const MEDIA: &str = "#EXTM3U\n\
        #EXT-X-TARGETDURATION:6\n\
        #EXTINF:5.96,\n\
        seg-00001.ts\n\
        #EXTINF:5.96,\n\
        seg-00002.ts\n";

    #[test]
    fn master_playlist_picks_largest_variant() {
        match parse_playlist(MASTER) {
            Playlist::Master { best_variant } => {
                assert_eq!(best_variant.uri, "1080/index.m3u8");
                assert_eq!(best_variant.height, Some(1080));
            }
            Playlist::Media => panic!("expected master playlist"),
        }
    }

    #[test]
    fn media_playlist_has_no_variants() {
        assert!(matches!(parse_playlist(MEDIA), Playlist::Media));
        assert_eq!(first_segment(MEDIA).as_deref(), Some("seg-00001.ts"));
    }

    #[test]
    fn resolution_attribute_parsing() {
        assert_eq!(
            parse_resolution_height("#EXT-X-STREAM-INF:RESOLUTION=3840x2160,CODECS=\"avc1\""),
            Some(2160)
        );
        assert_eq!(
            parse_resolution_height("#EXT-X-STREAM-INF:BANDWIDTH=800000"),
            None
        );
    }

    #[test]
    fn relative_urls_resolve_against_playlist() {
        let resolved = resolve_url("https://cdn.example.com/v/index.m3u8", "seg-1.ts").unwrap();
        assert_eq!(resolved, "https://cdn.example.com/v/seg-1.ts");

        let absolute =
            resolve_url("https://cdn.example.com/v/index.m3u8", "https://other/seg.ts").unwrap();
        assert_eq!(absolute, "https://other/seg.ts");
    }
}
