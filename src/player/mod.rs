//! Player capability surface.
//!
//! The selection core never talks to a concrete player widget. Anything a
//! frontend must do on our behalf goes through [`PlayerBackend`].

pub mod skip;

use anyhow::Result;

/// Display aspect handling for the video element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectMode {
    /// Fit the container, keep the source ratio.
    Default,
    /// Fill the container, cropping as needed.
    Cover,
    /// Native resolution, no scaling.
    Original,
    Ratio16x9,
    Ratio21x9,
}

impl AspectMode {
    pub const ALL: [AspectMode; 5] = [
        AspectMode::Default,
        AspectMode::Cover,
        AspectMode::Original,
        AspectMode::Ratio16x9,
        AspectMode::Ratio21x9,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            AspectMode::Default => "default",
            AspectMode::Cover => "cover",
            AspectMode::Original => "original",
            AspectMode::Ratio16x9 => "16:9",
            AspectMode::Ratio21x9 => "21:9",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AspectMode::Default => "Fit (keep ratio)",
            AspectMode::Cover => "Fill screen (crop)",
            AspectMode::Original => "Native resolution",
            AspectMode::Ratio16x9 => "16:9",
            AspectMode::Ratio21x9 => "21:9",
        }
    }

    /// CSS `object-fit` value the frontend should apply to the video
    /// element, when one is needed for this mode.
    pub fn object_fit(&self) -> Option<&'static str> {
        match self {
            AspectMode::Default => Some("contain"),
            AspectMode::Cover => Some("cover"),
            AspectMode::Original => Some("initial"),
            AspectMode::Ratio16x9 | AspectMode::Ratio21x9 => None,
        }
    }

    /// Aspect-ratio string for players with a built-in ratio API.
    pub fn player_ratio(&self) -> &'static str {
        match self {
            AspectMode::Ratio16x9 => "16:9",
            AspectMode::Ratio21x9 => "21:9",
            _ => "default",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|mode| mode.key() == key)
    }
}

impl std::fmt::Display for AspectMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Minimal capability interface a hosting frontend implements.
#[async_trait::async_trait]
pub trait PlayerBackend: Send + Sync {
    /// Switch the display aspect mode.
    async fn set_aspect(&self, mode: AspectMode) -> Result<()>;

    /// Point the overlay plugin at a new commentary document.
    async fn load_overlay_track(&self, url: &str) -> Result<()>;

    /// Toggle stripping of injected ad segments from the stream.
    async fn set_ad_filter(&self, enabled: bool) -> Result<()>;

    /// Show a transient notice to the viewer.
    async fn notice(&self, message: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_roundtrip() {
        for mode in AspectMode::ALL {
            assert_eq!(AspectMode::parse(mode.key()), Some(mode));
        }
        assert_eq!(AspectMode::parse("4:3"), None);
    }

    #[test]
    fn ratio_modes_delegate_to_player() {
        assert_eq!(AspectMode::Ratio16x9.object_fit(), None);
        assert_eq!(AspectMode::Ratio16x9.player_ratio(), "16:9");
        assert_eq!(AspectMode::Cover.object_fit(), Some("cover"));
        assert_eq!(AspectMode::Cover.player_ratio(), "default");
    }
}
