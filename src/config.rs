//! TOML configuration for streamtriage.
//!
//! Layered: an explicit path beats the `STREAMTRIAGE_CONFIG` environment
//! variable, which beats the system location, which beats compiled-in
//! defaults. Scoring constants live here so deployments can tune the
//! selection policy without a rebuild.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::scoring::ScoringPolicy;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub scoring: ScoringPolicy,
    pub probe: ProbeConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl TriageConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Try to load configuration from, in order:
    /// 1. The path specified by the `STREAMTRIAGE_CONFIG` environment variable.
    /// 2. `/etc/streamtriage/streamtriage.toml`.
    /// 3. Fall back to compiled-in defaults.
    pub fn load_or_default() -> Self {
        if let Ok(env_path) = std::env::var("STREAMTRIAGE_CONFIG") {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "STREAMTRIAGE_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let system_path = Path::new("/etc/streamtriage/streamtriage.toml");
        if system_path.exists() {
            match Self::load(system_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %system_path.display(),
                        error = %e,
                        "system config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }
}

/// Probe behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Per-request timeout for probe traffic (seconds).
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// Persistence location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/streamtriage.db"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Filter built from the configured level alone.
    pub fn fallback_filter(&self) -> tracing_subscriber::EnvFilter {
        tracing_subscriber::EnvFilter::new(&self.level)
    }

    /// Filter for subscriber setup: `RUST_LOG` wins, the configured level
    /// is the fallback.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| self.fallback_filter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let cfg = TriageConfig::default();

        assert_eq!(cfg.scoring.quality_weight, 0.4);
        assert_eq!(cfg.scoring.speed_weight, 0.4);
        assert_eq!(cfg.scoring.latency_weight, 0.2);
        assert_eq!(cfg.scoring.unmeasured_speed_points, 30.0);
        assert_eq!(cfg.scoring.fallback_max_speed_kbps, 1024.0);

        assert_eq!(cfg.probe.timeout_secs, 10);
        assert_eq!(cfg.storage.db_path, PathBuf::from("data/streamtriage.db"));
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_parse_example_toml() {
        let toml_str = r#"
[scoring]
quality_weight = 0.5
speed_weight = 0.3
latency_weight = 0.2
unmeasured_speed_points = 25.0

[probe]
timeout_secs = 5

[storage]
db_path = "/var/lib/streamtriage/triage.db"

[logging]
level = "debug"
"#;

        let cfg: TriageConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(cfg.scoring.quality_weight, 0.5);
        assert_eq!(cfg.scoring.speed_weight, 0.3);
        assert_eq!(cfg.scoring.unmeasured_speed_points, 25.0);
        // Untouched fields keep their defaults.
        assert_eq!(cfg.scoring.fallback_max_speed_kbps, 1024.0);
        assert_eq!(cfg.probe.timeout_secs, 5);
        assert_eq!(
            cfg.storage.db_path,
            PathBuf::from("/var/lib/streamtriage/triage.db")
        );
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let cfg: TriageConfig = toml::from_str("").unwrap();
        let defaults = TriageConfig::default();

        assert_eq!(cfg.scoring.quality_weight, defaults.scoring.quality_weight);
        assert_eq!(cfg.probe.timeout_secs, defaults.probe.timeout_secs);
        assert_eq!(cfg.storage.db_path, defaults.storage.db_path);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("streamtriage.toml");
        std::fs::write(
            &path,
            r#"
[probe]
timeout_secs = 3
"#,
        )
        .unwrap();

        let cfg = TriageConfig::load(&path).unwrap();
        assert_eq!(cfg.probe.timeout_secs, 3);
    }

    #[test]
    fn test_configured_level_drives_the_filter_fallback() {
        let logging = LoggingConfig {
            level: "debug".to_string(),
        };
        assert_eq!(logging.fallback_filter().to_string(), "debug");

        let defaults = LoggingConfig::default();
        assert_eq!(defaults.fallback_filter().to_string(), "info");
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = TriageConfig::load(Path::new("/nonexistent/path/streamtriage.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let cfg = TriageConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let roundtripped: TriageConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(
            cfg.scoring.unmeasured_speed_points,
            roundtripped.scoring.unmeasured_speed_points
        );
        assert_eq!(cfg.probe.timeout_secs, roundtripped.probe.timeout_secs);
        assert_eq!(cfg.logging.level, roundtripped.logging.level);
    }
}
