use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use streamtriage::catalog;
use streamtriage::config::TriageConfig;
use streamtriage::player::skip::SkipConfig;
use streamtriage::probe::{HlsProbe, SpeedProbe};
use streamtriage::scoring::select_best;
use streamtriage::storage;

#[derive(Parser)]
#[command(
    name = "streamtriage",
    about = "Playback source triage and auto-selection for multi-source streaming",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file (overrides STREAMTRIAGE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon (HTTP API over selection and watch history)
    Serve {
        /// Bind address
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
    },

    /// Probe a candidate manifest and pick the best source
    Select {
        /// JSON manifest listing candidate sources
        #[arg(long)]
        manifest: PathBuf,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Measure a single stream URL
    Probe {
        /// Playlist URL to measure
        url: String,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Manage watch-progress records
    Records {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoriteAction,
    },

    /// Manage per-title skip-intro/outro configuration
    Skip {
        #[command(subcommand)]
        action: SkipConfigAction,
    },

    /// Manage the ad-filter toggle
    BlockAd {
        #[command(subcommand)]
        action: BlockAdAction,
    },
}

#[derive(Subcommand)]
enum BlockAdAction {
    /// Show the current ad-filter state
    Show,

    /// Enable ad filtering
    On,

    /// Disable ad filtering
    Off,
}

#[derive(Subcommand)]
enum RecordAction {
    /// List all watch-progress records
    List,

    /// Delete the record for a key (source+id)
    Delete {
        key: String,
    },
}

#[derive(Subcommand)]
enum FavoriteAction {
    /// List all favorites
    List,

    /// Remove a favorite by key (source+id)
    Remove {
        key: String,
    },
}

#[derive(Subcommand)]
enum SkipConfigAction {
    /// Show the skip configuration for a key
    Show {
        key: String,
    },

    /// Set the skip configuration for a key
    Set {
        key: String,

        /// Intro length in seconds
        #[arg(long, default_value = "0")]
        intro: f64,

        /// Outro length in seconds (from the end)
        #[arg(long, default_value = "0")]
        outro: f64,
    },

    /// Clear the skip configuration for a key
    Clear {
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => TriageConfig::load(path)?,
        None => TriageConfig::load_or_default(),
    };

    // Initialize tracing: RUST_LOG wins, the configured level is the fallback.
    tracing_subscriber::fmt()
        .with_env_filter(config.logging.env_filter())
        .init();

    match cli.command {
        Commands::Serve { bind } => {
            tracing::info!(%bind, "Starting streamtriage daemon");
            streamtriage::serve(&bind, config).await?;
        }
        Commands::Select { manifest, json } => {
            let candidates = catalog::load_manifest(&manifest)?;
            tracing::info!(candidates = candidates.len(), "Running source selection");

            let probe = HlsProbe::with_timeout(Duration::from_secs(config.probe.timeout_secs));
            let outcome = select_best(&candidates, &probe, &config.scoring).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("\nBest source: {} ({})", outcome.best.source_name, outcome.best.storage_key());
                if outcome.ranking.is_empty() {
                    println!("(no successful measurements; fell back to the first candidate)");
                } else {
                    println!("\n{:<4} | {:<20} | {:<8} | Measurement", "Rank", "Source", "Score");
                    println!("{:-<4}-|-{:-<20}-|-{:-<8}-|-{:-<30}", "", "", "", "");
                    for (position, ranked) in outcome.ranking.iter().enumerate() {
                        let detail = outcome
                            .measurements
                            .get(&ranked.key)
                            .map(|m| format!("{}, {}, {:.0}ms", m.quality, m.load_speed, m.ping_time_ms))
                            .unwrap_or_default();
                        println!(
                            "{:<4} | {:<20} | {:<8.2} | {}",
                            position + 1,
                            ranked.source_name,
                            ranked.score,
                            detail
                        );
                    }
                }
                println!();
            }
        }
        Commands::Probe { url, json } => {
            tracing::info!(%url, "Measuring stream");
            let probe = HlsProbe::with_timeout(Duration::from_secs(config.probe.timeout_secs));
            let measurement = probe.measure(&url).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&measurement)?);
            } else {
                println!("quality:    {}", measurement.quality);
                println!("load speed: {}", measurement.load_speed);
                println!("ping:       {:.0} ms", measurement.ping_time_ms);
            }
        }
        Commands::Records { action } => {
            let pool = storage::open_pool(&config.storage.db_path.display().to_string())?;
            match action {
                RecordAction::List => {
                    let records = storage::get_all_play_records(&pool)?;
                    if records.is_empty() {
                        println!("No watch-progress records.");
                    } else {
                        println!("{:<24} | {:<20} | {:<8} | Position", "Key", "Title", "Episode");
                        println!("{:-<24}-|-{:-<20}-|-{:-<8}-|-{:-<12}", "", "", "", "");
                        for (key, record) in records {
                            println!(
                                "{:<24} | {:<20} | {:<8} | {:.0}s / {:.0}s",
                                key,
                                record.title,
                                format!("{}/{}", record.index, record.total_episodes),
                                record.play_time,
                                record.total_time
                            );
                        }
                    }
                }
                RecordAction::Delete { key } => {
                    storage::delete_play_record(&pool, &key)?;
                    println!("Record '{}' deleted.", key);
                }
            }
        }
        Commands::Favorites { action } => {
            let pool = storage::open_pool(&config.storage.db_path.display().to_string())?;
            match action {
                FavoriteAction::List => {
                    let favorites = storage::get_all_favorites(&pool)?;
                    if favorites.is_empty() {
                        println!("No favorites.");
                    } else {
                        println!("{:<24} | {:<20} | Episodes", "Key", "Title");
                        println!("{:-<24}-|-{:-<20}-|-{:-<8}", "", "", "");
                        for (key, favorite) in favorites {
                            println!(
                                "{:<24} | {:<20} | {}",
                                key, favorite.title, favorite.total_episodes
                            );
                        }
                    }
                }
                FavoriteAction::Remove { key } => {
                    storage::delete_favorite(&pool, &key)?;
                    println!("Favorite '{}' removed.", key);
                }
            }
        }
        Commands::Skip { action } => {
            let pool = storage::open_pool(&config.storage.db_path.display().to_string())?;
            match action {
                SkipConfigAction::Show { key } => match storage::get_skip_config(&pool, &key)? {
                    Some(skip) => {
                        println!("enable: {}", skip.enable);
                        println!("intro:  {:.0}s", skip.intro_time);
                        println!("outro:  {:.0}s", skip.outro_time);
                    }
                    None => println!("No skip configuration for '{}'.", key),
                },
                SkipConfigAction::Set { key, intro, outro } => {
                    let skip = SkipConfig {
                        enable: true,
                        intro_time: intro,
                        outro_time: outro,
                    };
                    storage::save_skip_config(&pool, &key, &skip)?;
                    println!("Skip configuration for '{}' saved.", key);
                }
                SkipConfigAction::Clear { key } => {
                    storage::delete_skip_config(&pool, &key)?;
                    println!("Skip configuration for '{}' cleared.", key);
                }
            }
        }
        Commands::BlockAd { action } => {
            let pool = storage::open_pool(&config.storage.db_path.display().to_string())?;
            match action {
                BlockAdAction::Show => {
                    let enabled = storage::block_ad_enabled(&pool)?;
                    println!("Ad filtering is {}.", if enabled { "on" } else { "off" });
                }
                BlockAdAction::On => {
                    storage::set_block_ad(&pool, true)?;
                    println!("Ad filtering enabled.");
                }
                BlockAdAction::Off => {
                    storage::set_block_ad(&pool, false)?;
                    println!("Ad filtering disabled.");
                }
            }
        }
    }

    Ok(())
}
