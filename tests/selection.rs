//! End-to-end selection rounds against a scripted probe.

use std::collections::HashMap;

use streamtriage::catalog::MediaSource;
use streamtriage::probe::{Measurement, ProbeError, SpeedProbe};
use streamtriage::scoring::{select_best, LoadSpeed, QualityTier, ScoringPolicy};

struct ScriptedProbe {
    results: HashMap<String, Measurement>,
}

#[async_trait::async_trait]
impl SpeedProbe for ScriptedProbe {
    async fn measure(&self, episode_url: &str) -> Result<Measurement, ProbeError> {
        self.results
            .get(episode_url)
            .cloned()
            .ok_or_else(|| ProbeError::EmptyPlaylist {
                url: episode_url.to_string(),
            })
    }
}

fn source(name: &str, episode_count: usize) -> MediaSource {
    MediaSource {
        source: name.to_string(),
        id: "1".to_string(),
        source_name: name.to_string(),
        title: "Example Show".to_string(),
        year: "2024".to_string(),
        cover: String::new(),
        douban_id: 0,
        episodes: (1..=episode_count)
            .map(|i| format!("http://{}/ep{}.m3u8", name, i))
            .collect(),
        episodes_titles: (1..=episode_count).map(|i| format!("第{}集", i)).collect(),
    }
}

fn measurement(quality: QualityTier, speed: LoadSpeed, ping: f64) -> Measurement {
    Measurement {
        quality,
        load_speed: speed,
        ping_time_ms: ping,
    }
}

#[tokio::test]
async fn five_way_round_ranks_all_successes() {
    // Five candidates probe in a batch of three then a batch of two; the
    // broken one just drops out of the ranking.
    let mut results = HashMap::new();
    results.insert(
        "http://alpha/ep2.m3u8".to_string(),
        measurement(QualityTier::FourK, LoadSpeed::KBps(4096.0), 80.0),
    );
    results.insert(
        "http://beta/ep2.m3u8".to_string(),
        measurement(QualityTier::P1080, LoadSpeed::KBps(2048.0), 120.0),
    );
    results.insert(
        "http://gamma/ep2.m3u8".to_string(),
        measurement(QualityTier::P720, LoadSpeed::Unknown, 300.0),
    );
    results.insert(
        "http://delta/ep2.m3u8".to_string(),
        measurement(QualityTier::Sd, LoadSpeed::KBps(256.0), 700.0),
    );
    let probe = ScriptedProbe { results };

    let sources = vec![
        source("alpha", 12),
        source("beta", 12),
        source("gamma", 12),
        source("broken", 12),
        source("delta", 12),
    ];

    let outcome = select_best(&sources, &probe, &ScoringPolicy::default())
        .await
        .unwrap();

    assert_eq!(outcome.best.source_name, "alpha");
    assert_eq!(outcome.ranking.len(), 4);
    assert_eq!(outcome.measurements.len(), 4);
    assert!(!outcome.measurements.contains_key("broken+1"));

    // Ranking is sorted descending.
    for pair in outcome.ranking.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    // The round winner scored the best speed and ping, so its score is the
    // full quality + speed + latency weight stack.
    assert_eq!(outcome.ranking[0].score, 100.0);
}

#[tokio::test]
async fn measurement_map_feeds_downstream_display() {
    let mut results = HashMap::new();
    results.insert(
        "http://alpha/ep2.m3u8".to_string(),
        measurement(QualityTier::P1080, LoadSpeed::KBps(1500.0), 90.0),
    );
    results.insert(
        "http://beta/ep2.m3u8".to_string(),
        measurement(QualityTier::P720, LoadSpeed::Measuring, 150.0),
    );
    let probe = ScriptedProbe { results };

    let sources = vec![source("alpha", 3), source("beta", 3)];
    let outcome = select_best(&sources, &probe, &ScoringPolicy::default())
        .await
        .unwrap();

    // Keys match the persistence convention so an episode picker can reuse
    // the measurements without re-probing.
    let alpha = &outcome.measurements["alpha+1"];
    assert_eq!(alpha.quality, QualityTier::P1080);
    let beta = &outcome.measurements["beta+1"];
    assert_eq!(beta.load_speed, LoadSpeed::Measuring);
}

#[tokio::test]
async fn degraded_round_still_yields_a_source() {
    let probe = ScriptedProbe {
        results: HashMap::new(),
    };
    let sources = vec![source("alpha", 2), source("beta", 2), source("gamma", 2)];

    let outcome = select_best(&sources, &probe, &ScoringPolicy::default())
        .await
        .unwrap();

    assert_eq!(outcome.best.source_name, "alpha");
    assert!(outcome.measurements.is_empty());
    assert!(outcome.ranking.is_empty());
}

#[tokio::test]
async fn sources_are_not_mutated_by_selection() {
    let mut results = HashMap::new();
    results.insert(
        "http://alpha/ep2.m3u8".to_string(),
        measurement(QualityTier::P1080, LoadSpeed::KBps(1500.0), 90.0),
    );
    let probe = ScriptedProbe { results };

    let sources = vec![source("alpha", 3), source("beta", 3)];
    let before = sources.clone();

    let _ = select_best(&sources, &probe, &ScoringPolicy::default())
        .await
        .unwrap();

    assert_eq!(sources, before);
}
