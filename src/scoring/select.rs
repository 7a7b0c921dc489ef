//! Candidate selection: probe, score, pick the best source.
//!
//! Probing is split into two sequential batches (concurrent inside each
//! batch) to cap simultaneous outstanding requests. A failed probe only
//! shrinks the candidate pool; the round itself never fails for probe-level
//! reasons. When every probe fails, selection degrades to the first
//! candidate in the original list.

use std::collections::HashMap;

use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::{compute_score, RoundStats, ScoringPolicy};
use crate::catalog::MediaSource;
use crate::probe::{Measurement, SpeedProbe};

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("no candidate sources to select from")]
    NoCandidates,
}

/// One scored candidate, keyed like the measurement map.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub key: String,
    pub source_name: String,
    pub score: f64,
}

/// Result of one selection round.
///
/// The measurement map includes every candidate whose probe succeeded
/// (failed probes are simply absent) and is handed onward so episode
/// pickers can display speeds without re-probing.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionOutcome {
    pub best: MediaSource,
    pub measurements: HashMap<String, Measurement>,
    pub ranking: Vec<RankedCandidate>,
}

/// Probe all candidates and return the highest-scoring one.
///
/// A single candidate is returned as-is without any probing. `Err` is only
/// possible for an empty candidate list.
pub async fn select_best(
    sources: &[MediaSource],
    probe: &dyn SpeedProbe,
    policy: &ScoringPolicy,
) -> Result<SelectionOutcome, SelectError> {
    let first = sources.first().ok_or(SelectError::NoCandidates)?;

    if sources.len() == 1 {
        return Ok(SelectionOutcome {
            best: first.clone(),
            measurements: HashMap::new(),
            ranking: Vec::new(),
        });
    }

    let round_id = uuid::Uuid::new_v4();
    info!(%round_id, candidates = sources.len(), "starting selection round");

    // Two batches: first gets the ceiling half.
    let batch_size = sources.len().div_ceil(2);
    let mut successes: Vec<(&MediaSource, Measurement)> = Vec::new();

    for batch in sources.chunks(batch_size) {
        let probes = batch.iter().map(|source| async move {
            let url = match source.probe_url() {
                Some(url) => url,
                None => {
                    warn!(source = %source.source_name, "source has no playable episodes");
                    return None;
                }
            };
            match probe.measure(url).await {
                Ok(measurement) => Some((source, measurement)),
                Err(e) => {
                    warn!(source = %source.source_name, error = %e, "probe failed");
                    None
                }
            }
        });
        successes.extend(join_all(probes).await.into_iter().flatten());
    }

    let measurements: HashMap<String, Measurement> = successes
        .iter()
        .map(|(source, m)| (source.storage_key(), m.clone()))
        .collect();

    if successes.is_empty() {
        warn!(%round_id, "all probes failed, falling back to first candidate");
        return Ok(SelectionOutcome {
            best: first.clone(),
            measurements,
            ranking: Vec::new(),
        });
    }

    // Normalization bounds come from this round's successes only.
    let stats = RoundStats::from_measurements(successes.iter().map(|(_, m)| m), policy);

    let mut ranked: Vec<(&MediaSource, f64)> = successes
        .iter()
        .map(|(source, m)| (*source, compute_score(m, &stats, policy)))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    for (position, (source, score)) in ranked.iter().enumerate() {
        info!(
            %round_id,
            rank = position + 1,
            source = %source.source_name,
            score,
            "candidate scored"
        );
    }

    let ranking = ranked
        .iter()
        .map(|(source, score)| RankedCandidate {
            key: source.storage_key(),
            source_name: source.source_name.clone(),
            score: *score,
        })
        .collect();

    // Non-empty by construction: successes was checked above.
    let best = ranked[0].0.clone();

    Ok(SelectionOutcome {
        best,
        measurements,
        ranking,
    })
}
