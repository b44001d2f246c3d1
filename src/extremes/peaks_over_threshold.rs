//! Peaks-over-threshold extraction.
//!
//! Exceedances (above the threshold for high extremes, below it for low) are
//! grouped into clusters: an exceedance more than `window` after the previous
//! one starts a new cluster. Each cluster contributes its most extreme value.

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::domain::{ExtremesType, Signal};
use crate::error::EvaError;
use crate::extremes::more_extreme;

struct Cluster {
    peak: (NaiveDateTime, f64),
    last: NaiveDateTime,
}

pub fn extract(
    signal: &Signal,
    extremes_type: ExtremesType,
    threshold: f64,
    window: Duration,
) -> Result<Vec<(NaiveDateTime, f64)>, EvaError> {
    if !threshold.is_finite() {
        return Err(EvaError::InvalidParameter {
            parameter: "threshold",
            reason: format!("threshold must be finite, got {threshold}"),
        });
    }
    if window < Duration::zero() {
        return Err(EvaError::InvalidParameter {
            parameter: "r",
            reason: "declustering window must not be negative".to_string(),
        });
    }

    let exceeds = |v: f64| more_extreme(extremes_type, v, threshold);

    let mut events = Vec::new();
    let mut current: Option<Cluster> = None;
    let mut n_exceedances = 0usize;

    for (ts, v) in signal.iter().filter(|&(_, v)| exceeds(v)) {
        n_exceedances += 1;
        match current.as_mut() {
            Some(cluster) if ts - cluster.last <= window => {
                cluster.last = ts;
                if more_extreme(extremes_type, v, cluster.peak.1) {
                    cluster.peak = (ts, v);
                }
            }
            _ => {
                if let Some(done) = current.take() {
                    events.push(done.peak);
                }
                current = Some(Cluster {
                    peak: (ts, v),
                    last: ts,
                });
            }
        }
    }
    if let Some(done) = current {
        events.push(done.peak);
    }

    debug!(n_exceedances, clusters = events.len(), "declustered exceedances");
    Ok(events)
}
