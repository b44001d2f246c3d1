//! Block maxima extraction.
//!
//! The record is cut into consecutive blocks `[t0 + k·bs, t0 + (k+1)·bs)`
//! starting at the first observation. Each block contributes its most extreme
//! observation, stamped with that observation's own timestamp.

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};

use crate::domain::{EmptyBlockPolicy, ExtremesType, Signal};
use crate::error::EvaError;
use crate::extremes::more_extreme;
use crate::math::mean;

/// A block's extreme, or the midpoint of a block to be filled by coercion.
enum Slot {
    Event(NaiveDateTime, f64),
    Empty(NaiveDateTime),
}

pub fn extract(
    signal: &Signal,
    extremes_type: ExtremesType,
    block_size: Duration,
    errors: EmptyBlockPolicy,
) -> Result<Vec<(NaiveDateTime, f64)>, EvaError> {
    if block_size <= Duration::zero() {
        return Err(EvaError::InvalidParameter {
            parameter: "block_size",
            reason: "block size must be positive".to_string(),
        });
    }

    let timestamps = signal.timestamps();
    let values = signal.values();
    let last = signal.last_timestamp();

    let mut slots = Vec::new();
    let mut empty_blocks = 0usize;
    let mut block_start = signal.first_timestamp();
    let mut i = 0usize;

    while block_start <= last {
        let block_end = block_start
            .checked_add_signed(block_size)
            .ok_or_else(|| EvaError::Internal("block end overflows the calendar".to_string()))?;

        let mut best: Option<(NaiveDateTime, f64)> = None;
        while i < timestamps.len() && timestamps[i] < block_end {
            let v = values[i];
            if best.is_none_or(|(_, b)| more_extreme(extremes_type, v, b)) {
                best = Some((timestamps[i], v));
            }
            i += 1;
        }

        match best {
            Some((ts, v)) => slots.push(Slot::Event(ts, v)),
            None => {
                empty_blocks += 1;
                match errors {
                    EmptyBlockPolicy::Raise => {
                        return Err(EvaError::EmptyBlock {
                            start: block_start,
                            end: block_end,
                        });
                    }
                    EmptyBlockPolicy::Ignore => {}
                    EmptyBlockPolicy::Coerce => slots.push(Slot::Empty(block_start + block_size / 2)),
                }
            }
        }

        block_start = block_end;
    }

    if empty_blocks > 0 {
        warn!(empty_blocks, policy = ?errors, "blocks without data encountered");
    }

    let found: Vec<f64> = slots
        .iter()
        .filter_map(|slot| match slot {
            Slot::Event(_, v) => Some(*v),
            Slot::Empty(_) => None,
        })
        .collect();
    let fill = mean(&found).unwrap_or(f64::NAN);

    let events: Vec<(NaiveDateTime, f64)> = slots
        .into_iter()
        .map(|slot| match slot {
            Slot::Event(ts, v) => (ts, v),
            Slot::Empty(mid) => (mid, fill),
        })
        .collect();

    debug!(blocks = events.len(), "block maxima extracted");
    Ok(events)
}
