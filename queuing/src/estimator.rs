//! Analytic capacity estimates for an evenly split request rate.
//!
//! Splitting an integer rate across `n` processors is generally not exact, so each
//! processor is assigned both the ceiling and the floor of its share. Comparing each
//! bound against the processor's throughput yields the rate at which its backlog grows.

use crate::{processor::ProcessorSet, Error};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Load assigned to one processor and the portion it cannot absorb.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CapacityReport {
    /// Maximum completions per second of the processor.
    pub throughput: f64,

    /// Upper bound of the requests per second assigned to the processor.
    pub income_ceiling: u64,
    /// Lower bound of the requests per second assigned to the processor.
    pub income_floor: u64,

    /// Backlog growth per second under `income_ceiling`.
    pub unhandled_ceiling: f64,
    /// Backlog growth per second under `income_floor`.
    pub unhandled_floor: f64,
}

/// Requests accumulated by a processor over some horizon.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Backlog {
    pub ceiling: f64,
    pub floor: f64,
}

impl CapacityReport {
    fn new(throughput: f64, share: f64) -> Self {
        let income_ceiling = share.ceil();
        let income_floor = share.floor();
        Self {
            throughput,
            income_ceiling: income_ceiling as u64,
            income_floor: income_floor as u64,
            unhandled_ceiling: (income_ceiling - throughput).max(0.0),
            unhandled_floor: (income_floor - throughput).max(0.0),
        }
    }

    /// Requests left unprocessed after `horizon` at a constant incoming rate.
    pub fn backlog(&self, horizon: Duration) -> Backlog {
        let seconds = horizon.as_secs_f64();
        Backlog {
            ceiling: self.unhandled_ceiling * seconds,
            floor: self.unhandled_floor * seconds,
        }
    }
}

/// Estimate per-processor load when `target_rate` requests per second are split
/// evenly across `processors`.
///
/// Reports are returned in the input order of `processors`. Every processor receives
/// the same share regardless of its own throughput.
pub fn estimate(
    processors: &ProcessorSet,
    target_rate: f64,
) -> Result<Vec<CapacityReport>, Error> {
    if !target_rate.is_finite() || target_rate < 0.0 {
        return Err(Error::InvalidRate(target_rate));
    }
    let peers = processors.len();
    let share = target_rate / peers as f64;

    // Income bounds must be representable as whole requests per second
    if share.ceil() >= u64::MAX as f64 {
        return Err(Error::InvalidRate(target_rate));
    }
    debug!(peers, target_rate, "estimating capacity");

    Ok(processors
        .iter()
        .map(|processor| CapacityReport::new(processor.throughput(), share))
        .collect())
}
