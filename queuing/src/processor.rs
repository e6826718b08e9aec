//! Processors described by their per-request service cost.

use crate::Error;
use serde::Serialize;
use std::time::Duration;

/// A single server that completes one request every `cost`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Processor {
    #[serde(serialize_with = "crate::serialize_nanos")]
    cost: Duration,
    throughput: f64,
}

impl Processor {
    /// Create a processor with the given service cost.
    ///
    /// The caller must ensure `cost` is non-zero (checked by [ProcessorSet::new]).
    fn new(cost: Duration) -> Self {
        Self {
            cost,
            throughput: 1.0 / cost.as_secs_f64(),
        }
    }

    /// Time required to complete one request.
    pub fn cost(&self) -> Duration {
        self.cost
    }

    /// Maximum completions per second when running in isolation.
    pub fn throughput(&self) -> f64 {
        self.throughput
    }
}

/// A non-empty, ordered pool of [Processor]s.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessorSet {
    processors: Vec<Processor>,
}

impl ProcessorSet {
    /// Build a pool from per-request service costs.
    ///
    /// Rejects an empty list and any zero cost.
    pub fn new(costs: &[Duration]) -> Result<Self, Error> {
        if costs.is_empty() {
            return Err(Error::NoProcessors);
        }
        let processors = costs
            .iter()
            .enumerate()
            .map(|(index, cost)| {
                if cost.is_zero() {
                    return Err(Error::ZeroCost(index));
                }
                Ok(Processor::new(*cost))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { processors })
    }

    /// Number of processors in the pool (always at least one).
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Always `false`: construction rejects empty pools.
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Iterate over processors in input order.
    pub fn iter(&self) -> impl Iterator<Item = &Processor> {
        self.processors.iter()
    }

    /// Returns the processors sorted by ascending cost (stable for equal costs).
    pub fn sorted(&self) -> Vec<Processor> {
        let mut processors = self.processors.clone();
        processors.sort_by_key(|processor| processor.cost);
        processors
    }
}
