//! Estimate pool capacity and simulate closed queueing networks.
//!
//! A pool is described by the time each processor needs to complete one request
//! ([processor::ProcessorSet]). Two independent analyses run over a pool:
//!
//! * [estimator] splits a target request rate evenly across the pool and reports, per
//!   processor, the bounds of its assigned load and the portion it cannot absorb.
//! * [simulator] runs a fixed population of users against the pool with round-robin
//!   dispatch and reports completions for every simulated second.
//!
//! Both return plain data; rendering is left to the caller.

use serde::Serializer;
use std::time::Duration;
use thiserror::Error;

pub mod estimator;
pub mod processor;
pub mod simulator;

pub use estimator::{Backlog, CapacityReport};
pub use processor::{Processor, ProcessorSet};
pub use simulator::{Simulator, Snapshot, Timeline, UnitSample};

/// Errors that can occur when estimating or simulating a pool.
#[derive(Error, Debug)]
pub enum Error {
    #[error("at least one processor is required")]
    NoProcessors,
    #[error("processor {0} has a zero service cost")]
    ZeroCost(usize),
    #[error("invalid target rate: {0}")]
    InvalidRate(f64),
    #[error("no pending event while users are circulating")]
    NoPendingEvent,
}

impl Error {
    /// Returns `true` if the error was caused by caller-provided input rather than
    /// an internal scheduling fault.
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, Error::NoPendingEvent)
    }
}

/// Estimate the load on each processor when `target_rate` requests per second are
/// split evenly across processors with the given service `costs`.
pub fn estimate_capacity(
    costs: &[Duration],
    target_rate: f64,
) -> Result<Vec<CapacityReport>, Error> {
    let processors = ProcessorSet::new(costs)?;
    estimator::estimate(&processors, target_rate)
}

/// Simulate `users` circulating requests over processors with the given service
/// `costs` for every whole second in `duration`.
pub fn simulate(costs: &[Duration], users: u64, duration: Duration) -> Result<Timeline, Error> {
    let processors = ProcessorSet::new(costs)?;
    Simulator::new(&processors, users).run(duration)
}

/// Serialize a [Duration] as whole nanoseconds.
///
/// Every duration in a serialized report or timeline uses this encoding.
pub fn serialize_nanos<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
}
