//! Discrete-event simulation of a closed queueing network.
//!
//! A fixed population of users each hold exactly one outstanding request. Requests are
//! dispatched round-robin across the processors, and every completed request is
//! immediately re-issued by its user, so the number of requests in the network never
//! changes. The simulation advances from one completion to the next and reports, for
//! each whole second, how many requests completed.
//!
//! # Example
//!
//! ```
//! use queuing::{processor::ProcessorSet, simulator::Simulator};
//! use std::time::Duration;
//!
//! let processors = ProcessorSet::new(&[Duration::from_millis(10)]).unwrap();
//! let mut simulator = Simulator::new(&processors, 1);
//! let timeline = simulator.run(Duration::from_secs(2)).unwrap();
//! assert_eq!(timeline.len(), 2);
//! assert_eq!(timeline[0].completed, 100);
//! ```

use crate::{processor::ProcessorSet, Error};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, trace};

mod unit;
use unit::Unit;

/// Reporting granularity of the simulation.
const SECOND: Duration = Duration::from_secs(1);

/// Upper bound on the snapshots reserved up front by [Simulator::run].
const MAX_RESERVED_SNAPSHOTS: u64 = 1 << 16;

/// State of one processor at the end of a simulated second.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnitSample {
    #[serde(serialize_with = "crate::serialize_nanos")]
    pub cost: Duration,
    pub depth: u64,
    pub completed: u64,
}

/// Activity observed during one simulated second.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Whole seconds elapsed since the simulator was created (starting at 1).
    pub second: u64,
    /// Requests resident in the network at the start of the second.
    pub in_system: u64,
    /// Requests completed during the second.
    pub completed: u64,
    /// Per-processor breakdown, fastest processor first.
    pub units: Vec<UnitSample>,
}

/// Snapshots for each whole second simulated, in order.
pub type Timeline = Vec<Snapshot>;

/// Cursor selecting the next unit to receive a request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct RoundRobin {
    next: usize,
}

impl RoundRobin {
    /// Assign `requests` to `units` units, returning how many each receives.
    ///
    /// Every unit gets an equal number of full rounds and the remainder is handed
    /// out one at a time starting from the cursor.
    fn assign(&mut self, requests: u64, units: usize) -> impl Iterator<Item = (usize, u64)> {
        let count = units as u64;
        let rounds = requests / count;
        let remainder = requests % count;
        let start = self.next as u64;
        self.next = ((start + remainder) % count) as usize;
        (0..units).filter_map(move |index| {
            let offset = (index as u64 + count - start) % count;
            let assigned = rounds + u64::from(offset < remainder);
            (assigned > 0).then_some((index, assigned))
        })
    }
}

/// A closed network of processors with a fixed population of users.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Simulator {
    units: Vec<Unit>,
    cursor: RoundRobin,
    users: u64,
    elapsed: u64,
}

impl Simulator {
    /// Create a simulator and seed it with one request per user.
    ///
    /// Processors are ordered by ascending cost before requests are dispatched.
    pub fn new(processors: &ProcessorSet, users: u64) -> Self {
        let units = processors
            .sorted()
            .iter()
            .map(|processor| Unit::new(processor.cost()))
            .collect();
        let mut simulator = Self {
            units,
            cursor: RoundRobin::default(),
            users,
            elapsed: 0,
        };
        simulator.dispatch(users);
        debug!(
            units = simulator.units.len(),
            users, "initialized simulator"
        );
        simulator
    }

    /// Number of circulating users.
    pub fn users(&self) -> u64 {
        self.users
    }

    /// Requests currently waiting or in service across all processors.
    pub fn in_system(&self) -> u64 {
        self.units.iter().map(Unit::depth).sum()
    }

    /// Simulate every whole second contained in `duration`.
    ///
    /// A trailing partial second is not simulated. Calling `run` again continues from
    /// where the previous call stopped.
    pub fn run(&mut self, duration: Duration) -> Result<Timeline, Error> {
        let seconds = duration.as_secs();
        debug!(seconds, users = self.users, "running simulation");

        let mut timeline = Vec::with_capacity(seconds.min(MAX_RESERVED_SNAPSHOTS) as usize);
        for _ in 0..seconds {
            let snapshot = self.second()?;
            trace!(
                second = snapshot.second,
                in_system = snapshot.in_system,
                completed = snapshot.completed,
                "simulated second"
            );
            timeline.push(snapshot);
        }
        Ok(timeline)
    }

    /// Simulate a single second.
    fn second(&mut self) -> Result<Snapshot, Error> {
        let in_system = self.in_system();
        let mut completed = 0;
        let mut left = SECOND;
        while !left.is_zero() {
            let step = self.next_event(left)?;
            let finished = self.advance(step);
            debug_assert_eq!(self.in_system() + finished, self.users);
            self.dispatch(finished);
            completed += finished;
            left -= step;
        }
        self.elapsed += 1;

        let units = self
            .units
            .iter_mut()
            .map(|unit| UnitSample {
                cost: unit.cost(),
                depth: unit.depth(),
                completed: unit.take_completed(),
            })
            .collect();
        Ok(Snapshot {
            second: self.elapsed,
            in_system,
            completed,
            units,
        })
    }

    /// Time until the next completion, capped at `left`.
    fn next_event(&self, left: Duration) -> Result<Duration, Error> {
        match self.units.iter().filter_map(Unit::remaining).min() {
            Some(next) => Ok(next.min(left)),
            // An empty network has nothing to schedule
            None if self.users == 0 => Ok(left),
            None => Err(Error::NoPendingEvent),
        }
    }

    /// Advance every busy unit by `step`, returning the number of completions.
    fn advance(&mut self, step: Duration) -> u64 {
        self.units
            .iter_mut()
            .map(|unit| u64::from(unit.advance(step)))
            .sum()
    }

    /// Hand out `requests` to units in round-robin order.
    fn dispatch(&mut self, requests: u64) {
        if requests == 0 {
            return;
        }
        for (index, assigned) in self.cursor.assign(requests, self.units.len()) {
            self.units[index].enqueue(assigned);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate;
    use commonware_macros::test_traced;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn pool(costs_ms: &[u64]) -> ProcessorSet {
        let costs: Vec<Duration> = costs_ms
            .iter()
            .copied()
            .map(Duration::from_millis)
            .collect();
        ProcessorSet::new(&costs).unwrap()
    }

    #[test]
    fn test_round_robin_assign() {
        let mut cursor = RoundRobin::default();
        let assigned: Vec<_> = cursor.assign(2, 3).collect();
        assert_eq!(assigned, vec![(0, 1), (1, 1)]);
        assert_eq!(cursor.next, 2);

        // Wraps around from the cursor
        let assigned: Vec<_> = cursor.assign(2, 3).collect();
        assert_eq!(assigned, vec![(0, 1), (2, 1)]);
        assert_eq!(cursor.next, 1);

        // Full rounds plus a remainder
        let assigned: Vec<_> = cursor.assign(7, 3).collect();
        assert_eq!(assigned, vec![(0, 2), (1, 3), (2, 2)]);
        assert_eq!(cursor.next, 2);
    }

    #[test]
    fn test_round_robin_matches_single_steps() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..200 {
            let units = rng.gen_range(1..=8);
            let mut bulk = RoundRobin {
                next: rng.gen_range(0..units),
            };
            let mut single = bulk.clone();
            let requests = rng.gen_range(0..50);

            let mut expected = vec![0; units];
            for _ in 0..requests {
                for (index, assigned) in single.assign(1, units) {
                    expected[index] += assigned;
                }
            }
            let mut actual = vec![0; units];
            for (index, assigned) in bulk.assign(requests, units) {
                actual[index] += assigned;
            }
            assert_eq!(actual, expected);
            assert_eq!(bulk, single);
        }
    }

    #[test]
    fn test_seeding() {
        let simulator = Simulator::new(&pool(&[30, 10, 20]), 5);
        let costs: Vec<Duration> = simulator.units.iter().map(Unit::cost).collect();
        assert_eq!(
            costs,
            vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(30)
            ]
        );
        let depths: Vec<u64> = simulator.units.iter().map(Unit::depth).collect();
        assert_eq!(depths, vec![2, 2, 1]);
        assert_eq!(simulator.in_system(), 5);
        assert_eq!(simulator.users(), 5);
    }

    #[test]
    fn test_initialization_deterministic() {
        let processors = pool(&[15, 5, 25, 5]);
        assert_eq!(
            Simulator::new(&processors, 11),
            Simulator::new(&processors, 11)
        );
    }

    #[test_traced]
    fn test_single_user() {
        let mut simulator = Simulator::new(&pool(&[10]), 1);
        let timeline = simulator.run(Duration::from_secs(1)).unwrap();
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].second, 1);
        assert_eq!(timeline[0].in_system, 1);
        assert_eq!(timeline[0].completed, 100);
        assert_eq!(
            timeline[0].units,
            vec![UnitSample {
                cost: Duration::from_millis(10),
                depth: 1,
                completed: 100,
            }]
        );
    }

    #[test]
    fn test_partial_second_dropped() {
        let mut simulator = Simulator::new(&pool(&[10]), 1);
        assert!(simulator.run(Duration::from_millis(999)).unwrap().is_empty());

        let timeline = simulator.run(Duration::from_millis(2_500)).unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[1].second, 2);
    }

    #[test]
    fn test_run_continues() {
        let mut simulator = Simulator::new(&pool(&[7, 13]), 3);
        let first = simulator.run(Duration::from_secs(2)).unwrap();
        let second = simulator.run(Duration::from_secs(2)).unwrap();
        assert_eq!(second[0].second, 3);

        // Two runs match one longer run
        let mut combined = first;
        combined.extend(second);
        let mut fresh = Simulator::new(&pool(&[7, 13]), 3);
        assert_eq!(fresh.run(Duration::from_secs(4)).unwrap(), combined);
    }

    #[test]
    fn test_idle_network() {
        let mut simulator = Simulator::new(&pool(&[10, 20]), 0);
        let timeline = simulator.run(Duration::from_secs(3)).unwrap();
        assert_eq!(timeline.len(), 3);
        for snapshot in timeline {
            assert_eq!(snapshot.in_system, 0);
            assert_eq!(snapshot.completed, 0);
            assert!(snapshot.units.iter().all(|unit| unit.depth == 0));
        }
    }

    #[test]
    fn test_zero_duration() {
        let mut simulator = Simulator::new(&pool(&[10]), 0);
        assert!(simulator.run(Duration::ZERO).unwrap().is_empty());
    }

    #[test]
    fn test_no_pending_event() {
        let mut simulator = Simulator::new(&pool(&[10]), 1);
        simulator.units[0].clear();

        let err = simulator.run(Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, Error::NoPendingEvent));
        assert!(!err.is_invalid_input());
    }

    #[test]
    fn test_parallel_units() {
        // Two users per unit, each unit completing every 10ms
        let mut simulator = Simulator::new(&pool(&[10, 10]), 4);
        let timeline = simulator.run(Duration::from_secs(2)).unwrap();
        for snapshot in timeline {
            assert_eq!(snapshot.in_system, 4);
            assert_eq!(snapshot.completed, 200);
        }
    }

    #[test]
    fn test_slow_unit_bottleneck() {
        // Round-robin sends half of all requests to the slow unit, capping the
        // network at twice the slow unit's throughput
        let mut simulator = Simulator::new(&pool(&[10, 20]), 100);
        let timeline = simulator.run(Duration::from_secs(10)).unwrap();
        let last = timeline.last().unwrap();
        assert!((95..=105).contains(&last.completed), "{}", last.completed);
        assert!(last.units[1].depth > last.units[0].depth);
        assert_eq!(last.units[0].depth + last.units[1].depth, 100);
    }

    #[test]
    fn test_conservation() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..50 {
            let costs: Vec<u64> = (0..rng.gen_range(1..=6))
                .map(|_| rng.gen_range(1..=300))
                .collect();
            let users = rng.gen_range(0..=40);
            let mut simulator = Simulator::new(&pool(&costs), users);

            // Step manually to observe requests between completion and re-dispatch
            let mut left = Duration::from_secs(3);
            while !left.is_zero() {
                let step = simulator.next_event(left).unwrap();
                let finished = simulator.advance(step);
                assert_eq!(simulator.in_system() + finished, users);
                for unit in &simulator.units {
                    assert!(unit.phase() < unit.cost());
                    if unit.depth() == 0 {
                        assert_eq!(unit.phase(), Duration::ZERO);
                    }
                }
                simulator.dispatch(finished);
                assert_eq!(simulator.in_system(), users);
                left -= step;
            }
        }
    }

    #[test]
    fn test_simulate_deterministic() {
        let costs = [
            Duration::from_millis(3),
            Duration::from_micros(4_500),
            Duration::from_millis(11),
        ];
        let first = simulate(&costs, 17, Duration::from_secs(5)).unwrap();
        let second = simulate(&costs, 17, Duration::from_secs(5)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }
}
