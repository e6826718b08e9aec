use std::time::Duration;

/// Simulation state of a single processor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unit {
    cost: Duration,

    /// Requests waiting or in service.
    depth: u64,

    /// Service time accumulated toward the request at the head of the queue.
    ///
    /// Always less than `cost` between steps and zero while the unit is idle.
    phase: Duration,

    /// Completions since the last call to [Unit::take_completed].
    completed: u64,
}

impl Unit {
    pub fn new(cost: Duration) -> Self {
        Self {
            cost,
            depth: 0,
            phase: Duration::ZERO,
            completed: 0,
        }
    }

    pub fn cost(&self) -> Duration {
        self.cost
    }

    pub fn depth(&self) -> u64 {
        self.depth
    }

    /// Add `requests` to the queue.
    pub fn enqueue(&mut self, requests: u64) {
        self.depth += requests;
    }

    /// Time until the request in service completes, if the unit is busy.
    pub fn remaining(&self) -> Option<Duration> {
        if self.depth == 0 {
            return None;
        }
        Some(self.cost - self.phase)
    }

    /// Spend `step` serving the head of the queue, returning whether it completed.
    ///
    /// `step` must not exceed [Unit::remaining].
    pub fn advance(&mut self, step: Duration) -> bool {
        if self.depth == 0 {
            return false;
        }
        self.phase += step;
        if self.phase < self.cost {
            return false;
        }
        self.depth -= 1;
        self.phase -= self.cost;
        debug_assert!(self.phase < self.cost, "unit overshot its service cost");
        if self.depth == 0 {
            self.phase = Duration::ZERO;
        }
        self.completed += 1;
        true
    }

    /// Return and reset the completion counter.
    pub fn take_completed(&mut self) -> u64 {
        std::mem::take(&mut self.completed)
    }

    #[cfg(test)]
    pub(super) fn phase(&self) -> Duration {
        self.phase
    }

    #[cfg(test)]
    pub(super) fn clear(&mut self) {
        self.depth = 0;
        self.phase = Duration::ZERO;
    }
}
