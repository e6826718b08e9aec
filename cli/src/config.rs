//! Scenario files and the settings resolved from them.
//!
//! A scenario is a YAML file describing a pool and the parameters of each analysis:
//!
//! ```yaml
//! costs: [10ms, 20ms, 1s]
//! calc:
//!   qps: 250
//!   horizon: 1m
//! sim:
//!   users: 32
//!   duration: 30s
//! ```
//!
//! Values given on the command line take precedence over the file, and anything left
//! unset falls back to the defaults below.

use crate::Error;
use humantime_serde::Serde;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Default target rate for `calc` (requests per second).
pub const DEFAULT_QPS: f64 = 100.0;

/// Default population for `sim`.
pub const DEFAULT_USERS: u64 = 10;

/// Default simulated time for `sim`.
pub const DEFAULT_DURATION: Duration = Duration::from_secs(1);

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CalcConfig {
    #[serde(default)]
    pub qps: Option<f64>,
    #[serde(with = "humantime_serde", default)]
    pub horizon: Option<Duration>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    #[serde(default)]
    pub users: Option<u64>,
    #[serde(with = "humantime_serde", default)]
    pub duration: Option<Duration>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub costs: Vec<Serde<Duration>>,
    #[serde(default)]
    pub calc: CalcConfig,
    #[serde(default)]
    pub sim: SimConfig,
}

impl Scenario {
    /// Read a scenario from a YAML file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a scenario from YAML.
    pub fn parse(content: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Service costs listed in the scenario.
    pub fn costs(&self) -> Vec<Duration> {
        self.costs.iter().map(|cost| **cost).collect()
    }
}

/// Settings for a capacity estimate.
#[derive(Clone, Debug, PartialEq)]
pub struct Calc {
    pub costs: Vec<Duration>,
    pub qps: f64,
    pub horizon: Option<Duration>,
}

/// Settings for a simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct Sim {
    pub costs: Vec<Duration>,
    pub users: u64,
    pub duration: Duration,
}

/// Pick the command-line costs if present, else the scenario's.
fn resolve_costs(
    flag: Option<Vec<Duration>>,
    scenario: &Scenario,
) -> Result<Vec<Duration>, Error> {
    let costs = flag.unwrap_or_else(|| scenario.costs());
    if costs.is_empty() {
        return Err(Error::MissingCosts);
    }
    Ok(costs)
}

impl Calc {
    pub fn resolve(
        costs: Option<Vec<Duration>>,
        qps: Option<f64>,
        horizon: Option<Duration>,
        scenario: &Scenario,
    ) -> Result<Self, Error> {
        Ok(Self {
            costs: resolve_costs(costs, scenario)?,
            qps: qps.or(scenario.calc.qps).unwrap_or(DEFAULT_QPS),
            horizon: horizon.or(scenario.calc.horizon),
        })
    }
}

impl Sim {
    pub fn resolve(
        costs: Option<Vec<Duration>>,
        users: Option<u64>,
        duration: Option<Duration>,
        scenario: &Scenario,
    ) -> Result<Self, Error> {
        Ok(Self {
            costs: resolve_costs(costs, scenario)?,
            users: users.or(scenario.sim.users).unwrap_or(DEFAULT_USERS),
            duration: duration
                .or(scenario.sim.duration)
                .unwrap_or(DEFAULT_DURATION),
        })
    }
}
