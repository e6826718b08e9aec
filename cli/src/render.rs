//! Render estimates and timelines as JSON or text.

use crate::Error;
use colored::Colorize;
use queuing::{Backlog, CapacityReport, Snapshot};
use serde::{Serialize, Serializer};
use std::{fmt::Write, str::FromStr, time::Duration};

/// Output format selected on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Text,
}

impl Format {
    pub const NAMES: [&'static str; 2] = ["json", "text"];
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Format::Json),
            "text" => Ok(Format::Text),
            other => Err(format!("unknown format: {other}")),
        }
    }
}

/// Capacity estimate of one processor, as rendered.
#[derive(Serialize)]
pub struct ProcessorEstimate<'a> {
    #[serde(serialize_with = "queuing::serialize_nanos")]
    pub cost: Duration,
    #[serde(flatten)]
    pub report: &'a CapacityReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backlog: Option<Backlog>,
}

/// Result of the `calc` command.
#[derive(Serialize)]
pub struct Estimate<'a> {
    pub qps: f64,
    #[serde(
        serialize_with = "serialize_horizon",
        skip_serializing_if = "Option::is_none"
    )]
    pub horizon: Option<Duration>,
    pub processors: Vec<ProcessorEstimate<'a>>,
}

impl<'a> Estimate<'a> {
    /// Pair each report with the service cost it was estimated from.
    pub fn new(
        costs: &[Duration],
        reports: &'a [CapacityReport],
        qps: f64,
        horizon: Option<Duration>,
    ) -> Self {
        let processors = costs
            .iter()
            .zip(reports)
            .map(|(cost, report)| ProcessorEstimate {
                cost: *cost,
                report,
                backlog: horizon.map(|horizon| report.backlog(horizon)),
            })
            .collect();
        Self {
            qps,
            horizon,
            processors,
        }
    }
}

fn serialize_horizon<S: Serializer>(
    horizon: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match horizon {
        Some(horizon) => queuing::serialize_nanos(horizon, serializer),
        None => serializer.serialize_none(),
    }
}

/// Result of the `sim` command.
#[derive(Serialize)]
pub struct Simulation<'a> {
    pub users: u64,
    pub timeline: &'a [Snapshot],
}

/// Serialize any result as pretty-printed JSON.
pub fn json<T: Serialize>(value: &T) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Render an estimate as one line per processor.
pub fn estimate_text(estimate: &Estimate<'_>) -> String {
    let mut out = String::new();
    let header = match estimate.horizon {
        Some(horizon) => format!(
            "qps: {} over {} across {} processors",
            estimate.qps,
            humantime::format_duration(horizon),
            estimate.processors.len()
        ),
        None => format!(
            "qps: {} across {} processors",
            estimate.qps,
            estimate.processors.len()
        ),
    };
    let _ = writeln!(out, "{}", header.bold().cyan());
    for (index, processor) in estimate.processors.iter().enumerate() {
        let report = processor.report;
        let mut line = format!(
            "[{index}] cost: {} | tps: {:.2} | income: {}..{} | unhandled: {:.2}..{:.2}",
            humantime::format_duration(processor.cost),
            report.throughput,
            report.income_floor,
            report.income_ceiling,
            report.unhandled_floor,
            report.unhandled_ceiling,
        );
        if let Some(backlog) = processor.backlog {
            let _ = write!(
                line,
                " | backlog: {:.2}..{:.2}",
                backlog.floor, backlog.ceiling
            );
        }
        let line = if report.unhandled_ceiling > 0.0 {
            line.yellow()
        } else {
            line.green()
        };
        let _ = writeln!(out, "    {line}");
    }
    out
}

/// Render a timeline as one line per simulated second.
pub fn simulation_text(simulation: &Simulation<'_>) -> String {
    let mut out = String::new();
    let header = format!(
        "users: {} over {} seconds",
        simulation.users,
        simulation.timeline.len()
    );
    let _ = writeln!(out, "{}", header.bold().cyan());
    for snapshot in simulation.timeline {
        let line = format!(
            "[{}s] in_system: {} | completed: {}",
            snapshot.second, snapshot.in_system, snapshot.completed
        );
        let _ = writeln!(out, "    {}", line.blue());
        for unit in &snapshot.units {
            let line = format!(
                "[{}] depth: {} | completed: {}",
                humantime::format_duration(unit.cost),
                unit.depth,
                unit.completed
            );
            let _ = writeln!(out, "        {}", line.white());
        }
    }
    out
}
