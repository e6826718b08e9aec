//! Estimate capacity and simulate closed queueing networks from the command line.

use thiserror::Error;

pub mod config;
pub mod render;

use config::{Calc, Sim};
use render::{Estimate, Format, Simulation};

/// Returns the version of the crate.
pub const fn crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub const CALC_CMD: &str = "calc";
pub const SIM_CMD: &str = "sim";

/// Errors that can occur while running a command.
#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scenario: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("queuing error: {0}")]
    Queuing(#[from] queuing::Error),
    #[error("no service costs provided (use --costs or a scenario file)")]
    MissingCosts,
}

/// Run the `calc` command, returning the rendered estimate.
pub fn calc(settings: &Calc, format: Format) -> Result<String, Error> {
    let reports = queuing::estimate_capacity(&settings.costs, settings.qps)?;
    let estimate = Estimate::new(&settings.costs, &reports, settings.qps, settings.horizon);
    match format {
        Format::Json => render::json(&estimate),
        Format::Text => Ok(render::estimate_text(&estimate)),
    }
}

/// Run the `sim` command, returning the rendered timeline.
pub fn sim(settings: &Sim, format: Format) -> Result<String, Error> {
    let timeline = queuing::simulate(&settings.costs, settings.users, settings.duration)?;
    let simulation = Simulation {
        users: settings.users,
        timeline: &timeline,
    };
    match format {
        Format::Json => render::json(&simulation),
        Format::Text => Ok(render::simulation_text(&simulation)),
    }
}
