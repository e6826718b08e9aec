//! Queuing CLI

use clap::{builder::PossibleValuesParser, Arg, ArgAction, ArgMatches, Command};
use queuing_cli::{
    calc,
    config::{Calc, Scenario, Sim},
    crate_version,
    render::Format,
    sim, Error, CALC_CMD, SIM_CMD,
};
use std::{io::IsTerminal, path::PathBuf, process::ExitCode, time::Duration};
use tracing::{debug, error};

/// Flag for verbose output
const VERBOSE_FLAG: &str = "verbose";

/// Entrypoint for the Queuing CLI
fn main() -> ExitCode {
    // Define application
    let matches = Command::new("queuing")
        .version(crate_version())
        .about("Estimate capacity and simulate closed queueing networks.")
        .arg(
            Arg::new(VERBOSE_FLAG)
                .short('v')
                .long(VERBOSE_FLAG)
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("costs")
                .short('c')
                .long("costs")
                .global(true)
                .value_delimiter(',')
                .help("Time each processor needs to complete one request (e.g. 10ms,20ms)")
                .value_parser(humantime::parse_duration),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("Path to YAML scenario file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .global(true)
                .default_value("json")
                .help("Output format")
                .value_parser(PossibleValuesParser::new(Format::NAMES)),
        )
        .subcommand(
            Command::new(CALC_CMD)
                .about("Estimate the load each processor cannot absorb when a target rate is split evenly.")
                .arg(
                    Arg::new("qps")
                        .short('q')
                        .long("qps")
                        .help("Target aggregate requests per second (default: 100)")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("horizon")
                        .long("horizon")
                        .help("Report the backlog accumulated over this duration")
                        .value_parser(humantime::parse_duration),
                ),
        )
        .subcommand(
            Command::new(SIM_CMD)
                .about("Simulate a fixed population of users issuing requests round-robin.")
                .arg(
                    Arg::new("users")
                        .short('u')
                        .long("users")
                        .help("Number of circulating users (default: 10)")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("duration")
                        .short('d')
                        .long("duration")
                        .help("Simulated time, reported per whole second (default: 1s)")
                        .value_parser(humantime::parse_duration),
                ),
        )
        .get_matches();

    // Create logger
    let level = if matches.get_flag(VERBOSE_FLAG) {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    colored::control::set_override(std::io::stdout().is_terminal());

    // Parse subcommands
    let result = match matches.subcommand() {
        Some((CALC_CMD, matches)) => run_calc(matches),
        Some((SIM_CMD, matches)) => run_sim(matches),
        Some((cmd, _)) => {
            error!(cmd, "invalid subcommand");
            return ExitCode::FAILURE;
        }
        None => {
            error!("no subcommand provided");
            return ExitCode::FAILURE;
        }
    };
    match result {
        Ok(output) => {
            println!("{}", output.trim_end());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

/// Load the scenario file, if one was provided.
fn scenario(matches: &ArgMatches) -> Result<Scenario, Error> {
    let Some(path) = matches.get_one::<PathBuf>("config") else {
        return Ok(Scenario::default());
    };
    debug!(path = %path.display(), "loading scenario");
    Scenario::load(path)
}

fn costs(matches: &ArgMatches) -> Option<Vec<Duration>> {
    matches
        .get_many::<Duration>("costs")
        .map(|costs| costs.copied().collect())
}

fn format(matches: &ArgMatches) -> Format {
    matches
        .get_one::<String>("format")
        .and_then(|format| format.parse().ok())
        .unwrap_or(Format::Json)
}

fn run_calc(matches: &ArgMatches) -> Result<String, Error> {
    let settings = Calc::resolve(
        costs(matches),
        matches.get_one::<f64>("qps").copied(),
        matches.get_one::<Duration>("horizon").copied(),
        &scenario(matches)?,
    )?;
    debug!(?settings, "estimating capacity");
    calc(&settings, format(matches))
}

fn run_sim(matches: &ArgMatches) -> Result<String, Error> {
    let settings = Sim::resolve(
        costs(matches),
        matches.get_one::<u64>("users").copied(),
        matches.get_one::<Duration>("duration").copied(),
        &scenario(matches)?,
    )?;
    debug!(?settings, "simulating");
    sim(&settings, format(matches))
}
