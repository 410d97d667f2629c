//! Nearby places location acquisition.
//!
//! Before the nearby places screen can search for anything it needs the user's location. This
//! crate implements the sequence that gets it: check that the location provider is on and that
//! there is network connectivity, send the user to the relevant settings screen when one of them
//! is missing, ask for the location permission (explaining why first if the platform asks for it),
//! fetch the last known location and hand the outcome to the results presenter, exactly once per
//! attempt.
//!
//! ## Structure
//!
//! * [`logic`]: the explicit state machine, a pure transition function over [`logic::State`].
//! * [`sequencer`]: the driver that runs the state machine against a [`platform::Platform`].
//! * [`platform`]: the collaborator traits and the [`platform::Callback`] answer channel.
//! * [`location`]: the [`location::Fix`] value and the shared [`location::LocationCache`].
//! * [`simulation`]: a scripted platform, used by the launcher and the tests.
//!
//! ## Configuration
//!
//! Messages and the simulated environment are read from `config.toml`. Please refer to the
//! [`config`](config/index.html) module for further information.
//!
//! ## Launcher
//!
//! The project has a launcher in `src/main.rs` that runs one acquisition against the simulated
//! platform. It can be launched by running `cargo run`.

#![deny(clippy::all)]
#![forbid(anonymous_parameters)]
#![warn(clippy::pedantic)]
#![deny(
    unused_results,
    unused_qualifications,
    unused_import_braces,
    unsafe_code,
    trivial_numeric_casts,
    trivial_casts,
    missing_docs,
    missing_debug_implementations,
    unused_extern_crates
)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

/// Configuration file.
pub const CONFIG_FILE: &str = "config.toml";
/// Log directory, in the `data` directory.
pub const LOG_DIR: &str = "logs";

pub mod config;
pub mod error;
pub mod location;
pub mod logic;
pub mod platform;
pub mod sequencer;
pub mod simulation;

use std::{
    fmt::Write as _,
    fs::{self, File},
    sync::Mutex,
};

use anyhow::{Context, Error};
use chrono::Utc;
use colored::Colorize;

pub use crate::config::CONFIG;
use crate::{
    config::Config,
    location::LocationCache,
    logic::State,
    platform::ResultConsumer,
    sequencer::Sequencer,
    simulation::SimulatedPlatform,
};

/// Runs one acquisition against the simulated platform described in the configuration.
///
/// The simulated user answers one callback per round. Returns the final state together with the
/// consumer once the attempt is delivered or abandoned.
pub fn run<C>(config: &Config, cache: LocationCache, consumer: C) -> Result<(State, C), Error>
where
    C: ResultConsumer,
{
    let simulation = config.simulation().ok_or(error::Launch::NoSimulation)?;
    let platform = SimulatedPlatform::from_simulation(simulation, Utc::now())
        .context("invalid simulated location")?;

    let mut sequencer = Sequencer::new(platform, consumer, cache, config.messages().clone());
    let _ = sequencer.start();

    let mut rounds = 0;
    while !sequencer.state().is_terminal() {
        if rounds == simulation.max_rounds() {
            return Err(error::Launch::TooManyRounds { rounds }.into());
        }
        if !sequencer.platform_mut().resolve_next() {
            return Err(error::Launch::Stalled {
                state: sequencer.state().as_str(),
            }
            .into());
        }
        let _ = sequencer.pump();
        rounds += 1;
    }

    let state = sequencer.state().clone();
    let (_, consumer) = sequencer.into_parts();
    Ok((state, consumer))
}

/// Generates a string with an error and all its causes.
pub fn generate_error_string<S>(error: &Error, main_error: S) -> String
where
    S: AsRef<str>,
{
    let mut result = format!("{}:\n{}\n", main_error.as_ref(), error);

    for e in error.chain().skip(1) {
        let _ = writeln!(result, "\tcaused by: {e}");
    }

    result
}

/// Prints a system failure to the standard error output.
pub fn print_system_failure<S>(error: &Error, main_error: S)
where
    S: AsRef<str>,
{
    eprintln!("{}", generate_error_string(error, main_error).red());
}

/// Initializes all loggers.
///
/// Logs go both to the console and to `<data_dir>/logs/main-<timestamp>.log`. Debug mode enables
/// trace level logging.
pub fn init_loggers(config: &Config) -> Result<(), Error> {
    use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

    let log_dir = config.data_dir().join(LOG_DIR);
    fs::create_dir_all(&log_dir).context(error::Log::DirectoryCreation {
        path: log_dir.clone(),
    })?;

    let now = Utc::now().format("%Y-%m-%d-%H-%M-%S");
    let main = File::create(log_dir.join(format!("main-{now}.log")))
        .context(error::Log::Appender { name: "main" })?;

    let level = if config.debug() {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };

    tracing_subscriber::registry()
        .with(level)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(main)))
        .try_init()
        .context(error::Log::Init)?;

    Ok(())
}
