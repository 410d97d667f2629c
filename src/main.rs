//! Location sequencer launcher.
//!
//! This binary runs one location attempt against the simulated platform described in the
//! `[simulation]` section of `config.toml`. For further development documentation, please refer
//! to the [`nearby_locator`](../nearby_locator/index.html) crate.
//!
//! ## Running the launcher
//!
//! Running the launcher is as simple as running `cargo run` in the crate directory. The simulated
//! user will:
//!
//! * turn the missing setting on, leave it as it is, or refuse to open the settings screen,
//!   depending on the `remediation` option (`"enable"`, `"ignore"` or `"decline"`),
//! * press "OK" on the permission rationale if `show_rationale` is set,
//! * answer the permission dialog with the configured `grants`,
//! * report the configured `fix`, or no location at all if it is missing.
//!
//! The launcher stops after `max_rounds` answers, which is what happens with `"ignore"`, since
//! the settings screen is offered again every time the user comes back.

use std::process;

use colored::Colorize;
use tracing::{info, warn};

use nearby_locator::{
    error::Acquisition,
    init_loggers,
    location::{Fix, LocationCache},
    logic::State,
    platform::ResultConsumer,
    print_system_failure, run, CONFIG,
};

/// Presenter that prints the outcome to the console.
#[derive(Debug, Clone, Copy)]
struct ConsolePresenter;

impl ResultConsumer for ConsolePresenter {
    fn on_location_ready(&mut self, fix: Fix) {
        println!("{} {}", "Location ready.".green().bold(), fix);
    }

    fn on_location_unavailable(&mut self, reason: Acquisition) {
        println!("{} {}", "Location unavailable:".yellow().bold(), reason);
    }
}

/// Program entry point.
///
/// This function will initialize configuration, initialize loggers and run the location sequence
/// by calling [`nearby_locator::run()`](../nearby_locator/fn.run.html).
pub fn main() {
    if CONFIG.debug() {
        println!("Debug mode active");
    }
    if let Err(e) = init_loggers(&CONFIG) {
        print_system_failure(&e, "Error initializing loggers");
        process::exit(1);
    }
    info!("Nearby locator {} starting", env!("CARGO_PKG_VERSION"));

    let cache = LocationCache::new();
    match run(&CONFIG, cache.clone(), ConsolePresenter) {
        Ok((State::Abandoned, _)) => {
            warn!("The user declined to change the settings.");
            println!("{}", "Settings not changed, nothing to show.".yellow());
        }
        Ok((state, _)) => {
            info!("Finished in state {}.", state);
            if let Some(fix) = cache.current() {
                info!("Current location: {}", fix);
            }
        }
        Err(e) => {
            print_system_failure(&e, "Error running the location sequence");
            process::exit(1);
        }
    }
}
