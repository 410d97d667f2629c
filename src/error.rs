//! Error module.

use std::path::PathBuf;

use thiserror::Error;

/// Reasons why a location attempt did not produce a fix straight away.
///
/// `ProviderDisabled` and `NetworkUnavailable` send the user to a settings screen, while
/// `PermissionDenied` and `LocationUnavailable` end the attempt with an explicit "no location"
/// delivery. None of them is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Acquisition {
    /// The location permission was not granted.
    #[error("the location permission was denied")]
    PermissionDenied,
    /// The platform did not have a last known location.
    #[error("no last known location was available")]
    LocationUnavailable,
    /// The location provider is switched off.
    #[error("the location provider is disabled")]
    ProviderDisabled,
    /// There is no active network connection.
    #[error("there is no network connectivity")]
    NetworkUnavailable,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum Config {
    /// Error opening the configuration file.
    #[error("error opening the config file at {}", path.display())]
    Open {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Error reading the configuration file.
    #[error("error reading the config file at {}", path.display())]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Invalid TOML in the configuration file.
    #[error("invalid TOML in the config file at {}", path.display())]
    InvalidToml {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// Invalid configuration options.
    #[error("the configuration is invalid:\n{errors}")]
    Invalid {
        /// One line per violated option.
        errors: String,
    },
}

/// Logging errors.
#[derive(Debug, Error)]
pub enum Log {
    /// Error creating the log directory.
    #[error("could not create log directory '{}'", path.display())]
    DirectoryCreation {
        /// Path of the directory.
        path: PathBuf,
    },
    /// Error creating a log file.
    #[error("could not create the {name} log file")]
    Appender {
        /// Name of the log.
        name: &'static str,
    },
    /// Error installing the global subscriber.
    #[error("could not install the global log subscriber")]
    Init,
}

/// Invalid location fixes.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Fix {
    /// Latitude out of the `[-90, 90]` range or not finite.
    #[error("invalid latitude {latitude}")]
    InvalidLatitude {
        /// Offending latitude, in degrees.
        latitude: f64,
    },
    /// Longitude out of the `[-180, 180]` range or not finite.
    #[error("invalid longitude {longitude}")]
    InvalidLongitude {
        /// Offending longitude, in degrees.
        longitude: f64,
    },
}

/// Launcher errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Launch {
    /// The configuration has no `[simulation]` section.
    #[error("the configuration has no [simulation] section")]
    NoSimulation,
    /// The simulated platform ran out of callbacks before the attempt finished.
    #[error("the acquisition stalled in state {state}")]
    Stalled {
        /// Name of the state the sequencer was left in.
        state: &'static str,
    },
    /// The attempt did not finish in the configured number of rounds.
    #[error("the acquisition did not finish after {rounds} rounds")]
    TooManyRounds {
        /// Number of rounds that were run.
        rounds: u32,
    },
}
