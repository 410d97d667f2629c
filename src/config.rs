//! Configuration module.
//!
//! The configuration lives in `config.toml`:
//!
//! ```toml
//! debug = true
//! data_dir = "data"
//!
//! [messages]
//! location_tracking_off = "Location tracking is turned off. Would you like to turn it on?"
//! wireless_off = "Wireless is turned off. Would you like to turn it on?"
//! location_required = "Access to your location is required to find nearby places."
//! location_permission = "Location permission was not granted."
//!
//! [simulation]
//! provider_enabled = false
//! connected = true
//! show_rationale = true
//! grants = ["granted"]
//! remediation = "enable"
//! max_rounds = 16
//! fix = { latitude = 34.0564, longitude = -117.1956 }
//! ```
//!
//! The `[simulation]` section is only used by the launcher.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::{error, platform::Grant, print_system_failure, CONFIG_FILE};

/// Configuration object.
pub static CONFIG: Lazy<Config> = Lazy::new(|| match Config::from_file(CONFIG_FILE) {
    Err(e) => {
        print_system_failure(&anyhow::Error::from(e), "Error loading configuration");
        panic!();
    }
    Ok(c) => c,
});

/// Configuration object.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    debug: bool,
    data_dir: PathBuf,
    messages: Messages,
    simulation: Option<Simulation>,
}

impl Config {
    /// Creates a new configuration object from a path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, error::Config> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| error::Config::Open {
            path: path.to_owned(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        let mut contents = String::new();

        let _ = reader
            .read_to_string(&mut contents)
            .map_err(|source| error::Config::Read {
                path: path.to_owned(),
                source,
            })?;

        let config: Self =
            toml::from_str(&contents).map_err(|source| error::Config::InvalidToml {
                path: path.to_owned(),
                source,
            })?;

        if let (false, errors) = config.verify() {
            Err(error::Config::Invalid { errors })
        } else {
            Ok(config)
        }
    }

    /// Verify the correctness of the configuration, and return a list of errors if invalid.
    fn verify(&self) -> (bool, String) {
        let mut errors = String::new();
        let mut ok = true;

        // Check for empty messages.
        for (name, message) in self.messages.iter() {
            if message.trim().is_empty() {
                ok = false;
                errors.push_str(&format!("the `{name}` message must not be empty\n"));
            }
        }

        // Check the simulated environment.
        if let Some(simulation) = &self.simulation {
            if simulation.max_rounds == 0 {
                ok = false;
                errors.push_str("simulation rounds must be at least 1, found 0\n");
            }
            if let Some(fix) = simulation.fix {
                if !(-90.0..=90.0).contains(&fix.latitude) {
                    ok = false;
                    errors.push_str(&format!(
                        "simulated latitude must be between -90 and 90 degrees, found {}\n",
                        fix.latitude
                    ));
                }
                if !(-180.0..=180.0).contains(&fix.longitude) {
                    ok = false;
                    errors.push_str(&format!(
                        "simulated longitude must be between -180 and 180 degrees, found {}\n",
                        fix.longitude
                    ));
                }
            }
        }

        (ok, errors)
    }

    /// Gets whether the launcher should run in debug mode.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Gets the configured data directory.
    pub fn data_dir(&self) -> &Path {
        self.data_dir.as_path()
    }

    /// Gets the user facing messages.
    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    /// Gets the simulated environment, if configured.
    pub fn simulation(&self) -> Option<&Simulation> {
        self.simulation.as_ref()
    }
}

/// User facing messages shown by the sequencer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Messages {
    location_tracking_off: String,
    wireless_off: String,
    location_required: String,
    location_permission: String,
}

impl Messages {
    /// Creates a new set of messages.
    pub fn new<S: Into<String>>(
        location_tracking_off: S,
        wireless_off: S,
        location_required: S,
        location_permission: S,
    ) -> Self {
        Self {
            location_tracking_off: location_tracking_off.into(),
            wireless_off: wireless_off.into(),
            location_required: location_required.into(),
            location_permission: location_permission.into(),
        }
    }

    /// Gets the prompt shown when the location provider is off.
    pub fn location_tracking_off(&self) -> &str {
        &self.location_tracking_off
    }

    /// Gets the prompt shown when there is no connectivity.
    pub fn wireless_off(&self) -> &str {
        &self.wireless_off
    }

    /// Gets the permission rationale.
    pub fn location_required(&self) -> &str {
        &self.location_required
    }

    /// Gets the notice shown when the permission is denied.
    pub fn location_permission(&self) -> &str {
        &self.location_permission
    }

    fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("location_tracking_off", self.location_tracking_off.as_str()),
            ("wireless_off", self.wireless_off.as_str()),
            ("location_required", self.location_required.as_str()),
            ("location_permission", self.location_permission.as_str()),
        ]
        .into_iter()
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self::new(
            "Location tracking is turned off. Would you like to turn it on?",
            "Wireless is turned off. Would you like to turn it on?",
            "Access to your location is required to find nearby places.",
            "Location permission was not granted.",
        )
    }
}

/// What the simulated user does when offered a settings screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemediationBehaviour {
    /// Turns the missing setting on and comes back.
    Enable,
    /// Comes back without changing anything.
    Ignore,
    /// Refuses to open the settings screen.
    Decline,
}

/// Simulated fix coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SimulatedFix {
    /// Latitude, in degrees.
    pub latitude: f64,
    /// Longitude, in degrees.
    pub longitude: f64,
}

/// Simulated platform environment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Simulation {
    provider_enabled: bool,
    connected: bool,
    #[serde(default)]
    show_rationale: bool,
    grants: Vec<Grant>,
    remediation: RemediationBehaviour,
    #[serde(default = "default_max_rounds")]
    max_rounds: u32,
    fix: Option<SimulatedFix>,
}

fn default_max_rounds() -> u32 {
    16
}

impl Simulation {
    /// Creates a simulation where everything is ready and the permission is granted.
    pub fn new(fix: Option<SimulatedFix>) -> Self {
        Self {
            provider_enabled: true,
            connected: true,
            show_rationale: false,
            grants: vec![Grant::Granted],
            remediation: RemediationBehaviour::Enable,
            max_rounds: default_max_rounds(),
            fix,
        }
    }

    /// Sets the initial readiness of the environment.
    #[must_use]
    pub fn with_readiness(mut self, provider_enabled: bool, connected: bool) -> Self {
        self.provider_enabled = provider_enabled;
        self.connected = connected;
        self
    }

    /// Sets whether the platform asks for a rationale.
    #[must_use]
    pub fn with_rationale(mut self, show_rationale: bool) -> Self {
        self.show_rationale = show_rationale;
        self
    }

    /// Sets what the user does when offered a settings screen.
    #[must_use]
    pub fn with_remediation(mut self, remediation: RemediationBehaviour) -> Self {
        self.remediation = remediation;
        self
    }

    /// Gets whether the location provider starts enabled.
    pub fn provider_enabled(&self) -> bool {
        self.provider_enabled
    }

    /// Gets whether the network starts connected.
    pub fn connected(&self) -> bool {
        self.connected
    }

    /// Gets whether the platform asks for a rationale.
    pub fn show_rationale(&self) -> bool {
        self.show_rationale
    }

    /// Gets the grants returned by the permission dialog.
    pub fn grants(&self) -> &[Grant] {
        &self.grants
    }

    /// Gets what the user does when offered a settings screen.
    pub fn remediation(&self) -> RemediationBehaviour {
        self.remediation
    }

    /// Gets the maximum number of callback rounds the launcher will run.
    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Gets the last known location of the simulated platform.
    pub fn fix(&self) -> Option<SimulatedFix> {
        self.fix
    }
}
