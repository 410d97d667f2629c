//! Simulated platform.
//!
//! [`SimulatedPlatform`] stands in for the device: it answers readiness and rationale queries from
//! its settings, records every prompt it is asked to show, and keeps asynchronous callbacks queued
//! until [`SimulatedPlatform::resolve_next`] plays the user's part. The launcher uses it to run an
//! acquisition from the `[simulation]` configuration section.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
    config::{RemediationBehaviour, Simulation},
    error,
    location::Fix,
    logic::Delivery,
    platform::{
        Callback, Grant, LocationSource, Notices, Permission, PermissionGateway, ReadinessProvider,
        RemediationOutcome, ResultConsumer, SettingsRemediationUi, SettingsTarget,
    },
};

/// Result code reported by the simulated settings screens.
pub const SETTINGS_RESULT_CODE: i32 = 0;

/// Something the platform was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// A settings prompt was shown.
    Remediation {
        /// Settings screen offered.
        target: SettingsTarget,
        /// Prompt message.
        message: String,
    },
    /// The permission rationale was shown.
    Rationale {
        /// Rationale message.
        message: String,
    },
    /// The permission dialog was shown.
    PermissionRequest(Permission),
    /// The last known location was requested.
    FixRequest,
    /// A transient notice was shown.
    Notice(String),
}

/// A callback the simulated platform has not answered yet.
#[derive(Debug)]
pub enum Pending {
    /// Settings prompt waiting for the user.
    Remediation(SettingsTarget, Callback<RemediationOutcome>),
    /// Rationale waiting for "OK".
    Rationale(Callback<()>),
    /// Permission dialog waiting for the user.
    Permission(Callback<Vec<Grant>>),
    /// Location client request.
    Fix(Callback<Option<Fix>>),
}

/// Scripted device.
#[derive(Debug)]
pub struct SimulatedPlatform {
    provider_enabled: bool,
    connected: bool,
    show_rationale: bool,
    grants: Vec<Grant>,
    remediation: RemediationBehaviour,
    fix: Option<Fix>,
    pending: VecDeque<Pending>,
    calls: Vec<Call>,
}

impl SimulatedPlatform {
    /// Creates a device with the given readiness that grants the permission but has no location.
    pub fn new(provider_enabled: bool, connected: bool) -> Self {
        Self {
            provider_enabled,
            connected,
            show_rationale: false,
            grants: vec![Grant::Granted],
            remediation: RemediationBehaviour::Enable,
            fix: None,
            pending: VecDeque::new(),
            calls: Vec::new(),
        }
    }

    /// Creates a device from the `[simulation]` configuration, with a fix taken at `time`.
    pub fn from_simulation(
        simulation: &Simulation,
        time: DateTime<Utc>,
    ) -> Result<Self, error::Fix> {
        let fix = simulation
            .fix()
            .map(|fix| Fix::new(fix.latitude, fix.longitude, time))
            .transpose()?;

        Ok(
            Self::new(simulation.provider_enabled(), simulation.connected())
                .with_rationale(simulation.show_rationale())
                .with_grants(simulation.grants().to_vec())
                .with_remediation(simulation.remediation())
                .with_fix(fix),
        )
    }

    /// Sets whether the platform asks for a rationale.
    #[must_use]
    pub fn with_rationale(mut self, show_rationale: bool) -> Self {
        self.show_rationale = show_rationale;
        self
    }

    /// Sets the grants the permission dialog returns.
    #[must_use]
    pub fn with_grants(mut self, grants: Vec<Grant>) -> Self {
        self.grants = grants;
        self
    }

    /// Sets what the user does when offered a settings screen.
    #[must_use]
    pub fn with_remediation(mut self, remediation: RemediationBehaviour) -> Self {
        self.remediation = remediation;
        self
    }

    /// Sets the last known location.
    #[must_use]
    pub fn with_fix(mut self, fix: Option<Fix>) -> Self {
        self.fix = fix;
        self
    }

    /// Switches the location provider on or off.
    pub fn set_provider_enabled(&mut self, provider_enabled: bool) {
        self.provider_enabled = provider_enabled;
    }

    /// Connects or disconnects the network.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Gets everything the platform was asked to do, in order.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Gets the number of unanswered callbacks.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Takes the oldest unanswered callback without answering it.
    pub fn take_pending(&mut self) -> Option<Pending> {
        self.pending.pop_front()
    }

    /// Answers the oldest unanswered callback the way the script says.
    ///
    /// Returns `false` if there was nothing to answer.
    pub fn resolve_next(&mut self) -> bool {
        let Some(pending) = self.pending.pop_front() else {
            return false;
        };

        match pending {
            Pending::Remediation(target, on_return) => match self.remediation {
                RemediationBehaviour::Enable => {
                    info!("Simulated user turns on the {}.", target);
                    match target {
                        SettingsTarget::LocationSettings => self.provider_enabled = true,
                        SettingsTarget::WifiSettings => self.connected = true,
                    }
                    on_return.resolve(RemediationOutcome::Returned {
                        result_code: SETTINGS_RESULT_CODE,
                    });
                }
                RemediationBehaviour::Ignore => {
                    info!("Simulated user leaves the {} unchanged.", target);
                    on_return.resolve(RemediationOutcome::Returned {
                        result_code: SETTINGS_RESULT_CODE,
                    });
                }
                RemediationBehaviour::Decline => {
                    info!("Simulated user declines to open the {}.", target);
                    on_return.resolve(RemediationOutcome::Declined);
                }
            },
            Pending::Rationale(acknowledged) => acknowledged.resolve(()),
            Pending::Permission(callback) => callback.resolve(self.grants.clone()),
            Pending::Fix(callback) => callback.resolve(self.fix),
        }
        true
    }
}

impl ReadinessProvider for SimulatedPlatform {
    fn is_location_provider_enabled(&self) -> bool {
        self.provider_enabled
    }

    fn is_network_connected(&self) -> bool {
        self.connected
    }
}

impl PermissionGateway for SimulatedPlatform {
    fn should_show_rationale(&self, _permission: Permission) -> bool {
        self.show_rationale
    }

    fn show_rationale(&mut self, message: &str, acknowledged: Callback<()>) {
        debug!("Rationale: {}", message);
        self.calls.push(Call::Rationale {
            message: message.to_owned(),
        });
        self.pending.push_back(Pending::Rationale(acknowledged));
    }

    fn request(&mut self, permission: Permission, callback: Callback<Vec<Grant>>) {
        debug!("Permission dialog for {}.", permission);
        self.calls.push(Call::PermissionRequest(permission));
        self.pending.push_back(Pending::Permission(callback));
    }
}

impl LocationSource for SimulatedPlatform {
    fn last_known_location(&mut self, callback: Callback<Option<Fix>>) {
        self.calls.push(Call::FixRequest);
        self.pending.push_back(Pending::Fix(callback));
    }
}

impl SettingsRemediationUi for SimulatedPlatform {
    fn prompt_and_launch(
        &mut self,
        target: SettingsTarget,
        message: &str,
        on_return: Callback<RemediationOutcome>,
    ) {
        debug!("Settings prompt for the {}: {}", target, message);
        self.calls.push(Call::Remediation {
            target,
            message: message.to_owned(),
        });
        self.pending
            .push_back(Pending::Remediation(target, on_return));
    }
}

impl Notices for SimulatedPlatform {
    fn show_notice(&mut self, message: &str) {
        debug!("Notice: {}", message);
        self.calls.push(Call::Notice(message.to_owned()));
    }
}

/// Consumer that keeps every delivery it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingConsumer {
    deliveries: Vec<Delivery>,
}

impl RecordingConsumer {
    /// Creates an empty consumer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the deliveries received so far, in order.
    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }
}

impl ResultConsumer for RecordingConsumer {
    fn on_location_ready(&mut self, fix: Fix) {
        self.deliveries.push(Delivery::Ready(fix));
    }

    fn on_location_unavailable(&mut self, reason: error::Acquisition) {
        self.deliveries.push(Delivery::Unavailable(reason));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulatedFix;

    #[test]
    fn from_simulation() {
        let simulation = Simulation::new(Some(SimulatedFix {
            latitude: 34.0564,
            longitude: -117.1956,
        }))
        .with_readiness(false, true)
        .with_rationale(true)
        .with_remediation(RemediationBehaviour::Decline);
        let now = Utc::now();

        let platform = SimulatedPlatform::from_simulation(&simulation, now).unwrap();
        assert!(!platform.is_location_provider_enabled());
        assert!(platform.is_network_connected());
        assert!(platform.should_show_rationale(Permission::FineLocation));
        assert_eq!(platform.remediation, RemediationBehaviour::Decline);
        assert_eq!(platform.fix, Some(Fix::new(34.0564, -117.1956, now).unwrap()));
        assert_eq!(platform.pending(), 0);
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn from_simulation_invalid_fix() {
        let simulation = Simulation::new(Some(SimulatedFix {
            latitude: 120.0,
            longitude: 0.0,
        }));
        assert!(SimulatedPlatform::from_simulation(&simulation, Utc::now()).is_err());
    }

    #[test]
    fn nothing_to_resolve() {
        let mut platform = SimulatedPlatform::new(true, true);
        assert!(!platform.resolve_next());
        assert!(platform.take_pending().is_none());
    }
}
