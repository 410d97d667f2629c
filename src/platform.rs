//! Platform collaborators.
//!
//! The sequencer never talks to the operating system directly. Everything it needs (readiness
//! checks, the permission dialog, the location client, the settings screens and the transient
//! notices) goes through the traits in this module, and every asynchronous answer comes back as a
//! [`Callback`].

use std::fmt;

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::{error, location::Fix, logic::Event};

/// Request code of the location permission request.
pub const PERMISSION_REQUEST_LOCATION: i32 = 0;

/// Runtime permissions the sequencer asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Precise location access.
    FineLocation,
}

impl Permission {
    /// Gets the platform name of the permission.
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::FineLocation => "ACCESS_FINE_LOCATION",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one permission in a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grant {
    /// The permission was granted.
    Granted,
    /// The permission was denied.
    Denied,
}

/// Permission state as last observed by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    /// No permission result has been received yet.
    #[default]
    NotRequested,
    /// The permission was granted.
    Granted,
    /// The permission was denied, or the result was malformed.
    Denied,
}

/// Settings screens the user can be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsTarget {
    /// Location source settings.
    LocationSettings,
    /// Wireless settings.
    WifiSettings,
}

impl SettingsTarget {
    /// Gets the request code used to correlate the settings screen with its return.
    pub fn request_code(self) -> i32 {
        match self {
            SettingsTarget::LocationSettings => 1,
            SettingsTarget::WifiSettings => 2,
        }
    }

    /// Gets the reason that sends the user to this settings screen.
    pub fn reason(self) -> error::Acquisition {
        match self {
            SettingsTarget::LocationSettings => error::Acquisition::ProviderDisabled,
            SettingsTarget::WifiSettings => error::Acquisition::NetworkUnavailable,
        }
    }
}

impl fmt::Display for SettingsTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            SettingsTarget::LocationSettings => "location settings",
            SettingsTarget::WifiSettings => "wifi settings",
        })
    }
}

/// How the user left a settings remediation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationOutcome {
    /// The settings screen was opened and the user came back from it.
    ///
    /// The result code is reported but never inspected: readiness is checked again anyway.
    Returned {
        /// Result code reported by the settings screen.
        result_code: i32,
    },
    /// The user refused to open the settings screen.
    Declined,
}

/// Queued callback, tagged with the attempt it was issued for.
#[derive(Debug)]
pub(crate) struct Envelope {
    pub(crate) attempt: u64,
    pub(crate) event: Event,
}

/// One-shot answer channel handed to a collaborator.
///
/// Resolving consumes the callback, so each one can only fire once. If the sequencer that issued
/// it has been dropped in the meantime, the answer is discarded.
pub struct Callback<T> {
    sender: UnboundedSender<Envelope>,
    attempt: u64,
    wrap: Box<dyn FnOnce(T) -> Event + Send>,
}

impl<T> Callback<T> {
    pub(crate) fn new<F>(sender: UnboundedSender<Envelope>, attempt: u64, wrap: F) -> Self
    where
        F: FnOnce(T) -> Event + Send + 'static,
    {
        Self {
            sender,
            attempt,
            wrap: Box::new(wrap),
        }
    }

    /// Gets the attempt this callback belongs to.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Delivers the answer to the sequencer.
    pub fn resolve(self, value: T) {
        let event = (self.wrap)(value);
        let name = event.name();
        if self
            .sender
            .send(Envelope {
                attempt: self.attempt,
                event,
            })
            .is_err()
        {
            debug!(
                "Sequencer is gone, dropping late {} callback of attempt {}.",
                name, self.attempt
            );
        }
    }
}

impl<T> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Callback")
            .field("attempt", &self.attempt)
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

/// Environment readiness checks.
pub trait ReadinessProvider {
    /// Checks if the location provider is switched on.
    fn is_location_provider_enabled(&self) -> bool;

    /// Checks if there is an active network connection.
    fn is_network_connected(&self) -> bool;
}

/// Runtime permission prompts.
pub trait PermissionGateway {
    /// Checks if the platform wants an explanation shown before asking for the permission.
    fn should_show_rationale(&self, permission: Permission) -> bool;

    /// Shows a blocking inline explanation with an "OK" action.
    ///
    /// `acknowledged` must be resolved when the user presses "OK".
    fn show_rationale(&mut self, message: &str, acknowledged: Callback<()>);

    /// Shows the platform permission dialog.
    fn request(&mut self, permission: Permission, callback: Callback<Vec<Grant>>);
}

/// Platform location client.
pub trait LocationSource {
    /// Asks for the last known location. `None` means the platform had none.
    fn last_known_location(&mut self, callback: Callback<Option<Fix>>);
}

/// Prompt offering to open a settings screen.
pub trait SettingsRemediationUi {
    /// Shows `message`, opens `target` if the user accepts, and resolves `on_return` when the
    /// user comes back or declines.
    fn prompt_and_launch(
        &mut self,
        target: SettingsTarget,
        message: &str,
        on_return: Callback<RemediationOutcome>,
    );
}

/// Transient user notices.
pub trait Notices {
    /// Shows a short notice.
    fn show_notice(&mut self, message: &str);
}

/// Everything the sequencer needs from the platform.
pub trait Platform:
    ReadinessProvider + PermissionGateway + LocationSource + SettingsRemediationUi + Notices
{
}

impl<P> Platform for P where
    P: ReadinessProvider + PermissionGateway + LocationSource + SettingsRemediationUi + Notices
{
}

/// Receiver of the outcome of a location attempt.
pub trait ResultConsumer {
    /// A fix was obtained.
    fn on_location_ready(&mut self, fix: Fix);

    /// No fix could be obtained.
    fn on_location_unavailable(&mut self, reason: error::Acquisition);
}
