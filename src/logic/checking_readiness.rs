//! Readiness checking logic.

use tracing::info;

use super::{Command, PermissionStage, State, Transition};
use crate::platform::SettingsTarget;

/// Begins a new readiness evaluation.
pub(super) fn enter() -> Transition {
    Transition::to(State::CheckingReadiness).with(Command::EvaluateReadiness)
}

/// Picks the next step from the environment state.
///
/// The location provider is checked before connectivity, and only one settings screen is offered
/// per evaluation.
pub(super) fn on_readiness(provider_enabled: bool, connected: bool) -> Transition {
    let target = match (provider_enabled, connected) {
        (true, true) => {
            info!("Location provider on and network connected, requesting permission.");
            return Transition::to(State::AwaitingPermission(PermissionStage::Deciding))
                .with(Command::QueryRationale);
        }
        (false, _) => SettingsTarget::LocationSettings,
        (true, false) => SettingsTarget::WifiSettings,
    };

    info!("{}, offering the {}.", target.reason(), target);
    Transition::to(State::AwaitingSettingsRemediation(target))
        .with(Command::LaunchRemediation(target))
}
