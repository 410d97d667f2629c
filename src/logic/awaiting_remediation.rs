//! Settings remediation logic.

use tracing::info;

use super::{checking_readiness, State, Transition};
use crate::platform::{RemediationOutcome, SettingsTarget};

/// Handles the user coming back from the remediation prompt for `target`.
pub(super) fn on_return(target: SettingsTarget, outcome: RemediationOutcome) -> Transition {
    match outcome {
        RemediationOutcome::Returned { result_code } => {
            info!(
                "Returned from the {} (request {}, result {}), checking again.",
                target,
                target.request_code(),
                result_code
            );
            checking_readiness::enter()
        }
        RemediationOutcome::Declined => {
            info!("The user declined to open the {}, giving up.", target);
            Transition::to(State::Abandoned)
        }
    }
}
