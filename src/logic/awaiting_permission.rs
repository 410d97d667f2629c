//! Permission request logic.

use tracing::{info, warn};

use super::{Command, Delivery, Event, Notice, PermissionStage, State, Transition};
use crate::{error::Acquisition, platform::Grant};

/// Handles an event while the permission is being requested.
///
/// Gives the event back if it does not belong to `stage`.
pub(super) fn on_event(stage: PermissionStage, event: Event) -> Result<Transition, Event> {
    match (stage, event) {
        (PermissionStage::Deciding, Event::Rationale(true)) => {
            info!("Showing the location permission rationale.");
            Ok(Transition::to(State::AwaitingPermission(PermissionStage::Explaining))
                .with(Command::ShowRationale))
        }
        (PermissionStage::Deciding, Event::Rationale(false))
        | (PermissionStage::Explaining, Event::RationaleAcknowledged) => Ok(prompt()),
        (PermissionStage::Prompting, Event::PermissionResult(grants)) => Ok(on_result(&grants)),
        (_, event) => Err(event),
    }
}

fn prompt() -> Transition {
    info!("Requesting the location permission.");
    Transition::to(State::AwaitingPermission(PermissionStage::Prompting))
        .with(Command::PromptPermission)
}

/// Only a single granted result lets the sequence ask for a fix.
fn on_result(grants: &[Grant]) -> Transition {
    if let [Grant::Granted] = grants {
        info!("Location permission granted, requesting the last known location.");
        return Transition::to(State::AwaitingFix).with(Command::RequestFix);
    }

    warn!("Location permission not granted: {:?}.", grants);
    let delivery = Delivery::Unavailable(Acquisition::PermissionDenied);
    Transition::to(State::Delivered(delivery))
        .with(Command::ShowNotice(Notice::PermissionDenied))
        .with(Command::Deliver(delivery))
}
