//! Fix delivery logic.

use tracing::{info, warn};

use super::{Command, Delivery, State, Transition};
use crate::{error::Acquisition, location::Fix};

/// Hands the location client's answer to the consumer.
pub(super) fn on_fix(fix: Option<Fix>) -> Transition {
    let delivery = match fix {
        Some(fix) => {
            info!("Location acquired. {}", fix);
            Delivery::Ready(fix)
        }
        None => {
            warn!("The platform has no last known location.");
            Delivery::Unavailable(Acquisition::LocationUnavailable)
        }
    };

    Transition::to(State::Delivered(delivery)).with(Command::Deliver(delivery))
}
