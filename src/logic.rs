//! Logic module.
//!
//! The acquisition sequence is an explicit state value plus a pure [`transition`] function. The
//! function never touches the platform: it returns the next state and the [`Command`]s the
//! [`Sequencer`](crate::sequencer::Sequencer) has to run. Answers from the platform come back as
//! [`Event`]s.
//!
//! ```text
//! Idle ─start─▶ CheckingReadiness ─ready─▶ AwaitingPermission ─granted─▶ AwaitingFix ─▶ Delivered
//!                   ▲      │                        │
//!                   │      └─not ready─▶ AwaitingSettingsRemediation ─declined─▶ Abandoned
//!                   └──────── returned ──────┘      └─denied─▶ Delivered
//! ```

mod awaiting_fix;
mod awaiting_permission;
mod awaiting_remediation;
mod checking_readiness;

use std::fmt;

use tracing::warn;

use crate::{
    error,
    location::Fix,
    platform::{Grant, RemediationOutcome, SettingsTarget},
};

/// States of the location acquisition sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum State {
    /// Nothing has been requested yet.
    Idle,
    /// Reading the location provider and connectivity state.
    CheckingReadiness,
    /// The user has been offered a settings screen and has not come back yet.
    AwaitingSettingsRemediation(SettingsTarget),
    /// Asking for the location permission.
    AwaitingPermission(PermissionStage),
    /// Waiting for the last known location.
    AwaitingFix,
    /// The outcome was handed to the consumer.
    Delivered(Delivery),
    /// The user refused to fix the settings; nothing will be delivered.
    Abandoned,
}

impl State {
    /// Gets the name of the state, for logs.
    pub fn as_str(&self) -> &'static str {
        match *self {
            State::Idle => "IDLE",
            State::CheckingReadiness => "CHECKING_READINESS",
            State::AwaitingSettingsRemediation(_) => "AWAITING_SETTINGS_REMEDIATION",
            State::AwaitingPermission(_) => "AWAITING_PERMISSION",
            State::AwaitingFix => "AWAITING_FIX",
            State::Delivered(_) => "DELIVERED",
            State::Abandoned => "ABANDONED",
        }
    }

    /// Checks if the attempt is over.
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Delivered(_) | State::Abandoned)
    }

    /// Checks if an attempt has been started and is not over yet.
    pub fn is_in_progress(&self) -> bool {
        *self != State::Idle && !self.is_terminal()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of the permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStage {
    /// Waiting to know if a rationale must be shown.
    Deciding,
    /// The rationale is on screen, waiting for "OK".
    Explaining,
    /// The platform permission dialog is on screen.
    Prompting,
}

/// Outcome handed to the consumer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delivery {
    /// A location fix.
    Ready(Fix),
    /// No location, and why.
    Unavailable(error::Acquisition),
}

/// Transient notices the sequencer can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The location permission was not granted.
    PermissionDenied,
}

/// Inputs of the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A new attempt begins.
    Start,
    /// Readiness was evaluated.
    Readiness {
        /// Whether the location provider is on.
        provider_enabled: bool,
        /// Whether there is network connectivity.
        connected: bool,
    },
    /// The user left a settings remediation prompt.
    SettingsReturned(SettingsTarget, RemediationOutcome),
    /// Whether the platform wants a rationale shown.
    Rationale(bool),
    /// The user pressed "OK" on the rationale.
    RationaleAcknowledged,
    /// The permission dialog returned these grants.
    PermissionResult(Vec<Grant>),
    /// The location client answered.
    FixResult(Option<Fix>),
}

impl Event {
    /// Gets the name of the event, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::Readiness { .. } => "readiness",
            Event::SettingsReturned(..) => "settings return",
            Event::Rationale(_) => "rationale",
            Event::RationaleAcknowledged => "rationale acknowledgement",
            Event::PermissionResult(_) => "permission result",
            Event::FixResult(_) => "location result",
        }
    }
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Read the environment and answer with [`Event::Readiness`].
    EvaluateReadiness,
    /// Offer the given settings screen to the user.
    LaunchRemediation(SettingsTarget),
    /// Ask the platform whether a rationale is needed and answer with [`Event::Rationale`].
    QueryRationale,
    /// Show the permission rationale.
    ShowRationale,
    /// Show the permission dialog.
    PromptPermission,
    /// Show a transient notice.
    ShowNotice(Notice),
    /// Ask for the last known location.
    RequestFix,
    /// Hand the outcome to the consumer.
    Deliver(Delivery),
}

/// Result of applying an event to a state.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// The state after the event.
    pub next: State,
    /// Commands to run, in order.
    pub commands: Vec<Command>,
}

impl Transition {
    fn to(next: State) -> Self {
        Self {
            next,
            commands: Vec::new(),
        }
    }

    fn with(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }
}

/// Applies `event` to `state`.
///
/// [`Event::Start`] is only accepted while idle or once the previous attempt is over. Any event
/// that does not belong to the current state is ignored.
pub fn transition(state: &State, event: Event) -> Transition {
    let ignored = match (state, event) {
        (State::Idle | State::Delivered(_) | State::Abandoned, Event::Start) => {
            return checking_readiness::enter()
        }
        (
            State::CheckingReadiness,
            Event::Readiness {
                provider_enabled,
                connected,
            },
        ) => return checking_readiness::on_readiness(provider_enabled, connected),
        (State::AwaitingSettingsRemediation(pending), Event::SettingsReturned(target, outcome))
            if *pending == target =>
        {
            return awaiting_remediation::on_return(target, outcome)
        }
        (State::AwaitingPermission(stage), event) => {
            match awaiting_permission::on_event(*stage, event) {
                Ok(transition) => return transition,
                Err(event) => event,
            }
        }
        (State::AwaitingFix, Event::FixResult(fix)) => return awaiting_fix::on_fix(fix),
        (_, event) => event,
    };

    warn!("Ignoring {} event in state {}.", ignored.name(), state);
    Transition::to(state.clone())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{transition, Command, Delivery, Event, Notice, PermissionStage, State};
    use crate::{
        error::Acquisition,
        location::Fix,
        platform::{Grant, RemediationOutcome, SettingsTarget},
    };

    fn fix() -> Fix {
        Fix::new(
            34.056_4,
            -117.195_6,
            Utc.with_ymd_and_hms(2016, 11, 3, 10, 30, 0).unwrap(),
        )
        .unwrap()
    }

    fn readiness(provider_enabled: bool, connected: bool) -> Event {
        Event::Readiness {
            provider_enabled,
            connected,
        }
    }

    /// Tests that the state names are the expected ones.
    #[test]
    fn it_as_str() {
        assert_eq!(State::Idle.as_str(), "IDLE");
        assert_eq!(State::CheckingReadiness.as_str(), "CHECKING_READINESS");
        assert_eq!(
            State::AwaitingSettingsRemediation(SettingsTarget::WifiSettings).as_str(),
            "AWAITING_SETTINGS_REMEDIATION"
        );
        assert_eq!(
            State::AwaitingPermission(PermissionStage::Prompting).as_str(),
            "AWAITING_PERMISSION"
        );
        assert_eq!(State::AwaitingFix.as_str(), "AWAITING_FIX");
        assert_eq!(
            State::Delivered(Delivery::Ready(fix())).to_string(),
            "DELIVERED"
        );
        assert_eq!(State::Abandoned.to_string(), "ABANDONED");
    }

    /// Tests that only delivered and abandoned states are terminal.
    #[test]
    fn it_is_terminal() {
        assert!(!State::Idle.is_terminal());
        assert!(!State::CheckingReadiness.is_terminal());
        assert!(!State::AwaitingFix.is_terminal());
        assert!(State::Delivered(Delivery::Unavailable(Acquisition::LocationUnavailable))
            .is_terminal());
        assert!(State::Abandoned.is_terminal());
    }

    /// Tests that only started, unfinished attempts are in progress.
    #[test]
    fn it_is_in_progress() {
        assert!(!State::Idle.is_in_progress());
        assert!(State::CheckingReadiness.is_in_progress());
        assert!(State::AwaitingSettingsRemediation(SettingsTarget::WifiSettings).is_in_progress());
        assert!(State::AwaitingFix.is_in_progress());
        assert!(!State::Abandoned.is_in_progress());
    }

    /// Tests that starting while idle or after an attempt evaluates readiness.
    #[test]
    fn it_start() {
        for state in [
            State::Idle,
            State::Delivered(Delivery::Ready(fix())),
            State::Delivered(Delivery::Unavailable(Acquisition::PermissionDenied)),
            State::Abandoned,
        ] {
            let transition = transition(&state, Event::Start);
            assert_eq!(transition.next, State::CheckingReadiness);
            assert_eq!(transition.commands, vec![Command::EvaluateReadiness]);
        }
    }

    /// Tests that starting again while an attempt is in progress changes nothing.
    #[test]
    fn it_start_in_progress() {
        for state in [
            State::CheckingReadiness,
            State::AwaitingSettingsRemediation(SettingsTarget::LocationSettings),
            State::AwaitingPermission(PermissionStage::Deciding),
            State::AwaitingPermission(PermissionStage::Explaining),
            State::AwaitingPermission(PermissionStage::Prompting),
            State::AwaitingFix,
        ] {
            let transition = transition(&state, Event::Start);
            assert_eq!(transition.next, state);
            assert!(transition.commands.is_empty());
        }
    }

    /// Tests every readiness combination.
    #[test]
    fn it_readiness_grid() {
        for provider_enabled in [true, false] {
            for connected in [true, false] {
                let transition =
                    transition(&State::CheckingReadiness, readiness(provider_enabled, connected));

                if provider_enabled && connected {
                    assert_eq!(
                        transition.next,
                        State::AwaitingPermission(PermissionStage::Deciding)
                    );
                    assert_eq!(transition.commands, vec![Command::QueryRationale]);
                } else {
                    let target = if provider_enabled {
                        SettingsTarget::WifiSettings
                    } else {
                        SettingsTarget::LocationSettings
                    };
                    assert_eq!(transition.next, State::AwaitingSettingsRemediation(target));
                    assert_eq!(transition.commands, vec![Command::LaunchRemediation(target)]);
                }
            }
        }
    }

    /// Tests that coming back from settings always checks readiness again.
    #[test]
    fn it_settings_returned() {
        for result_code in [-1, 0, 1] {
            let transition = transition(
                &State::AwaitingSettingsRemediation(SettingsTarget::LocationSettings),
                Event::SettingsReturned(
                    SettingsTarget::LocationSettings,
                    RemediationOutcome::Returned { result_code },
                ),
            );
            assert_eq!(transition.next, State::CheckingReadiness);
            assert_eq!(transition.commands, vec![Command::EvaluateReadiness]);
        }
    }

    /// Tests that declining a settings prompt abandons the attempt.
    #[test]
    fn it_settings_declined() {
        let transition = transition(
            &State::AwaitingSettingsRemediation(SettingsTarget::WifiSettings),
            Event::SettingsReturned(SettingsTarget::WifiSettings, RemediationOutcome::Declined),
        );
        assert_eq!(transition.next, State::Abandoned);
        assert!(transition.commands.is_empty());
    }

    /// Tests that a return from a settings screen that was not requested is ignored.
    #[test]
    fn it_settings_returned_wrong_target() {
        let state = State::AwaitingSettingsRemediation(SettingsTarget::WifiSettings);
        let transition = transition(
            &state,
            Event::SettingsReturned(
                SettingsTarget::LocationSettings,
                RemediationOutcome::Returned { result_code: 0 },
            ),
        );
        assert_eq!(transition.next, state);
        assert!(transition.commands.is_empty());
    }

    /// Tests both rationale branches.
    #[test]
    fn it_rationale() {
        let deciding = State::AwaitingPermission(PermissionStage::Deciding);

        let direct = transition(&deciding, Event::Rationale(false));
        assert_eq!(
            direct.next,
            State::AwaitingPermission(PermissionStage::Prompting)
        );
        assert_eq!(direct.commands, vec![Command::PromptPermission]);

        let explained = transition(&deciding, Event::Rationale(true));
        assert_eq!(
            explained.next,
            State::AwaitingPermission(PermissionStage::Explaining)
        );
        assert_eq!(explained.commands, vec![Command::ShowRationale]);

        let acknowledged = transition(&explained.next, Event::RationaleAcknowledged);
        assert_eq!(
            acknowledged.next,
            State::AwaitingPermission(PermissionStage::Prompting)
        );
        assert_eq!(acknowledged.commands, vec![Command::PromptPermission]);
    }

    /// Tests that a single granted result requests a fix exactly once.
    #[test]
    fn it_permission_granted() {
        let transition = transition(
            &State::AwaitingPermission(PermissionStage::Prompting),
            Event::PermissionResult(vec![Grant::Granted]),
        );
        assert_eq!(transition.next, State::AwaitingFix);
        assert_eq!(transition.commands, vec![Command::RequestFix]);
    }

    /// Tests that malformed or denied results end the attempt without a fix request.
    #[test]
    fn it_permission_denied() {
        let denied = Delivery::Unavailable(Acquisition::PermissionDenied);
        for grants in [
            vec![],
            vec![Grant::Denied],
            vec![Grant::Granted, Grant::Granted],
            vec![Grant::Granted, Grant::Denied],
        ] {
            let transition = transition(
                &State::AwaitingPermission(PermissionStage::Prompting),
                Event::PermissionResult(grants),
            );
            assert_eq!(transition.next, State::Delivered(denied));
            assert_eq!(
                transition.commands,
                vec![
                    Command::ShowNotice(Notice::PermissionDenied),
                    Command::Deliver(denied),
                ]
            );
        }
    }

    /// Tests that a permission result is ignored while the rationale is still on screen.
    #[test]
    fn it_permission_result_while_explaining() {
        let state = State::AwaitingPermission(PermissionStage::Explaining);
        let transition = transition(&state, Event::PermissionResult(vec![Grant::Granted]));
        assert_eq!(transition.next, state);
        assert!(transition.commands.is_empty());
    }

    /// Tests both fix outcomes.
    #[test]
    fn it_fix_result() {
        let ready = transition(&State::AwaitingFix, Event::FixResult(Some(fix())));
        assert_eq!(ready.next, State::Delivered(Delivery::Ready(fix())));
        assert_eq!(ready.commands, vec![Command::Deliver(Delivery::Ready(fix()))]);

        let absent = transition(&State::AwaitingFix, Event::FixResult(None));
        let unavailable = Delivery::Unavailable(Acquisition::LocationUnavailable);
        assert_eq!(absent.next, State::Delivered(unavailable));
        assert_eq!(absent.commands, vec![Command::Deliver(unavailable)]);
    }

    /// Tests that a second fix after delivery does nothing.
    #[test]
    fn it_fix_result_after_delivery() {
        let state = State::Delivered(Delivery::Ready(fix()));
        let transition = transition(&state, Event::FixResult(None));
        assert_eq!(transition.next, state);
        assert!(transition.commands.is_empty());
    }

    /// Tests that a fix is never accepted without going through the permission result.
    #[test]
    fn it_fix_result_without_permission() {
        for state in [
            State::Idle,
            State::CheckingReadiness,
            State::AwaitingPermission(PermissionStage::Prompting),
        ] {
            let transition = transition(&state, Event::FixResult(Some(fix())));
            assert_eq!(transition.next, state);
            assert!(transition.commands.is_empty());
        }
    }
}
