//! Location acquisition sequencer.
//!
//! The [`Sequencer`] owns the platform collaborators, the result consumer and the current
//! [`State`]. It runs the commands returned by [`logic::transition`] and advances only when a
//! message arrives on its channel: synchronous platform reads are posted to the same channel as
//! the asynchronous callbacks, so every step goes through one queue.

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::{
    config::Messages,
    error::Acquisition,
    location::{Fix, LocationCache},
    logic::{self, Command, Delivery, Event, Notice, State, Transition},
    platform::{
        Callback, Envelope, Permission, PermissionState, Platform, ResultConsumer, SettingsTarget,
        PERMISSION_REQUEST_LOCATION,
    },
};

/// Drives one location attempt at a time.
#[derive(Debug)]
pub struct Sequencer<P, C> {
    platform: P,
    consumer: C,
    cache: LocationCache,
    messages: Messages,
    state: State,
    attempt: u64,
    permission: PermissionState,
    sender: UnboundedSender<Envelope>,
    receiver: UnboundedReceiver<Envelope>,
}

impl<P, C> Sequencer<P, C>
where
    P: Platform,
    C: ResultConsumer,
{
    /// Creates an idle sequencer.
    pub fn new(platform: P, consumer: C, cache: LocationCache, messages: Messages) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            platform,
            consumer,
            cache,
            messages,
            state: State::Idle,
            attempt: 0,
            permission: PermissionState::NotRequested,
            sender,
            receiver,
        }
    }

    /// Begins a new attempt and handles every message that is already available.
    ///
    /// Does nothing while an attempt is in progress: the running attempt keeps its prompts and
    /// still delivers its outcome.
    pub fn start(&mut self) -> &State {
        if self.state.is_in_progress() {
            info!(
                "Location attempt {} is still in state {}, not starting another.",
                self.attempt, self.state
            );
            return &self.state;
        }

        self.attempt += 1;
        info!("Starting location attempt {}.", self.attempt);
        self.post(Event::Start);
        let _ = self.pump();
        &self.state
    }

    /// Handles every queued message without blocking. Returns the number of messages handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) => {
                    if self.accept(envelope) {
                        handled += 1;
                    }
                }
                Err(TryRecvError::Empty) => break,
                // The sequencer keeps a sender, so the channel never disconnects.
                Err(TryRecvError::Disconnected) => break,
            }
        }
        handled
    }

    /// Waits for callbacks until the current attempt is over.
    ///
    /// Returns straight away if no attempt has been started.
    pub async fn run(&mut self) -> &State {
        while self.state.is_in_progress() {
            match self.receiver.recv().await {
                Some(envelope) => {
                    let _ = self.accept(envelope);
                }
                None => break,
            }
        }
        &self.state
    }

    /// Gets the current state.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Gets the number of the current attempt. Zero means no attempt was started.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Gets the permission state as last observed.
    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    /// Gets the platform collaborators.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Gets the platform collaborators, mutably.
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Gets the result consumer.
    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    /// Gets the location cache the sequencer writes to.
    pub fn cache(&self) -> &LocationCache {
        &self.cache
    }

    /// Consumes the sequencer, giving back the platform and the consumer.
    pub fn into_parts(self) -> (P, C) {
        (self.platform, self.consumer)
    }

    fn accept(&mut self, envelope: Envelope) -> bool {
        if envelope.attempt != self.attempt {
            debug!(
                "Discarding {} callback of attempt {}, current attempt is {}.",
                envelope.event.name(),
                envelope.attempt,
                self.attempt
            );
            return false;
        }

        self.apply(envelope.event);
        true
    }

    fn apply(&mut self, event: Event) {
        let name = event.name();
        let permission_result = matches!(event, Event::PermissionResult(_));

        let Transition { next, commands } = logic::transition(&self.state, event);
        if next != self.state {
            debug!("{} → {} on {} event.", self.state, next, name);
            if permission_result {
                self.permission = match next {
                    State::AwaitingFix => PermissionState::Granted,
                    _ => PermissionState::Denied,
                };
            }
        }
        self.state = next;

        for command in commands {
            self.execute(command);
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::EvaluateReadiness => {
                let provider_enabled = self.platform.is_location_provider_enabled();
                let connected = self.platform.is_network_connected();
                debug!(
                    "Location provider enabled: {}, network connected: {}.",
                    provider_enabled, connected
                );
                self.post(Event::Readiness {
                    provider_enabled,
                    connected,
                });
            }
            Command::LaunchRemediation(target) => {
                let on_return =
                    self.callback(move |outcome| Event::SettingsReturned(target, outcome));
                let message = match target {
                    SettingsTarget::LocationSettings => self.messages.location_tracking_off(),
                    SettingsTarget::WifiSettings => self.messages.wireless_off(),
                };
                self.platform.prompt_and_launch(target, message, on_return);
            }
            Command::QueryRationale => {
                let should_show = self.platform.should_show_rationale(Permission::FineLocation);
                self.post(Event::Rationale(should_show));
            }
            Command::ShowRationale => {
                let acknowledged = self.callback(|()| Event::RationaleAcknowledged);
                self.platform
                    .show_rationale(self.messages.location_required(), acknowledged);
            }
            Command::PromptPermission => {
                debug!(
                    "Requesting {} with request code {}.",
                    Permission::FineLocation,
                    PERMISSION_REQUEST_LOCATION
                );
                let callback = self.callback(Event::PermissionResult);
                self.platform.request(Permission::FineLocation, callback);
            }
            Command::ShowNotice(Notice::PermissionDenied) => {
                self.platform.show_notice(self.messages.location_permission());
            }
            Command::RequestFix => {
                let callback = self.callback(Event::FixResult);
                self.platform.last_known_location(callback);
            }
            Command::Deliver(Delivery::Ready(fix)) => self.deliver_fix(fix),
            Command::Deliver(Delivery::Unavailable(reason)) => self.deliver_unavailable(reason),
        }
    }

    fn deliver_fix(&mut self, fix: Fix) {
        info!("Delivering location of attempt {}.", self.attempt);
        self.cache.store(fix);
        self.consumer.on_location_ready(fix);
    }

    fn deliver_unavailable(&mut self, reason: Acquisition) {
        info!("No location for attempt {}: {}.", self.attempt, reason);
        self.consumer.on_location_unavailable(reason);
    }

    fn callback<T, F>(&self, wrap: F) -> Callback<T>
    where
        F: FnOnce(T) -> Event + Send + 'static,
    {
        Callback::new(self.sender.clone(), self.attempt, wrap)
    }

    fn post(&self, event: Event) {
        // Cannot fail, the receiver lives as long as `self`.
        let _ = self.sender.send(Envelope {
            attempt: self.attempt,
            event,
        });
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::simulation::{RecordingConsumer, SimulatedPlatform};

    fn fix() -> Fix {
        Fix::new(
            34.056_4,
            -117.195_6,
            Utc.with_ymd_and_hms(2016, 11, 3, 10, 30, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn stale_attempt_is_discarded() {
        let mut sequencer = Sequencer::new(
            SimulatedPlatform::new(true, true),
            RecordingConsumer::new(),
            LocationCache::new(),
            Messages::default(),
        );
        let _ = sequencer.start();
        assert!(sequencer.platform_mut().resolve_next());
        let _ = sequencer.pump();
        assert_eq!(sequencer.state(), &State::AwaitingFix);
        assert_eq!(sequencer.attempt(), 1);

        // An answer issued for an earlier attempt.
        let stale = Callback::new(sequencer.sender.clone(), 0, Event::FixResult);
        assert_eq!(stale.attempt(), 0);
        stale.resolve(Some(fix()));

        assert_eq!(sequencer.pump(), 0);
        assert_eq!(sequencer.state(), &State::AwaitingFix);
        assert!(sequencer.consumer().deliveries().is_empty());
        assert_eq!(sequencer.cache().current(), None);
    }
}
