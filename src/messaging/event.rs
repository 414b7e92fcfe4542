// Session events - tick loop -> presentation
//
// The presentation layer never reads engine internals; it consumes these
// events on its own thread, either directly from the channel or through a
// `SessionObserver`.

use crate::messaging::channels::EventReceiver;
use crate::timer::Phase;
use crossbeam::channel::RecvTimeoutError;
use std::time::Duration;

/// Everything the countdown reports to the outside world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// One second consumed; carries the new remaining time
    Tick { remaining: u32 },
    /// An interval elapsed; minutes since the session started
    IntervalReminder { elapsed_minutes: u32 },
    /// Countdown reached zero. Always the last event of a session.
    Completed,
    StateChanged(Phase),
}

/// Presentation callback surface
///
/// All methods default to no-ops so observers implement only what they display.
pub trait SessionObserver {
    fn tick(&mut self, _remaining_seconds: u32) {}
    fn interval_reminder(&mut self, _elapsed_minutes: u32) {}
    fn completed(&mut self) {}
    fn state_changed(&mut self, _phase: Phase) {}
}

/// Route one event to the matching observer callback
pub fn dispatch_event(event: SessionEvent, observer: &mut dyn SessionObserver) {
    match event {
        SessionEvent::Tick { remaining } => observer.tick(remaining),
        SessionEvent::IntervalReminder { elapsed_minutes } => {
            observer.interval_reminder(elapsed_minutes)
        }
        SessionEvent::Completed => observer.completed(),
        SessionEvent::StateChanged(phase) => observer.state_changed(phase),
    }
}

/// Drives a `SessionObserver` from the event channel on the presentation thread
pub struct EventPump {
    events: EventReceiver,
}

impl EventPump {
    pub fn new(events: EventReceiver) -> Self {
        Self { events }
    }

    /// Deliver every pending event without blocking; returns how many were delivered
    pub fn drain(&self, observer: &mut dyn SessionObserver) -> usize {
        let mut delivered = 0;
        while let Ok(event) = self.events.try_recv() {
            dispatch_event(event, observer);
            delivered += 1;
        }
        delivered
    }

    /// Wait up to `timeout` for one event and deliver it
    ///
    /// Returns `None` on timeout, or when every sender is gone.
    pub fn pump_once(
        &self,
        observer: &mut dyn SessionObserver,
        timeout: Duration,
    ) -> Option<SessionEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => {
                dispatch_event(event, observer);
                Some(event)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}
