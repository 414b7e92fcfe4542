// Pomodoro - command surface for a presentation layer
//
// Wires preferences, the sound cache, the dispatcher and the engine together.
// Minutes in, seconds to the engine; events out through the receiver handed
// to the presentation side once.

use crate::messaging::channels::{EventReceiver, create_event_channel};
use crate::messaging::event::EventPump;
use crate::playback::{NotificationDispatcher, PlaybackResult};
use crate::preferences::Preferences;
use crate::timer::{
    Clock, CountdownEngine, CountdownError, CountdownResult, MonotonicClock, Phase, SessionTones,
};
use crate::tone::{BuiltinTone, ToneRef};
use std::sync::Arc;

pub struct Pomodoro {
    engine: CountdownEngine,
    dispatcher: NotificationDispatcher,
    preferences: Preferences,
    events: Option<EventReceiver>,
}

impl Pomodoro {
    pub fn new(preferences: Preferences, dispatcher: NotificationDispatcher) -> Self {
        Self::with_clock(preferences, dispatcher, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(
        preferences: Preferences,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (events_tx, events_rx) = create_event_channel();
        let tones = SessionTones {
            reminder: ToneRef::Builtin(BuiltinTone::REMINDER),
            completion: preferences.completion_tone(),
        };
        let engine = CountdownEngine::new(clock, Arc::new(dispatcher.clone()), events_tx)
            .with_tones(tones);

        Self {
            engine,
            dispatcher,
            preferences,
            events: Some(events_rx),
        }
    }

    /// Hand the event stream to the presentation side (first call only)
    pub fn take_events(&mut self) -> Option<EventReceiver> {
        self.events.take()
    }

    /// `take_events` wrapped for observer-style consumers
    pub fn event_pump(&mut self) -> Option<EventPump> {
        self.take_events().map(EventPump::new)
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    /// Start a session of `duration_minutes`; a zero interval disables reminders
    pub fn start(
        &mut self,
        duration_minutes: u32,
        interval_minutes: Option<u32>,
    ) -> CountdownResult<()> {
        let duration_seconds = duration_minutes.checked_mul(60).ok_or_else(|| {
            CountdownError::InvalidDuration(format!("{} minutes is too long", duration_minutes))
        })?;
        let interval_seconds = interval_minutes.map(|m| m.saturating_mul(60));

        self.engine.start(duration_seconds, interval_seconds)
    }

    /// Start from user-typed minutes, using the configured interval
    pub fn start_from_input(&mut self, input: &str) -> CountdownResult<()> {
        let minutes = parse_minutes(input)?;
        let interval = self.preferences.interval_seconds().map(|s| s / 60);
        self.start(minutes, interval)
    }

    /// Start a session with every setting taken from the preferences
    pub fn start_default(&mut self) -> CountdownResult<()> {
        let interval = self.preferences.interval_seconds();
        self.engine
            .start(self.preferences.default_seconds(), interval)
    }

    pub fn pause(&mut self) -> CountdownResult<()> {
        self.engine.pause()
    }

    pub fn resume(&mut self) -> CountdownResult<()> {
        self.engine.resume()
    }

    /// Pause when running, resume when paused
    pub fn toggle_pause(&mut self) -> CountdownResult<()> {
        match self.engine.phase() {
            Phase::Paused => self.engine.resume(),
            _ => self.engine.pause(),
        }
    }

    pub fn cancel(&mut self) -> CountdownResult<()> {
        self.engine.cancel()
    }

    /// Play a tone now, on the calling thread
    pub fn preview(&self, tone: &ToneRef) -> PlaybackResult<&'static str> {
        self.dispatcher.play_blocking(tone)
    }
}

/// Longest session accepted from typed input
pub const MAX_INPUT_MINUTES: u32 = 999;

/// Parse a whole number of minutes in `1..=MAX_INPUT_MINUTES`
pub fn parse_minutes(input: &str) -> CountdownResult<u32> {
    let trimmed = input.trim();
    match trimmed.parse::<u32>() {
        Ok(0) => Err(CountdownError::InvalidDuration(
            "duration must be greater than zero".to_string(),
        )),
        Ok(minutes) if minutes > MAX_INPUT_MINUTES => Err(CountdownError::InvalidDuration(
            format!("at most {} minutes", MAX_INPUT_MINUTES),
        )),
        Ok(minutes) => Ok(minutes),
        Err(_) => Err(CountdownError::InvalidDuration(format!(
            "'{}' is not a whole number of minutes",
            trimmed
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::event::SessionEvent;
    use crate::playback::{Beeper, PlaybackBackend};
    use crate::timer::ManualClock;
    use crate::tone::SoundCache;
    use std::time::Duration;
    use tempfile::TempDir;

    struct SilentBell;

    impl Beeper for SilentBell {
        fn beep(&self) -> PlaybackResult<()> {
            Ok(())
        }
    }

    fn pomodoro(preferences: Preferences) -> (Pomodoro, TempDir) {
        pomodoro_with_clock(preferences, Arc::new(ManualClock::new()))
    }

    fn pomodoro_with_clock(preferences: Preferences, clock: Arc<dyn Clock>) -> (Pomodoro, TempDir) {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(SoundCache::new(dir.path()).unwrap());
        let backends: Vec<Box<dyn PlaybackBackend>> = Vec::new();
        let dispatcher = NotificationDispatcher::new(cache, backends, Box::new(SilentBell));
        let pomodoro = Pomodoro::with_clock(preferences, dispatcher, clock);
        (pomodoro, dir)
    }

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_minutes(" 25 "), Ok(25));
        assert_eq!(parse_minutes("999"), Ok(MAX_INPUT_MINUTES));
        for bad in ["", "abc", "0", "-5", "2.5", "1000", "4294967295"] {
            assert!(
                matches!(parse_minutes(bad), Err(CountdownError::InvalidDuration(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_bad_input_does_not_start() {
        let (mut pomodoro, _dir) = pomodoro(Preferences::default());

        assert!(pomodoro.start_from_input("abc").is_err());
        assert!(pomodoro.start(0, None).is_err());
        assert!(pomodoro.start(u32::MAX, None).is_err());
        assert_eq!(pomodoro.phase(), Phase::Idle);
    }

    #[test]
    fn test_session_reports_minutes() {
        let (mut pomodoro, _dir) = pomodoro(Preferences::default());
        let events = pomodoro.take_events().unwrap();
        assert!(pomodoro.take_events().is_none());

        pomodoro.start(3, Some(1)).unwrap();

        let mut reminders = Vec::new();
        loop {
            match events.recv_timeout(Duration::from_secs(10)).unwrap() {
                SessionEvent::IntervalReminder { elapsed_minutes } => {
                    reminders.push(elapsed_minutes)
                }
                SessionEvent::Completed => break,
                _ => {}
            }
        }
        assert_eq!(reminders, vec![1, 2]);
        assert_eq!(pomodoro.phase(), Phase::Completed);
    }

    #[test]
    fn test_toggle_pause_and_cancel() {
        let (mut pomodoro, _dir) =
            pomodoro_with_clock(Preferences::default(), Arc::new(MonotonicClock::new()));

        pomodoro.start_default().unwrap();
        pomodoro.toggle_pause().unwrap();
        assert_eq!(pomodoro.phase(), Phase::Paused);
        pomodoro.toggle_pause().unwrap();
        assert_eq!(pomodoro.phase(), Phase::Running);

        pomodoro.cancel().unwrap();
        assert_eq!(pomodoro.phase(), Phase::Cancelled);
    }

    #[test]
    fn test_preview_renders_builtin_tone() {
        let (pomodoro, dir) = pomodoro(Preferences::default());

        let tier = pomodoro.preview(&ToneRef::Builtin(BuiltinTone::Bell)).unwrap();
        assert_eq!(tier, "beep");
        assert!(dir.path().join("bell.wav").exists());
    }
}
