// Session - countdown state machine
//
// Pure state: no threads, no sleeping. The caller passes monotonic timestamps
// and the session turns elapsed running time into whole-second ticks.
//
// Running time is banked on every pause, so the n-th tick happens when the
// total time spent Running reaches n seconds no matter how many pause/resume
// cycles occurred. Nothing counts sleep slices, so nothing drifts.

use super::{CountdownError, CountdownResult};
use crate::messaging::event::SessionEvent;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Idle = 0,
    Running = 1,
    Paused = 2,
    Completed = 3,
    Cancelled = 4,
}

impl Phase {
    /// Running or Paused: a tick loop owns the session
    pub fn is_active(&self) -> bool {
        matches!(self, Phase::Running | Phase::Paused)
    }

    /// Completed or Cancelled: the tick loop has exited or is exiting
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Cancelled)
    }
}

impl From<u8> for Phase {
    fn from(value: u8) -> Self {
        match value {
            1 => Phase::Running,
            2 => Phase::Paused,
            3 => Phase::Completed,
            4 => Phase::Cancelled,
            _ => Phase::Idle,
        }
    }
}

/// Read-only phase snapshot published by the tick loop
#[derive(Clone, Debug, Default)]
pub struct AtomicPhase {
    inner: Arc<AtomicU8>,
}

impl AtomicPhase {
    pub fn new(phase: Phase) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(phase as u8)),
        }
    }

    pub fn get(&self) -> Phase {
        Phase::from(self.inner.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, phase: Phase) {
        self.inner.store(phase as u8, Ordering::Release);
    }
}

/// One countdown
#[derive(Debug, Clone)]
pub struct Session {
    total_duration: u32,
    remaining: u32,
    phase: Phase,
    last_reminder_mark: u32,
    interval_seconds: Option<u32>,
    /// Running time accumulated before the current running stretch
    banked: Duration,
    /// Clock time at which the current running stretch began
    running_since: Option<Duration>,
}

impl Session {
    /// Create a Running session at clock time `now`
    ///
    /// An interval of zero disables reminders.
    pub fn start(
        duration_seconds: u32,
        interval_seconds: Option<u32>,
        now: Duration,
    ) -> CountdownResult<Self> {
        if duration_seconds == 0 {
            return Err(CountdownError::InvalidDuration(
                "duration must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            total_duration: duration_seconds,
            remaining: duration_seconds,
            phase: Phase::Running,
            last_reminder_mark: duration_seconds,
            interval_seconds: interval_seconds.filter(|&i| i > 0),
            banked: Duration::ZERO,
            running_since: Some(now),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn total_duration(&self) -> u32 {
        self.total_duration
    }

    pub fn interval_seconds(&self) -> Option<u32> {
        self.interval_seconds
    }

    pub fn last_reminder_mark(&self) -> u32 {
        self.last_reminder_mark
    }

    /// Total time spent Running up to `now`
    pub fn running_time(&self, now: Duration) -> Duration {
        match self.running_since {
            Some(since) => self.banked + now.saturating_sub(since),
            None => self.banked,
        }
    }

    /// Restart the running-time origin of a session that has not advanced yet
    pub fn anchor(&mut self, now: Duration) {
        if self.phase == Phase::Running && self.banked.is_zero() {
            self.running_since = Some(now);
        }
    }

    pub fn pause(&mut self, now: Duration) -> CountdownResult<()> {
        if self.phase != Phase::Running {
            return Err(self.invalid("pause"));
        }
        self.bank(now);
        self.phase = Phase::Paused;
        Ok(())
    }

    pub fn resume(&mut self, now: Duration) -> CountdownResult<()> {
        if self.phase != Phase::Paused {
            return Err(self.invalid("resume"));
        }
        self.running_since = Some(now);
        self.phase = Phase::Running;
        Ok(())
    }

    pub fn cancel(&mut self, now: Duration) -> CountdownResult<()> {
        if !self.phase.is_active() {
            return Err(self.invalid("cancel"));
        }
        self.bank(now);
        self.phase = Phase::Cancelled;
        Ok(())
    }

    /// Consume every whole second of running time up to `now`
    ///
    /// Returns the resulting events in emission order. Completion is always
    /// last and no reminder is produced for the second that reaches zero.
    pub fn advance(&mut self, now: Duration) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.phase != Phase::Running {
            return events;
        }

        let target = self
            .running_time(now)
            .as_secs()
            .min(self.total_duration as u64) as u32;

        while self.consumed() < target {
            self.remaining -= 1;
            events.push(SessionEvent::Tick {
                remaining: self.remaining,
            });

            if self.remaining == 0 {
                self.bank(now);
                self.phase = Phase::Completed;
                events.push(SessionEvent::StateChanged(Phase::Completed));
                events.push(SessionEvent::Completed);
                break;
            }

            if let Some(interval) = self.interval_seconds
                && self.last_reminder_mark - self.remaining >= interval
            {
                self.last_reminder_mark = self.remaining;
                events.push(SessionEvent::IntervalReminder {
                    elapsed_minutes: self.consumed() / 60,
                });
            }
        }

        events
    }

    /// Clock time at which the next second will be consumed (Running only)
    pub fn next_deadline(&self) -> Option<Duration> {
        let since = self.running_since?;
        if self.phase != Phase::Running {
            return None;
        }
        let next_second = Duration::from_secs(self.consumed() as u64 + 1);
        Some(since + next_second.saturating_sub(self.banked))
    }

    fn consumed(&self) -> u32 {
        self.total_duration - self.remaining
    }

    fn bank(&mut self, now: Duration) {
        if let Some(since) = self.running_since.take() {
            self.banked += now.saturating_sub(since);
        }
    }

    fn invalid(&self, command: &'static str) -> CountdownError {
        CountdownError::InvalidCommand {
            command,
            phase: self.phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn reminders(events: &[SessionEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SessionEvent::IntervalReminder { .. }))
            .count()
    }

    /// Run a session to completion, advancing once per second
    fn run_to_completion(duration: u32, interval: Option<u32>) -> Vec<SessionEvent> {
        let mut session = Session::start(duration, interval, Duration::ZERO).unwrap();
        let mut events = Vec::new();
        for second in 1..=duration as u64 {
            events.extend(session.advance(Duration::from_secs(second)));
        }
        assert_eq!(session.phase(), Phase::Completed);
        events
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        let result = Session::start(0, None, Duration::ZERO);
        assert!(matches!(result, Err(CountdownError::InvalidDuration(_))));
    }

    #[test]
    fn test_one_second_session() {
        let mut session = Session::start(1, None, Duration::ZERO).unwrap();

        assert!(session.advance(secs(0.999)).is_empty());
        assert_eq!(session.phase(), Phase::Running);

        let events = session.advance(secs(1.0));
        assert_eq!(
            events,
            vec![
                SessionEvent::Tick { remaining: 0 },
                SessionEvent::StateChanged(Phase::Completed),
                SessionEvent::Completed,
            ]
        );
        assert_eq!(session.phase(), Phase::Completed);
        assert!(session.advance(secs(5.0)).is_empty());
    }

    #[test]
    fn test_anchor_moves_the_first_second() {
        let mut session = Session::start(1, None, Duration::ZERO).unwrap();
        session.anchor(Duration::from_millis(500));

        let later = Duration::from_millis(1200);
        assert!(session.advance(later).is_empty());
        assert_eq!(session.running_time(later), Duration::from_millis(700));
        assert_eq!(session.advance(Duration::from_millis(1500)).len(), 3);
    }

    #[test]
    fn test_three_minutes_with_one_minute_interval() {
        let events = run_to_completion(180, Some(60));

        let reminder_positions: Vec<u32> = events
            .windows(2)
            .filter_map(|pair| match pair {
                [SessionEvent::Tick { remaining }, SessionEvent::IntervalReminder { .. }] => {
                    Some(*remaining)
                }
                _ => None,
            })
            .collect();
        assert_eq!(reminder_positions, vec![120, 60]);
        assert!(events.contains(&SessionEvent::IntervalReminder { elapsed_minutes: 1 }));
        assert!(events.contains(&SessionEvent::IntervalReminder { elapsed_minutes: 2 }));
        assert_eq!(events.last(), Some(&SessionEvent::Completed));
    }

    #[test]
    fn test_reminder_count_formula() {
        for duration in [1u32, 2, 5, 59, 60, 61, 119, 120, 121, 180, 181] {
            for interval in [1u32, 2, 7, 30, 60, 90] {
                let events = run_to_completion(duration, Some(interval));
                let expected = ((duration - 1) / interval) as usize;
                assert_eq!(
                    reminders(&events),
                    expected,
                    "duration={} interval={}",
                    duration,
                    interval
                );
            }
        }
    }

    #[test]
    fn test_zero_interval_disables_reminders() {
        let events = run_to_completion(10, Some(0));
        assert_eq!(reminders(&events), 0);
    }

    #[test]
    fn test_ticks_strictly_decrease_and_catch_up() {
        let mut session = Session::start(10, None, Duration::ZERO).unwrap();

        // A stalled caller gets every missed second at once, in order
        let events = session.advance(secs(4.2));
        assert_eq!(
            events,
            vec![
                SessionEvent::Tick { remaining: 9 },
                SessionEvent::Tick { remaining: 8 },
                SessionEvent::Tick { remaining: 7 },
                SessionEvent::Tick { remaining: 6 },
            ]
        );
        assert_eq!(session.next_deadline(), Some(secs(5.0)));
    }

    #[test]
    fn test_pause_stops_consuming_time() {
        let mut session = Session::start(3, None, Duration::ZERO).unwrap();

        session.advance(secs(1.5));
        assert_eq!(session.remaining(), 2);

        session.pause(secs(1.5)).unwrap();
        assert!(session.advance(secs(100.0)).is_empty());
        assert_eq!(session.next_deadline(), None);

        session.resume(secs(100.0)).unwrap();
        // 0.5s of the second tick were already banked before the pause
        assert_eq!(session.next_deadline(), Some(secs(100.5)));
        assert!(session.advance(secs(100.49)).is_empty());
        assert_eq!(session.advance(secs(100.5)), vec![SessionEvent::Tick { remaining: 1 }]);
    }

    #[test]
    fn test_running_time_is_independent_of_pause_cycles() {
        const DURATION: u32 = 12;
        let step = Duration::from_millis(10);

        // Deterministic pseudo-random pause/resume pattern
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) % 150
        };

        for _ in 0..20 {
            let mut now = Duration::ZERO;
            let mut session = Session::start(DURATION, Some(5), now).unwrap();
            let mut completed_at = None;

            while completed_at.is_none() {
                let run_for = next() + 1;
                for _ in 0..run_for {
                    now += step;
                    let events = session.advance(now);
                    if events.contains(&SessionEvent::Completed) {
                        completed_at = Some(now);
                        break;
                    }
                }
                if completed_at.is_some() {
                    break;
                }

                session.pause(now).unwrap();
                now += step * (next() as u32);
                assert!(session.advance(now).is_empty());
                session.resume(now).unwrap();
            }

            let running = session.running_time(completed_at.unwrap());
            assert!(running >= Duration::from_secs(DURATION as u64));
            assert!(running < Duration::from_secs(DURATION as u64) + step * 2);
        }
    }

    #[test]
    fn test_invalid_transitions() {
        let mut session = Session::start(5, None, Duration::ZERO).unwrap();

        assert!(matches!(
            session.resume(secs(0.1)),
            Err(CountdownError::InvalidCommand { command: "resume", phase: Phase::Running })
        ));

        session.pause(secs(0.2)).unwrap();
        assert!(matches!(
            session.pause(secs(0.3)),
            Err(CountdownError::InvalidCommand { command: "pause", .. })
        ));

        session.cancel(secs(0.4)).unwrap();
        assert_eq!(session.phase(), Phase::Cancelled);
        assert!(session.cancel(secs(0.5)).is_err());
        assert!(session.resume(secs(0.5)).is_err());
        assert!(session.advance(secs(10.0)).is_empty());
        assert_eq!(session.remaining(), 5);
    }

    #[test]
    fn test_atomic_phase_roundtrip() {
        let phase = AtomicPhase::new(Phase::Idle);
        for p in [Phase::Running, Phase::Paused, Phase::Completed, Phase::Cancelled, Phase::Idle] {
            phase.set(p);
            assert_eq!(phase.get(), p);
        }
        assert_eq!(Phase::from(200), Phase::Idle);
    }
}
