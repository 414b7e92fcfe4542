// Countdown engine - owns the tick loop thread
//
// Control flows in over two paths: pause/resume through the SPSC command ring,
// cancellation through a shared flag. Both are checked every poll slice, so the
// loop reacts within POLL_SLICE. Progress flows out only as SessionEvents and
// the published phase snapshot.

use super::clock::Clock;
use super::session::{AtomicPhase, Phase, Session};
use super::{CountdownError, CountdownResult};
use crate::messaging::channels::{
    CommandConsumer, CommandProducer, EventSender, create_command_channel,
};
use crate::messaging::command::EngineCommand;
use crate::messaging::event::SessionEvent;
use crate::playback::ToneSink;
use crate::tone::{BuiltinTone, ToneRef};
use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, bounded};
use ringbuf::traits::{Consumer, Producer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Upper bound on any single sleep of the tick loop
pub const POLL_SLICE: Duration = Duration::from_millis(100);

/// How long `cancel` waits for the tick loop to exit
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

const COMMAND_CAPACITY: usize = 16;

/// Tones requested by the tick loop
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTones {
    pub reminder: ToneRef,
    pub completion: ToneRef,
}

impl Default for SessionTones {
    fn default() -> Self {
        Self {
            reminder: ToneRef::Builtin(BuiltinTone::REMINDER),
            completion: ToneRef::Builtin(BuiltinTone::DEFAULT_COMPLETION),
        }
    }
}

struct Worker {
    commands: CommandProducer,
    cancel: Arc<AtomicBool>,
    done: Receiver<()>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Raise the cancel flag and wait (bounded) for the loop to exit
    fn stop(&mut self, timeout: Duration) -> CountdownResult<()> {
        self.cancel.store(true, Ordering::Release);

        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(handle) = self.handle.take()
                    && handle.join().is_err()
                {
                    tracing::error!("Tick loop panicked");
                }
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => {
                // Leave the thread detached; it exits on its next poll
                self.handle = None;
                Err(CountdownError::EngineShutdownTimeout(timeout))
            }
        }
    }
}

/// Runs one countdown session at a time on a dedicated thread
pub struct CountdownEngine {
    clock: Arc<dyn Clock>,
    tones: Arc<dyn ToneSink>,
    session_tones: SessionTones,
    events: EventSender,
    phase: AtomicPhase,
    /// Phase implied by the last accepted command, ahead of the loop's snapshot
    requested: Phase,
    worker: Option<Worker>,
}

impl CountdownEngine {
    pub fn new(clock: Arc<dyn Clock>, tones: Arc<dyn ToneSink>, events: EventSender) -> Self {
        Self {
            clock,
            tones,
            session_tones: SessionTones::default(),
            events,
            phase: AtomicPhase::new(Phase::Idle),
            requested: Phase::Idle,
            worker: None,
        }
    }

    pub fn with_tones(mut self, session_tones: SessionTones) -> Self {
        self.session_tones = session_tones;
        self
    }

    pub fn session_tones(&self) -> &SessionTones {
        &self.session_tones
    }

    pub fn set_session_tones(&mut self, session_tones: SessionTones) {
        self.session_tones = session_tones;
    }

    /// Current phase as seen by callers
    ///
    /// Terminal phases come from the loop; otherwise the last accepted command
    /// wins, so a pause immediately followed by a resume is accepted.
    pub fn phase(&self) -> Phase {
        let published = self.phase.get();
        if self.worker.is_none() || published.is_terminal() {
            published
        } else {
            self.requested
        }
    }

    /// Shared snapshot of the loop's phase
    pub fn phase_handle(&self) -> AtomicPhase {
        self.phase.clone()
    }

    /// Begin a countdown of `duration_seconds`
    ///
    /// Rejected while another session is Running or Paused.
    pub fn start(
        &mut self,
        duration_seconds: u32,
        interval_seconds: Option<u32>,
    ) -> CountdownResult<()> {
        let current = self.phase();
        if current.is_active() {
            return Err(CountdownError::InvalidCommand {
                command: "start",
                phase: current,
            });
        }

        let mut session = Session::start(duration_seconds, interval_seconds, Duration::ZERO)?;
        self.reap()?;
        session.anchor(self.clock.now());

        let (commands, consumer) = create_command_channel(COMMAND_CAPACITY);
        let cancel = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = bounded(1);

        self.phase.set(Phase::Running);
        self.requested = Phase::Running;
        let _ = self.events.send(SessionEvent::StateChanged(Phase::Running));

        let tick_loop = TickLoop {
            session,
            clock: Arc::clone(&self.clock),
            tones: Arc::clone(&self.tones),
            session_tones: self.session_tones.clone(),
            events: self.events.clone(),
            phase: self.phase.clone(),
            commands: consumer,
            cancel: Arc::clone(&cancel),
            done: done_tx,
        };

        let handle = thread::Builder::new()
            .name("countdown-tick".to_string())
            .spawn(move || tick_loop.run())
            .map_err(|e| {
                self.phase.set(Phase::Idle);
                self.requested = Phase::Idle;
                CountdownError::Spawn(e.to_string())
            })?;

        tracing::info!(
            duration_seconds,
            interval_seconds = interval_seconds.unwrap_or(0),
            "Countdown started"
        );

        self.worker = Some(Worker {
            commands,
            cancel,
            done: done_rx,
            handle: Some(handle),
        });
        Ok(())
    }

    pub fn pause(&mut self) -> CountdownResult<()> {
        self.send_command(EngineCommand::Pause, "pause", Phase::Running, Phase::Paused)
    }

    pub fn resume(&mut self) -> CountdownResult<()> {
        self.send_command(EngineCommand::Resume, "resume", Phase::Paused, Phase::Running)
    }

    /// Stop the session and wait up to SHUTDOWN_TIMEOUT for the loop to exit
    pub fn cancel(&mut self) -> CountdownResult<()> {
        let current = self.phase();
        let Some(worker) = self.worker.as_mut().filter(|_| current.is_active()) else {
            return Err(CountdownError::InvalidCommand {
                command: "cancel",
                phase: current,
            });
        };

        self.requested = Phase::Cancelled;
        let result = worker.stop(SHUTDOWN_TIMEOUT);
        match &result {
            Ok(()) => tracing::info!("Countdown cancelled"),
            Err(e) => tracing::warn!("{}", e),
        }
        result
    }

    fn send_command(
        &mut self,
        command: EngineCommand,
        name: &'static str,
        from: Phase,
        to: Phase,
    ) -> CountdownResult<()> {
        let current = self.phase();
        let worker = match self.worker.as_mut() {
            Some(worker) if current == from => worker,
            _ => {
                return Err(CountdownError::InvalidCommand {
                    command: name,
                    phase: current,
                });
            }
        };

        worker
            .commands
            .try_push(command)
            .map_err(|_| CountdownError::CommandQueueFull(name))?;
        self.requested = to;
        Ok(())
    }

    /// Retire the previous session's loop; it must have exited or exit now
    fn reap(&mut self) -> CountdownResult<()> {
        if let Some(worker) = self.worker.as_mut() {
            worker.stop(SHUTDOWN_TIMEOUT)?;
        }
        self.worker = None;
        Ok(())
    }
}

impl Drop for CountdownEngine {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.as_mut()
            && let Err(e) = worker.stop(SHUTDOWN_TIMEOUT)
        {
            tracing::warn!("Engine dropped with running tick loop: {}", e);
        }
    }
}

/// State moved onto the tick thread
struct TickLoop {
    session: Session,
    clock: Arc<dyn Clock>,
    tones: Arc<dyn ToneSink>,
    session_tones: SessionTones,
    events: EventSender,
    phase: AtomicPhase,
    commands: CommandConsumer,
    cancel: Arc<AtomicBool>,
    done: Sender<()>,
}

impl TickLoop {
    fn run(mut self) {
        loop {
            if self.cancel.load(Ordering::Acquire) {
                if self.session.cancel(self.clock.now()).is_ok() {
                    self.transition(Phase::Cancelled);
                }
                break;
            }

            while let Some(command) = self.commands.try_pop() {
                self.apply(command);
            }

            let now = self.clock.now();
            for event in self.session.advance(now) {
                self.emit(event);
            }

            if self.session.phase() == Phase::Completed {
                tracing::info!("Countdown completed");
                break;
            }

            let wait = self
                .session
                .next_deadline()
                .map_or(POLL_SLICE, |deadline| {
                    deadline.saturating_sub(now).min(POLL_SLICE)
                });
            self.clock.sleep(wait);
        }

        let _ = self.done.send(());
    }

    fn apply(&mut self, command: EngineCommand) {
        let now = self.clock.now();
        let result = match command {
            EngineCommand::Pause => {
                // Seconds that elapsed before the pause still count
                for event in self.session.advance(now) {
                    self.emit(event);
                }
                if self.session.phase() == Phase::Completed {
                    return;
                }
                self.session.pause(now).map(|_| Phase::Paused)
            }
            EngineCommand::Resume => self.session.resume(now).map(|_| Phase::Running),
        };

        match result {
            Ok(phase) => {
                tracing::debug!(remaining = self.session.remaining(), "Countdown {:?}", phase);
                self.transition(phase);
            }
            Err(e) => tracing::warn!("Ignoring command: {}", e),
        }
    }

    fn emit(&self, event: SessionEvent) {
        match event {
            SessionEvent::IntervalReminder { elapsed_minutes } => {
                tracing::debug!(elapsed_minutes, "Interval reminder");
                self.tones.play(&self.session_tones.reminder);
            }
            SessionEvent::StateChanged(phase) => self.phase.set(phase),
            SessionEvent::Completed => self.tones.play(&self.session_tones.completion),
            SessionEvent::Tick { .. } => {}
        }
        let _ = self.events.send(event);
    }

    fn transition(&self, phase: Phase) {
        self.emit(SessionEvent::StateChanged(phase));
    }
}
