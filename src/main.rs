// Pomodoro - terminal front end

use clap::{Parser, Subcommand};
use crossbeam::channel::{Receiver, TryRecvError, unbounded};
use pomodoro::playback::NotificationDispatcher;
use pomodoro::timer::CountdownError;
use pomodoro::{
    BuiltinTone, Phase, Pomodoro, Preferences, SessionEvent, SessionObserver, SoundCache, ToneRef,
    logging, parse_minutes,
};
use std::error::Error;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const EVENT_POLL: Duration = Duration::from_millis(100);
const PLAYBACK_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "pomodoro")]
#[command(about = "Countdown timer with interval reminders and synthesized alerts", long_about = None)]
struct Cli {
    /// Preferences file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for rendered tone files (defaults to the platform cache directory)
    #[arg(long, global = true)]
    sound_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a countdown session (p = pause/resume, r = resume, c = cancel)
    Run {
        /// Session length in minutes
        #[arg(short, long)]
        minutes: Option<String>,

        /// Reminder interval in minutes (0 disables reminders)
        #[arg(short, long)]
        interval: Option<u32>,

        /// Completion tone: built-in name, catalogue index or file path
        #[arg(short, long)]
        tone: Option<ToneRef>,
    },

    /// Play a tone once
    Preview {
        /// Built-in name, catalogue index or file path
        tone: ToneRef,
    },

    /// Pre-generate every built-in tone
    Render,

    /// List the built-in tones
    List,
}

/// Renders session events on stdout
struct TerminalObserver {
    out: std::io::Stdout,
}

impl TerminalObserver {
    fn new() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "\n{}", text);
        let _ = self.out.flush();
    }
}

impl SessionObserver for TerminalObserver {
    fn tick(&mut self, remaining_seconds: u32) {
        let _ = write!(self.out, "\r{}  ", format_clock(remaining_seconds));
        let _ = self.out.flush();
    }

    fn interval_reminder(&mut self, elapsed_minutes: u32) {
        self.line(&format!("Reminder: {} min elapsed", elapsed_minutes));
    }

    fn completed(&mut self) {
        self.line("Time's up!");
    }

    fn state_changed(&mut self, phase: Phase) {
        match phase {
            Phase::Paused => self.line("Paused (p to resume)"),
            Phase::Cancelled => self.line("Cancelled"),
            _ => {}
        }
    }
}

fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Forward stdin lines to the main thread
fn spawn_input_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    let spawned = thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line.trim().to_lowercase()).is_err() {
                    break;
                }
            }
        });

    if let Err(e) = spawned {
        tracing::warn!("Keyboard control unavailable: {}", e);
    }
    rx
}

fn run_session(
    mut pomodoro: Pomodoro,
    minutes: Option<String>,
    interval: Option<u32>,
) -> Result<(), Box<dyn Error>> {
    let Some(pump) = pomodoro.event_pump() else {
        return Err("event stream already taken".into());
    };

    match (minutes, interval) {
        (Some(minutes), Some(interval)) => {
            pomodoro.start(parse_minutes(&minutes)?, Some(interval))?
        }
        (Some(minutes), None) => pomodoro.start_from_input(&minutes)?,
        (None, Some(interval)) => {
            let minutes = pomodoro.preferences().default_seconds() / 60;
            pomodoro.start(minutes, Some(interval))?
        }
        (None, None) => pomodoro.start_default()?,
    }

    let mut observer = TerminalObserver::new();
    let input = spawn_input_reader();
    let mut input_open = true;

    loop {
        while input_open {
            let command = match input.try_recv() {
                Ok(command) => command,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    input_open = false;
                    break;
                }
            };

            let result = match command.as_str() {
                "p" | "pause" => pomodoro.toggle_pause(),
                "r" | "resume" => pomodoro.resume(),
                "c" | "cancel" | "q" | "quit" => pomodoro.cancel(),
                "" => Ok(()),
                other => {
                    observer.line(&format!("Unknown command '{}' (p, r, c)", other));
                    Ok(())
                }
            };

            match result {
                Err(e @ CountdownError::EngineShutdownTimeout(_)) => return Err(e.into()),
                Err(e) => tracing::warn!("{}", e),
                Ok(()) => {}
            }
        }

        if let Some(event) = pump.pump_once(&mut observer, EVENT_POLL) {
            if matches!(
                event,
                SessionEvent::Completed | SessionEvent::StateChanged(Phase::Cancelled)
            ) {
                break;
            }
        }
    }

    // Let the completion tone finish before the process exits
    if !pomodoro.dispatcher().wait_idle(PLAYBACK_DRAIN_TIMEOUT) {
        tracing::warn!("Tone playback still running at exit");
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut preferences = match &cli.config {
        Some(path) => Preferences::load_from(path),
        None => Preferences::load(),
    };

    let sound_dir = cli.sound_dir.unwrap_or_else(SoundCache::default_dir);
    let cache = Arc::new(SoundCache::new(&sound_dir)?);
    tracing::debug!(sound_dir = %sound_dir.display(), "Sound cache ready");

    match cli.command.unwrap_or(Commands::Run {
        minutes: None,
        interval: None,
        tone: None,
    }) {
        Commands::Run {
            minutes,
            interval,
            tone,
        } => {
            match tone {
                Some(ToneRef::File(path)) => preferences.sound_path = Some(path),
                Some(ToneRef::Builtin(builtin)) => {
                    preferences.sound_path = None;
                    preferences.builtin_tone_index = builtin.index();
                }
                None => {}
            }

            let dispatcher = NotificationDispatcher::with_default_backends(cache);
            run_session(Pomodoro::new(preferences, dispatcher), minutes, interval)
        }
        Commands::Preview { tone } => {
            let dispatcher = NotificationDispatcher::with_default_backends(cache);
            let tier = dispatcher.play_blocking(&tone)?;
            println!("Played {} via {}", tone, tier);
            Ok(())
        }
        Commands::Render => {
            for (tone, path) in cache.render_all()? {
                println!("{:<12} {}", tone.name(), path.display());
            }
            Ok(())
        }
        Commands::List => {
            for tone in BuiltinTone::ALL {
                println!("{}  {:<12} {}", tone.index(), tone.name(), tone.display_name());
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    logging::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
