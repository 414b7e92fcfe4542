// Playback backends
//
// Each backend plays one file to the end and reports failure; ranking and
// fallback live in the dispatcher.

use super::{PlaybackError, PlaybackResult};
use cpal::traits::HostTrait;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub trait PlaybackBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Cheap capability check, run before every attempt
    fn is_available(&self) -> bool;

    /// Play `path` and block until it finishes
    fn play_file(&self, path: &Path) -> PlaybackResult<()>;
}

/// Last-resort audible signal that needs no file
pub trait Beeper: Send + Sync {
    fn beep(&self) -> PlaybackResult<()>;
}

/// In-process mixer on the default output device
#[derive(Debug, Default, Clone, Copy)]
pub struct MixerBackend;

impl MixerBackend {
    pub fn new() -> Self {
        Self
    }

    fn failed(reason: impl ToString) -> PlaybackError {
        PlaybackError::BackendFailed {
            backend: "mixer",
            reason: reason.to_string(),
        }
    }
}

impl PlaybackBackend for MixerBackend {
    fn name(&self) -> &'static str {
        "mixer"
    }

    fn is_available(&self) -> bool {
        cpal::default_host().default_output_device().is_some()
    }

    fn play_file(&self, path: &Path) -> PlaybackResult<()> {
        use rodio::{Decoder, OutputStream, Sink};

        let (_stream, stream_handle) = OutputStream::try_default().map_err(Self::failed)?;
        let file = File::open(path).map_err(Self::failed)?;
        let source = Decoder::new(BufReader::new(file)).map_err(Self::failed)?;
        let sink = Sink::try_new(&stream_handle).map_err(Self::failed)?;

        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }
}

/// Platform command-line players, in preference order per OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemPlayer {
    PulseAudio,
    Alsa,
    CoreAudio,
    PowerShell,
}

impl SystemPlayer {
    pub fn candidates() -> &'static [SystemPlayer] {
        if cfg!(target_os = "macos") {
            &[SystemPlayer::CoreAudio]
        } else if cfg!(target_os = "windows") {
            &[SystemPlayer::PowerShell]
        } else {
            &[SystemPlayer::PulseAudio, SystemPlayer::Alsa]
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            SystemPlayer::PulseAudio => "paplay",
            SystemPlayer::Alsa => "aplay",
            SystemPlayer::CoreAudio => "afplay",
            SystemPlayer::PowerShell => "powershell",
        }
    }

    fn args(&self, path: &Path) -> Vec<OsString> {
        match self {
            SystemPlayer::PulseAudio | SystemPlayer::CoreAudio => vec![path.into()],
            SystemPlayer::Alsa => vec!["-q".into(), path.into()],
            SystemPlayer::PowerShell => vec![
                "-NoProfile".into(),
                "-NonInteractive".into(),
                "-Command".into(),
                format!(
                    "(New-Object Media.SoundPlayer '{}').PlaySync()",
                    powershell_quote(path)
                )
                .into(),
            ],
        }
    }
}

/// Body of a single-quoted PowerShell literal; `'` doubles to `''`
fn powershell_quote(path: &Path) -> String {
    path.display().to_string().replace('\'', "''")
}

/// One-shot external player process
#[derive(Debug, Clone)]
pub struct SystemPlayerBackend {
    player: SystemPlayer,
    program: Option<PathBuf>,
}

impl SystemPlayerBackend {
    /// Pick the first candidate player found on PATH
    pub fn detect() -> Self {
        let candidates = SystemPlayer::candidates();
        for &player in candidates {
            if let Ok(program) = which::which(player.program()) {
                tracing::debug!(player = player.program(), "System player found");
                return Self {
                    player,
                    program: Some(program),
                };
            }
        }

        Self {
            player: candidates[0],
            program: None,
        }
    }

    pub fn with_program(player: SystemPlayer, program: Option<PathBuf>) -> Self {
        Self { player, program }
    }

    pub fn player(&self) -> SystemPlayer {
        self.player
    }
}

impl PlaybackBackend for SystemPlayerBackend {
    fn name(&self) -> &'static str {
        "system-player"
    }

    fn is_available(&self) -> bool {
        self.program.is_some()
    }

    fn play_file(&self, path: &Path) -> PlaybackResult<()> {
        let failed = |reason: String| PlaybackError::BackendFailed {
            backend: "system-player",
            reason,
        };

        let program = self
            .program
            .as_ref()
            .ok_or_else(|| failed(format!("{} not found", self.player.program())))?;

        let status = Command::new(program)
            .args(self.player.args(path))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| failed(e.to_string()))?;

        if status.success() {
            Ok(())
        } else {
            Err(failed(format!("{} exited with {}", self.player.program(), status)))
        }
    }
}

/// ASCII BEL on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl Beeper for TerminalBell {
    fn beep(&self) -> PlaybackResult<()> {
        let mut stdout = std::io::stdout();
        stdout
            .write_all(b"\x07")
            .and_then(|_| stdout.flush())
            .map_err(|e| PlaybackError::BackendFailed {
                backend: "terminal-bell",
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_are_not_empty() {
        assert!(!SystemPlayer::candidates().is_empty());
    }

    #[test]
    fn test_alsa_runs_quietly() {
        let args = SystemPlayer::Alsa.args(Path::new("/tmp/alarm.wav"));
        assert_eq!(args, vec![OsString::from("-q"), OsString::from("/tmp/alarm.wav")]);
    }

    #[test]
    fn test_powershell_quotes_path() {
        let args = SystemPlayer::PowerShell.args(Path::new("bell.wav"));
        let script = args.last().unwrap().to_string_lossy().to_string();
        assert!(script.contains("'bell.wav'"));
        assert!(script.ends_with("PlaySync()"));
    }

    #[test]
    fn test_powershell_escapes_apostrophes() {
        let path = Path::new(r"C:\Users\O'Brien\sounds\alarm.wav");
        let args = SystemPlayer::PowerShell.args(path);
        let script = args.last().unwrap().to_string_lossy().to_string();
        assert_eq!(
            script,
            r"(New-Object Media.SoundPlayer 'C:\Users\O''Brien\sounds\alarm.wav').PlaySync()"
        );

        let hostile = Path::new("x'); Remove-Item C:\\; ('.wav");
        let args = SystemPlayer::PowerShell.args(hostile);
        let script = args.last().unwrap().to_string_lossy().to_string();
        assert!(script.contains("'x''); Remove-Item"));
        assert_eq!(script.matches('\'').count() % 2, 0);
    }

    #[test]
    fn test_missing_player_is_unavailable() {
        let backend = SystemPlayerBackend::with_program(SystemPlayer::Alsa, None);
        assert!(!backend.is_available());

        let result = backend.play_file(Path::new("ding.wav"));
        assert!(matches!(
            result,
            Err(PlaybackError::BackendFailed { backend: "system-player", .. })
        ));
    }

    #[test]
    fn test_detected_player_matches_platform() {
        let backend = SystemPlayerBackend::detect();
        assert!(SystemPlayer::candidates().contains(&backend.player()));
    }
}
