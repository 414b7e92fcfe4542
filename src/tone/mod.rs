// Tone module - procedural notification sounds
// Descriptor -> samples -> 16-bit WAV file, cached on disk per tone name

pub mod builtin;
pub mod cache;
pub mod descriptor;
pub mod generator;
pub mod wav;

pub use builtin::BuiltinTone;
pub use cache::{RenderedTone, SoundCache};
pub use descriptor::{Envelope, Pitch, SAMPLE_RATE, ToneComponent, ToneDescriptor};
pub use generator::{generate, sample_count};
pub use wav::{WavHeader, quantize, read_header, write_wav};

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Tone synthesis and encoding errors
#[derive(Debug, Error)]
pub enum ToneError {
    #[error("Failed to write tone file {path:?}: {reason}")]
    EncodeWriteFailed { path: PathBuf, reason: String },

    #[error("Unknown tone: {0}")]
    UnknownTone(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

pub type ToneResult<T> = Result<T, ToneError>;

/// Reference to something playable: a built-in tone or a user file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToneRef {
    Builtin(BuiltinTone),
    File(PathBuf),
}

impl fmt::Display for ToneRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToneRef::Builtin(tone) => write!(f, "{}", tone.name()),
            ToneRef::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl FromStr for ToneRef {
    type Err = ToneError;

    /// Accepts a built-in name ("ding"), a catalogue index ("2") or a file path
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ToneError::UnknownTone(String::new()));
        }
        if let Some(tone) = BuiltinTone::from_name(s) {
            return Ok(ToneRef::Builtin(tone));
        }
        if let Ok(index) = s.parse::<usize>() {
            return BuiltinTone::from_index(index)
                .map(ToneRef::Builtin)
                .ok_or_else(|| ToneError::UnknownTone(s.to_string()));
        }
        Ok(ToneRef::File(PathBuf::from(s)))
    }
}
