// Playback module - ranked fallback chain for notification tones

pub mod backend;
pub mod dispatcher;

pub use backend::{
    Beeper, MixerBackend, PlaybackBackend, SystemPlayer, SystemPlayerBackend, TerminalBell,
};
pub use dispatcher::{BEEP_TIER, NotificationDispatcher};

use crate::tone::ToneRef;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("No playback method succeeded for {0}")]
    PlaybackUnavailable(String),

    #[error("{backend} failed: {reason}")]
    BackendFailed {
        backend: &'static str,
        reason: String,
    },
}

pub type PlaybackResult<T> = Result<T, PlaybackError>;

/// Where the tick loop sends tone requests
///
/// Implementations must return promptly; the caller is the tick thread.
pub trait ToneSink: Send + Sync {
    fn play(&self, tone: &ToneRef);
}
