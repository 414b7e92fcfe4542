// Pomodoro - Library exports for the binary, tests and benchmarks

pub mod logging;
pub mod messaging;
pub mod playback;
pub mod pomodoro;
pub mod preferences;
pub mod timer;
pub mod tone;

// Re-export commonly used types for convenience
pub use messaging::{EventPump, SessionEvent, SessionObserver, create_event_channel};
pub use playback::{NotificationDispatcher, PlaybackError, ToneSink};
pub use pomodoro::{Pomodoro, parse_minutes};
pub use preferences::Preferences;
pub use timer::{
    Clock, CountdownEngine, CountdownError, ManualClock, MonotonicClock, Phase, SessionTones,
};
pub use tone::{BuiltinTone, SoundCache, ToneDescriptor, ToneError, ToneRef};
