// Notification dispatcher
//
// Resolves a ToneRef to a file, then walks the ranked backends until one
// plays it. The beeper is the floor: it runs when the file cannot be
// produced or every backend failed.

use super::backend::{Beeper, MixerBackend, PlaybackBackend, SystemPlayerBackend, TerminalBell};
use super::{PlaybackError, PlaybackResult, ToneSink};
use crate::tone::{SoundCache, ToneRef};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Name reported when the beeper tier handled a request
pub const BEEP_TIER: &str = "beep";

const IDLE_POLL: Duration = Duration::from_millis(20);

struct DispatcherInner {
    cache: Arc<SoundCache>,
    backends: Vec<Box<dyn PlaybackBackend>>,
    beeper: Box<dyn Beeper>,
    failures: AtomicUsize,
    in_flight: AtomicUsize,
}

/// Cloneable handle; clones share the cache, backends and failure count
#[derive(Clone)]
pub struct NotificationDispatcher {
    inner: Arc<DispatcherInner>,
}

impl NotificationDispatcher {
    pub fn new(
        cache: Arc<SoundCache>,
        backends: Vec<Box<dyn PlaybackBackend>>,
        beeper: Box<dyn Beeper>,
    ) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                cache,
                backends,
                beeper,
                failures: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Mixer, then system player, then terminal bell
    pub fn with_default_backends(cache: Arc<SoundCache>) -> Self {
        let system_player = SystemPlayerBackend::detect();
        if !system_player.is_available() {
            tracing::debug!("No system audio player on PATH");
        }

        Self::new(
            cache,
            vec![Box::new(MixerBackend::new()), Box::new(system_player)],
            Box::new(TerminalBell),
        )
    }

    pub fn cache(&self) -> &Arc<SoundCache> {
        &self.inner.cache
    }

    /// Names of the ranked backends, best first
    pub fn backend_names(&self) -> Vec<&'static str> {
        self.inner.backends.iter().map(|b| b.name()).collect()
    }

    /// Requests that ended with nothing audible
    pub fn failed_playbacks(&self) -> usize {
        self.inner.failures.load(Ordering::Relaxed)
    }

    /// Detached playbacks that have not finished yet
    pub fn pending_playbacks(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Wait until every detached playback has finished, up to `timeout`
    ///
    /// Returns false if playbacks were still running when time ran out.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.pending_playbacks() > 0 {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(IDLE_POLL);
        }
        true
    }

    /// Run the whole chain on the calling thread
    ///
    /// Returns the name of the tier that produced sound.
    pub fn play_blocking(&self, tone: &ToneRef) -> PlaybackResult<&'static str> {
        self.inner.play_chain(tone)
    }

    /// Run the chain on a fresh thread
    ///
    /// Failures are logged and counted, never returned.
    pub fn play_detached(&self, tone: &ToneRef) -> Option<JoinHandle<()>> {
        let inner = Arc::clone(&self.inner);
        let tone = tone.clone();

        self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
        let spawned = thread::Builder::new()
            .name("tone-playback".to_string())
            .spawn(move || {
                if let Err(e) = inner.play_chain(&tone) {
                    tracing::warn!("{}", e);
                }
                inner.in_flight.fetch_sub(1, Ordering::AcqRel);
            });

        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                self.inner.in_flight.fetch_sub(1, Ordering::AcqRel);
                self.inner.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Failed to spawn playback thread: {}", e);
                None
            }
        }
    }
}

impl ToneSink for NotificationDispatcher {
    fn play(&self, tone: &ToneRef) {
        self.play_detached(tone);
    }
}

impl DispatcherInner {
    fn play_chain(&self, tone: &ToneRef) -> PlaybackResult<&'static str> {
        if let Some(path) = self.resolve(tone) {
            for backend in &self.backends {
                if !backend.is_available() {
                    tracing::debug!(backend = backend.name(), "Backend unavailable");
                    continue;
                }

                match backend.play_file(&path) {
                    Ok(()) => {
                        tracing::debug!(backend = backend.name(), tone = %tone, "Tone played");
                        return Ok(backend.name());
                    }
                    Err(e) => tracing::warn!(tone = %tone, "{}", e),
                }
            }
        }

        match self.beeper.beep() {
            Ok(()) => Ok(BEEP_TIER),
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("{}", e);
                Err(PlaybackError::PlaybackUnavailable(tone.to_string()))
            }
        }
    }

    /// Playable file for `tone`, or None to go straight to the beeper
    fn resolve(&self, tone: &ToneRef) -> Option<PathBuf> {
        match tone {
            ToneRef::Builtin(builtin) => match self.cache.get_or_render_tone(*builtin) {
                Ok(rendered) => Some(rendered.path.clone()),
                Err(e) => {
                    tracing::warn!(tone = builtin.name(), "Tone render failed: {}", e);
                    None
                }
            },
            ToneRef::File(path) => {
                if is_readable_file(path) {
                    Some(path.clone())
                } else {
                    tracing::warn!(path = %path.display(), "Sound file missing or unreadable");
                    None
                }
            }
        }
    }
}

fn is_readable_file(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok()
}
