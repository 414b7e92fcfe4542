// Sound cache - renders built-in tones to disk on first use
//
// Lookups short-circuit on an existing file at the tone's stable path (no
// checksum: an existing file is trusted). Renders are not deduplicated across
// threads; two threads rendering the same tone produce byte-identical files
// and the atomic rename in `write_wav` makes the last writer win harmlessly.

use super::builtin::BuiltinTone;
use super::generator::generate;
use super::wav::write_wav;
use super::{ToneError, ToneResult};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// A tone that exists on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTone {
    pub tone: BuiltinTone,
    pub path: PathBuf,
    /// When the file was generated (file mtime for files found on disk)
    pub generated_at: DateTime<Utc>,
}

/// Tone name -> rendered file, for the lifetime of the cache object
pub struct SoundCache {
    dir: PathBuf,
    rendered: Mutex<HashMap<BuiltinTone, Arc<RenderedTone>>>,
}

impl SoundCache {
    /// Create a cache rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> ToneResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            rendered: Mutex::new(HashMap::new()),
        })
    }

    /// Platform cache directory for rendered tones
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("pomodoro")
            .join("sounds")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stable path of a tone inside this cache
    pub fn path_for(&self, tone: BuiltinTone) -> PathBuf {
        self.dir.join(tone.file_name())
    }

    /// Return the file for the tone called `name`, rendering it if absent
    pub fn get_or_render(&self, name: &str) -> ToneResult<PathBuf> {
        let tone = BuiltinTone::from_name(name).ok_or_else(|| ToneError::UnknownTone(name.to_string()))?;
        Ok(self.get_or_render_tone(tone)?.path.clone())
    }

    /// Return the rendered entry for `tone`, rendering it if absent
    pub fn get_or_render_tone(&self, tone: BuiltinTone) -> ToneResult<Arc<RenderedTone>> {
        if let Some(entry) = self.lookup(tone)
            && entry.path.exists()
        {
            return Ok(entry);
        }

        let path = self.path_for(tone);
        let entry = if path.exists() {
            debug!(tone = tone.name(), path = %path.display(), "Using existing tone file");
            let generated_at = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            RenderedTone {
                tone,
                path,
                generated_at,
            }
        } else {
            // Rendered outside the lock so different tones render in parallel
            let samples = generate(&tone.descriptor());
            write_wav(&path, &samples)?;
            info!(tone = tone.name(), path = %path.display(), samples = samples.len(), "Rendered tone");
            RenderedTone {
                tone,
                path,
                generated_at: Utc::now(),
            }
        };

        let mut rendered = self.rendered.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = rendered.get(&tone)
            && existing.path.exists()
        {
            return Ok(Arc::clone(existing));
        }
        let entry = Arc::new(entry);
        rendered.insert(tone, Arc::clone(&entry));
        Ok(entry)
    }

    /// Entry recorded for `tone` in this process, if any
    pub fn lookup(&self, tone: BuiltinTone) -> Option<Arc<RenderedTone>> {
        let rendered = self.rendered.lock().unwrap_or_else(|e| e.into_inner());
        rendered.get(&tone).cloned()
    }

    /// Render every built-in tone, in catalogue order
    pub fn render_all(&self) -> ToneResult<Vec<(BuiltinTone, PathBuf)>> {
        BuiltinTone::ALL
            .iter()
            .map(|&tone| Ok((tone, self.get_or_render_tone(tone)?.path.clone())))
            .collect()
    }

    /// Display name and file of every built-in tone, rendering as needed
    pub fn builtin_tones(&self) -> ToneResult<Vec<(&'static str, PathBuf)>> {
        Ok(self
            .render_all()?
            .into_iter()
            .map(|(tone, path)| (tone.display_name(), path))
            .collect())
    }
}
