// WAV encoder - 16-bit mono PCM at 44.1kHz
//
// Quantization is a hard clip: samples are scaled by 32767 and clamped to the
// i16 range, with no soft limiter. Loud chords lose their peaks; this is lossy
// and intentional.
//
// Files are written to a temporary sibling first and renamed into place, so a
// failed write never leaves a partial file where the cache would find it.

use super::descriptor::SAMPLE_RATE;
use super::{ToneError, ToneResult};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::BufWriter;
use std::path::Path;

/// Format details read back from a WAV header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Frames per channel
    pub sample_count: u32,
    /// True for integer PCM (format tag 1)
    pub is_pcm: bool,
}

/// Container format of every rendered tone
pub fn tone_spec() -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Convert a normalized sample to i16 (scale by 32767, clamp, truncate)
pub fn quantize(sample: f64) -> i16 {
    let scaled = sample * i16::MAX as f64;
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// Encode `samples` into a WAV file at `path`, all-or-nothing
pub fn write_wav(path: &Path, samples: &[f64]) -> ToneResult<()> {
    let fail = |reason: String| ToneError::EncodeWriteFailed {
        path: path.to_path_buf(),
        reason,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".tone-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|e| fail(format!("Failed to create temporary file: {}", e)))?;

    {
        let mut writer = WavWriter::new(BufWriter::new(temp.as_file_mut()), tone_spec())
            .map_err(|e| fail(format!("Failed to create WAV writer: {}", e)))?;

        for &sample in samples {
            writer
                .write_sample(quantize(sample))
                .map_err(|e| fail(format!("Failed to write sample: {}", e)))?;
        }

        writer
            .finalize()
            .map_err(|e| fail(format!("Failed to finalize WAV file: {}", e)))?;
    }

    // Dropping `temp` on any error above removes the partial file
    temp.persist(path)
        .map_err(|e| fail(format!("Failed to move file into place: {}", e.error)))?;

    Ok(())
}

/// Read the header of a WAV file
pub fn read_header(path: &Path) -> ToneResult<WavHeader> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();

    Ok(WavHeader {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        sample_count: reader.duration(),
        is_pcm: spec.sample_format == SampleFormat::Int,
    })
}
