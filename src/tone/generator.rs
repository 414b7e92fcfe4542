// Waveform generator - descriptor to mono f64 samples at 44.1kHz
// Pure and deterministic: the same descriptor always yields the same samples

use super::descriptor::{SAMPLE_RATE, ToneDescriptor};

/// Number of samples a tone of `duration` seconds occupies
pub fn sample_count(duration: f64) -> usize {
    if duration.is_finite() && duration > 0.0 {
        (duration * SAMPLE_RATE as f64).floor() as usize
    } else {
        0
    }
}

/// Render a descriptor into normalized samples
///
/// Components are summed without normalization, so chords may exceed 1.0;
/// the encoder clips at quantization time.
pub fn generate(descriptor: &ToneDescriptor) -> Vec<f64> {
    let num_samples = sample_count(descriptor.duration);
    let sample_rate = SAMPLE_RATE as f64;

    let mut samples = Vec::with_capacity(num_samples);
    for i in 0..num_samples {
        let t = i as f64 / sample_rate;
        let value: f64 = descriptor
            .components
            .iter()
            .map(|component| component.sample_at(t))
            .sum();
        samples.push(value);
    }

    samples
}
