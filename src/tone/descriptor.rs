// Tone descriptors - parametric recipes for notification sounds
//
// A descriptor is a list of components summed together. Each component is a
// sine at a (possibly alternating) pitch, shaped by an amplitude envelope and
// placed at a start offset inside the tone.

use std::f64::consts::PI;

/// Sample rate of every rendered tone (Hz)
pub const SAMPLE_RATE: u32 = 44100;

/// Ramp length of the linear fade envelope (seconds)
const FADE_SECONDS: f64 = 0.01;

/// Amplitude envelope of one component, evaluated on component-local time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Envelope {
    /// 10ms linear ramp in, 10ms linear ramp out, 1.0 between
    LinearFade,
    /// exp(-rate * t)
    ExponentialDecay { rate: f64 },
    /// 1.0 until `sustain` seconds, then exp(-rate * (t - sustain))
    SustainDecay { sustain: f64, rate: f64 },
}

impl Envelope {
    /// Envelope gain at local time `t` of a component lasting `duration` seconds
    pub fn gain(&self, t: f64, duration: f64) -> f64 {
        match *self {
            Envelope::LinearFade => {
                let fade_in = t / FADE_SECONDS;
                let fade_out = (duration - t) / FADE_SECONDS;
                fade_in.min(fade_out).clamp(0.0, 1.0)
            }
            Envelope::ExponentialDecay { rate } => (-rate * t).exp(),
            Envelope::SustainDecay { sustain, rate } => {
                if t < sustain {
                    1.0
                } else {
                    (-rate * (t - sustain)).exp()
                }
            }
        }
    }
}

/// Pitch of a component
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pitch {
    Fixed(f64),
    /// `first` during even periods, `second` during odd ones
    Alternating { first: f64, second: f64, period: f64 },
}

impl Pitch {
    pub fn frequency_at(&self, t: f64) -> f64 {
        match *self {
            Pitch::Fixed(freq) => freq,
            Pitch::Alternating {
                first,
                second,
                period,
            } => {
                if period <= 0.0 || ((t / period).floor() as u64) % 2 == 0 {
                    first
                } else {
                    second
                }
            }
        }
    }
}

/// One sine component of a tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneComponent {
    pub pitch: Pitch,
    /// Offset from the start of the tone (seconds)
    pub start: f64,
    /// Length of the component (seconds)
    pub duration: f64,
    pub amplitude: f64,
    pub envelope: Envelope,
}

impl ToneComponent {
    pub fn new(frequency: f64, start: f64, duration: f64, amplitude: f64, envelope: Envelope) -> Self {
        Self {
            pitch: Pitch::Fixed(frequency),
            start,
            duration,
            amplitude,
            envelope,
        }
    }

    pub fn alternating(
        first: f64,
        second: f64,
        period: f64,
        duration: f64,
        amplitude: f64,
        envelope: Envelope,
    ) -> Self {
        Self {
            pitch: Pitch::Alternating {
                first,
                second,
                period,
            },
            start: 0.0,
            duration,
            amplitude,
            envelope,
        }
    }

    /// Contribution of this component at tone time `t` (0.0 when inactive)
    pub fn sample_at(&self, t: f64) -> f64 {
        let local = t - self.start;
        if local < 0.0 || local >= self.duration {
            return 0.0;
        }

        let frequency = self.pitch.frequency_at(local);
        self.amplitude * self.envelope.gain(local, self.duration) * (2.0 * PI * frequency * local).sin()
    }
}

/// Immutable recipe for a tone
#[derive(Debug, Clone, PartialEq)]
pub struct ToneDescriptor {
    pub name: String,
    /// Total length in seconds (fractional allowed)
    pub duration: f64,
    pub components: Vec<ToneComponent>,
}

impl ToneDescriptor {
    pub fn new(name: impl Into<String>, duration: f64) -> Self {
        Self {
            name: name.into(),
            duration,
            components: Vec::new(),
        }
    }

    pub fn with_component(mut self, component: ToneComponent) -> Self {
        self.components.push(component);
        self
    }
}
