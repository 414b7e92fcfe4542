// Built-in tone catalogue
// Index order is stable: preferences store the selected tone by index

use super::descriptor::{Envelope, ToneComponent, ToneDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTone {
    /// Short bright decay, used for interval reminders
    Ding,
    /// C major chord with slow decay
    Bell,
    /// Two alternating pitches, loud; default completion tone
    Alarm,
    /// Three descending notes
    Chime,
    DoubleBeep,
    /// Plain sine with 10ms fades
    Beep,
}

impl BuiltinTone {
    pub const ALL: [BuiltinTone; 6] = [
        BuiltinTone::Ding,
        BuiltinTone::Bell,
        BuiltinTone::Alarm,
        BuiltinTone::Chime,
        BuiltinTone::DoubleBeep,
        BuiltinTone::Beep,
    ];

    /// Tone played on interval reminders
    pub const REMINDER: BuiltinTone = BuiltinTone::Ding;

    /// Completion tone used when preferences select nothing valid
    pub const DEFAULT_COMPLETION: BuiltinTone = BuiltinTone::Alarm;

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinTone::Ding => "ding",
            BuiltinTone::Bell => "bell",
            BuiltinTone::Alarm => "alarm",
            BuiltinTone::Chime => "chime",
            BuiltinTone::DoubleBeep => "double_beep",
            BuiltinTone::Beep => "beep",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BuiltinTone::Ding => "Ding",
            BuiltinTone::Bell => "Bell",
            BuiltinTone::Alarm => "Alarm",
            BuiltinTone::Chime => "Chime",
            BuiltinTone::DoubleBeep => "Double Beep",
            BuiltinTone::Beep => "Beep",
        }
    }

    /// Stable file name inside the sound cache directory
    pub fn file_name(&self) -> String {
        format!("{}.wav", self.name())
    }

    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|tone| tone == self)
            .unwrap_or_default()
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|tone| tone.name().eq_ignore_ascii_case(name))
    }

    /// Recipe for this tone
    pub fn descriptor(&self) -> ToneDescriptor {
        let name = self.name();
        match self {
            BuiltinTone::Ding => ToneDescriptor::new(name, 0.3).with_component(ToneComponent::new(
                1200.0,
                0.0,
                0.3,
                0.7,
                Envelope::ExponentialDecay { rate: 8.0 },
            )),
            BuiltinTone::Bell => {
                let decay = Envelope::ExponentialDecay { rate: 2.0 };
                [523.0, 659.0, 784.0]
                    .into_iter()
                    .fold(ToneDescriptor::new(name, 1.5), |tone, freq| {
                        tone.with_component(ToneComponent::new(freq, 0.0, 1.5, 0.3, decay))
                    })
            }
            BuiltinTone::Alarm => ToneDescriptor::new(name, 2.0).with_component(
                ToneComponent::alternating(
                    800.0,
                    1000.0,
                    0.15,
                    2.0,
                    0.6,
                    Envelope::SustainDecay {
                        sustain: 1.5,
                        rate: 3.0,
                    },
                ),
            ),
            BuiltinTone::Chime => {
                let decay = Envelope::ExponentialDecay { rate: 5.0 };
                ToneDescriptor::new(name, 1.0)
                    .with_component(ToneComponent::new(880.0, 0.0, 0.3, 0.4, decay))
                    .with_component(ToneComponent::new(784.0, 0.15, 0.3, 0.4, decay))
                    .with_component(ToneComponent::new(659.0, 0.30, 0.4, 0.4, decay))
            }
            BuiltinTone::DoubleBeep => {
                let decay = Envelope::ExponentialDecay { rate: 10.0 };
                ToneDescriptor::new(name, 0.6)
                    .with_component(ToneComponent::new(1000.0, 0.0, 0.1, 0.6, decay))
                    .with_component(ToneComponent::new(1000.0, 0.2, 0.1, 0.6, decay))
            }
            BuiltinTone::Beep => ToneDescriptor::new(name, 0.25).with_component(
                ToneComponent::new(880.0, 0.0, 0.25, 0.8, Envelope::LinearFade),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_order_is_stable() {
        assert_eq!(BuiltinTone::from_index(0), Some(BuiltinTone::Ding));
        assert_eq!(BuiltinTone::from_index(2), Some(BuiltinTone::Alarm));
        assert_eq!(BuiltinTone::from_index(4), Some(BuiltinTone::DoubleBeep));
        assert_eq!(BuiltinTone::from_index(6), None);

        for (i, tone) in BuiltinTone::ALL.iter().enumerate() {
            assert_eq!(tone.index(), i);
        }
    }

    #[test]
    fn test_name_lookup() {
        for tone in BuiltinTone::ALL {
            assert_eq!(BuiltinTone::from_name(tone.name()), Some(tone));
            assert_eq!(tone.descriptor().name, tone.name());
        }
        assert_eq!(BuiltinTone::from_name("ALARM"), Some(BuiltinTone::Alarm));
        assert_eq!(BuiltinTone::from_name("gong"), None);
    }

    #[test]
    fn test_descriptors_fit_their_duration() {
        for tone in BuiltinTone::ALL {
            let descriptor = tone.descriptor();
            assert!(!descriptor.components.is_empty());
            for component in &descriptor.components {
                assert!(component.start + component.duration <= descriptor.duration + 1e-9);
            }
        }
    }

    #[test]
    fn test_chime_notes_overlap() {
        let chime = BuiltinTone::Chime.descriptor();
        let starts: Vec<f64> = chime.components.iter().map(|c| c.start).collect();
        assert_eq!(starts, vec![0.0, 0.15, 0.30]);
    }
}
