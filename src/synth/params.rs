#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::envelope::SUSTAIN_FLOOR;
use crate::dsp::Waveform;

/// ADSR shape settings, process-wide. Read at the relevant lifecycle
/// instant: attack/decay/sustain when a voice is created, release when its
/// note-off arrives. In-flight voices are never retroactively reshaped.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
        }
    }
}

impl EnvelopeParams {
    pub fn apply(&mut self, update: EnvelopeUpdate) {
        if let Some(attack) = update.attack {
            self.attack = attack.max(0.0);
        }
        if let Some(decay) = update.decay {
            self.decay = decay.max(0.0);
        }
        if let Some(sustain) = update.sustain {
            // Clamped here so no envelope computation ever sees zero.
            self.sustain = sustain.clamp(SUSTAIN_FLOOR, 1.0);
        }
        if let Some(release) = update.release {
            self.release = release.max(0.0);
        }
    }
}

/// Partial envelope update; `None` fields keep their current value.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnvelopeUpdate {
    pub attack: Option<f32>,
    pub decay: Option<f32>,
    pub sustain: Option<f32>,
    pub release: Option<f32>,
}

impl EnvelopeUpdate {
    pub fn attack(value: f32) -> Self {
        Self {
            attack: Some(value),
            ..Self::default()
        }
    }

    pub fn decay(value: f32) -> Self {
        Self {
            decay: Some(value),
            ..Self::default()
        }
    }

    pub fn sustain(value: f32) -> Self {
        Self {
            sustain: Some(value),
            ..Self::default()
        }
    }

    pub fn release(value: f32) -> Self {
        Self {
            release: Some(value),
            ..Self::default()
        }
    }
}

/// The full process-wide parameter set shared by the registry and chain.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthParams {
    /// Applied to new voices; selecting a new kind also retargets
    /// currently sounding voices in place.
    pub waveform: Waveform,
    pub envelope: EnvelopeParams,
    /// Low-pass stage cutoff in Hz.
    pub lowpass_hz: f32,
    /// High-pass stage cutoff in Hz.
    pub highpass_hz: f32,
    /// Keyboard shift in semitones, always a whole number of octaves.
    pub octave_offset: i32,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            envelope: EnvelopeParams::default(),
            lowpass_hz: 20_000.0,
            highpass_hz: 20.0,
            octave_offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_update_leaves_other_fields_alone() {
        let mut params = EnvelopeParams::default();
        let before = params;
        params.apply(EnvelopeUpdate::attack(0.5));

        assert_eq!(params.attack, 0.5);
        assert_eq!(params.decay, before.decay);
        assert_eq!(params.sustain, before.sustain);
        assert_eq!(params.release, before.release);
    }

    #[test]
    fn zero_sustain_is_clamped_at_the_setter() {
        let mut params = EnvelopeParams::default();
        params.apply(EnvelopeUpdate::sustain(0.0));
        assert_eq!(params.sustain, SUSTAIN_FLOOR);

        params.apply(EnvelopeUpdate::sustain(2.0));
        assert_eq!(params.sustain, 1.0);
    }
}
