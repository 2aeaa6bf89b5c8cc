use crate::dsp::envelope::Envelope;
use crate::dsp::oscillator::Oscillator;
use crate::dsp::{EnvelopeStage, Waveform};
use crate::pitch::note_to_freq;
use crate::synth::params::EnvelopeParams;

/// Lifecycle of a single sounding note.
///
/// `Created` covers the attack/decay portion; the voice promotes itself to
/// `Sustaining` once its envelope settles. `Releasing` is entered exactly
/// once via `release`. `Evicted` is the forced-fade path taken when the same
/// note is re-triggered while this voice still sounds; it is deliberately a
/// separate state so the evicted voice's tail and its replacement never
/// share anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Created,
    Sustaining,
    Releasing,
    Evicted,
}

/// One active note: oscillator plus envelope plus bookkeeping.
///
/// Envelope shape is snapshotted from the process-wide parameters at
/// construction; only the release duration is read later, at note-off.
pub struct Voice {
    note: u8,
    state: VoiceState,
    /// Engine frame counter at creation.
    created_at: u64,
    sample_rate: f32,
    osc: Oscillator,
    env: Envelope,
}

impl Voice {
    pub fn new(
        note: u8,
        waveform: Waveform,
        envelope: EnvelopeParams,
        sample_rate: f32,
        created_at: u64,
    ) -> Self {
        let mut env = Envelope::new(sample_rate, envelope.attack, envelope.decay, envelope.sustain);
        env.gate_on();

        Self {
            note,
            state: VoiceState::Created,
            created_at,
            sample_rate,
            osc: Oscillator::new(waveform, note_to_freq(note)),
            env,
        }
    }

    /// Begin the release ramp using the release time in force right now.
    /// Returns false (and does nothing) if release is already underway, so
    /// a duplicate note-off cannot reschedule the ramp.
    pub fn release(&mut self, release_seconds: f32) -> bool {
        if matches!(self.state, VoiceState::Releasing | VoiceState::Evicted) {
            return false;
        }
        self.state = VoiceState::Releasing;
        self.env.gate_off(release_seconds);
        true
    }

    /// Forced eviction on re-trigger: a fixed short fade regardless of the
    /// configured release, applied even if a normal release is in flight.
    pub fn evict(&mut self) {
        self.state = VoiceState::Evicted;
        self.env.quick_fade();
    }

    /// Render this voice's contribution into `out` (overwrites).
    pub fn render(&mut self, out: &mut [f32]) {
        self.osc.render(out, self.sample_rate);
        self.env.apply(out);

        // Promote once the envelope has settled past attack+decay.
        if self.state == VoiceState::Created && self.env.stage() == EnvelopeStage::Sustain {
            self.state = VoiceState::Sustaining;
        }
    }

    /// True once the envelope has fully faded out; the registry disposes of
    /// the voice on the render pass where this first turns true.
    pub fn is_finished(&self) -> bool {
        !self.env.is_active()
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.osc.set_waveform(waveform);
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn envelope_level(&self) -> f32 {
        self.env.level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn test_voice(envelope: EnvelopeParams) -> Voice {
        Voice::new(60, Waveform::Sine, envelope, SAMPLE_RATE, 0)
    }

    fn render_frames(voice: &mut Voice, frames: usize) {
        let mut buffer = vec![0.0f32; frames];
        voice.render(&mut buffer);
    }

    #[test]
    fn promotes_to_sustaining_after_attack_and_decay() {
        let params = EnvelopeParams {
            attack: 0.01,
            decay: 0.02,
            sustain: 0.5,
            release: 0.1,
        };
        let mut voice = test_voice(params);
        assert_eq!(voice.state(), VoiceState::Created);

        render_frames(&mut voice, (0.04 * SAMPLE_RATE) as usize);
        assert_eq!(voice.state(), VoiceState::Sustaining);
    }

    #[test]
    fn finishes_after_release_ramp() {
        let params = EnvelopeParams {
            attack: 0.005,
            decay: 0.005,
            sustain: 0.5,
            release: 0.02,
        };
        let mut voice = test_voice(params);
        render_frames(&mut voice, 20);

        assert!(voice.release(params.release));
        assert!(!voice.is_finished());

        render_frames(&mut voice, (0.02 * SAMPLE_RATE) as usize + 2);
        assert!(voice.is_finished());
    }

    #[test]
    fn duplicate_release_is_rejected() {
        let mut voice = test_voice(EnvelopeParams::default());
        render_frames(&mut voice, 20);

        assert!(voice.release(0.1));
        assert!(!voice.release(10.0), "second release must be a no-op");
        assert_eq!(voice.state(), VoiceState::Releasing);
    }

    #[test]
    fn eviction_fades_quickly_even_during_release() {
        let params = EnvelopeParams {
            attack: 0.005,
            decay: 0.005,
            sustain: 0.8,
            release: 5.0,
        };
        let mut voice = test_voice(params);
        render_frames(&mut voice, 20);
        voice.release(params.release);

        voice.evict();
        assert_eq!(voice.state(), VoiceState::Evicted);

        render_frames(&mut voice, (0.025 * SAMPLE_RATE) as usize);
        assert!(voice.is_finished(), "evicted voice must die within the quick fade");
    }
}
