// Purpose: voice lifecycle management and the engine facade.
// This layer sits above the DSP primitives and owns the registry, the
// shared chain, and the analysis tap.

pub mod message;
pub mod params;
pub mod registry;
pub mod voice;

pub use message::{ControlMessage, MessageReceiver};
pub use params::{EnvelopeParams, EnvelopeUpdate, SynthParams};
pub use registry::{ActivityListener, VoiceRegistry};
pub use voice::{Voice, VoiceState};

use std::collections::BTreeMap;

use crate::analysis::{AnalysisFrame, AnalysisTap};
use crate::chain::SignalChain;
use crate::dsp::Waveform;
use crate::pitch::{self, NoteRange, INSTRUMENT_MAX, INSTRUMENT_MIN};

/// The synthesizer engine: note events in, rendered blocks out.
///
/// All state mutation happens through `&mut self` on one logical thread;
/// `render` is the cooperative tick that advances envelopes and performs
/// disposal. Cross-thread callers deliver `ControlMessage`s through
/// `apply_messages` (see `synth::message`), which keeps per-note arrival
/// order intact since the queue is drained in order at the top of a block.
pub struct Synth {
    sample_rate: f32,
    params: SynthParams,
    registry: VoiceRegistry,
    chain: SignalChain,
    tap: AnalysisTap,
    /// Note started by each currently held physical key. Key-up releases
    /// this recorded note, so an octave shift between press and release
    /// still stops the voice the press started.
    held_keys: BTreeMap<char, u8>,
}

impl Synth {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_params(sample_rate, SynthParams::default())
    }

    pub fn with_params(sample_rate: f32, params: SynthParams) -> Self {
        Self {
            sample_rate,
            params,
            registry: VoiceRegistry::new(sample_rate),
            chain: SignalChain::new(params.lowpass_hz, params.highpass_hz, sample_rate),
            tap: AnalysisTap::new(sample_rate),
            held_keys: BTreeMap::new(),
        }
    }

    /// Install the key-highlighting collaborator. Wired once; when absent,
    /// activity events are simply not produced.
    pub fn set_activity_listener(&mut self, listener: Box<dyn ActivityListener>) {
        self.registry.set_listener(listener);
    }

    /// Start a voice. Notes outside the instrument range are silently
    /// ignored; re-triggering a sounding note evicts it first.
    pub fn note_on(&mut self, note: u8) {
        if !(INSTRUMENT_MIN..=INSTRUMENT_MAX).contains(&note) {
            return;
        }
        self.registry.note_on(note, &self.params);
    }

    /// Release a voice using the release time in force right now.
    /// Unknown notes and duplicate offs are ignored.
    pub fn note_off(&mut self, note: u8) {
        self.registry.note_off(note, self.params.envelope.release);
    }

    /// Physical-key note-on: resolved through the key table and the current
    /// octave offset. Unmapped keys and out-of-range results are ignored.
    /// The resolved note is remembered per key until the matching `key_up`.
    pub fn key_down(&mut self, key: char) {
        if let Some(note) = pitch::resolve_key(key, self.params.octave_offset) {
            self.held_keys.insert(key.to_ascii_uppercase(), note);
            self.note_on(note);
        }
    }

    /// Physical-key note-off: releases the note recorded at `key_down`, not
    /// a fresh resolution. Shifting octaves mid-hold must not leave the
    /// original voice stranded.
    pub fn key_up(&mut self, key: char) {
        if let Some(note) = self.held_keys.remove(&key.to_ascii_uppercase()) {
            self.note_off(note);
        }
    }

    /// Select the waveform for new voices and retarget sounding ones.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.params.waveform = waveform;
        self.registry.retarget_waveform(waveform);
    }

    /// Apply a partial envelope update. Affects voices created (and
    /// releases begun) after this call; in-flight ramps are untouched.
    pub fn set_envelope(&mut self, update: EnvelopeUpdate) {
        self.params.envelope.apply(update);
    }

    pub fn set_lowpass_cutoff(&mut self, cutoff_hz: f32) {
        self.params.lowpass_hz = cutoff_hz;
        self.chain.set_lowpass_cutoff(cutoff_hz);
    }

    pub fn set_highpass_cutoff(&mut self, cutoff_hz: f32) {
        self.params.highpass_hz = cutoff_hz;
        self.chain.set_highpass_cutoff(cutoff_hz);
    }

    /// Set the keyboard octave shift; snapped to whole octaves within
    /// +/- two octaves. Held notes keep their pitch.
    pub fn set_octave_offset(&mut self, semitones: i32) {
        self.params.octave_offset = pitch::clamp_octave_offset(semitones);
    }

    /// Octave-shift trigger (typically +/-12 from a UI button).
    pub fn shift_octave(&mut self, semitones: i32) {
        self.set_octave_offset(self.params.octave_offset + semitones);
    }

    /// The keyboard-reachable span under the current octave offset,
    /// clamped to the instrument bounds.
    pub fn mapped_note_range(&self) -> NoteRange {
        pitch::mapped_note_range(self.params.octave_offset)
    }

    /// Snapshot the analysis tap. Read-only; safe with zero voices.
    pub fn sample_analysis(&self) -> AnalysisFrame {
        self.tap.sample()
    }

    /// Render one block: mix voices, run the shared chain, dispose of
    /// finished voices. `out.len()` must be at most `MAX_BLOCK_SIZE`.
    pub fn render(&mut self, out: &mut [f32]) {
        self.registry.render_mix(out);
        self.chain.process(out, &mut self.tap);
    }

    /// Drain and apply queued control messages in arrival order.
    pub fn apply_messages(&mut self, rx: &mut impl MessageReceiver) {
        while let Some(msg) = rx.pop() {
            match msg {
                ControlMessage::NoteOn { note } => self.note_on(note),
                ControlMessage::NoteOff { note } => self.note_off(note),
                ControlMessage::KeyDown { key } => self.key_down(key),
                ControlMessage::KeyUp { key } => self.key_up(key),
                ControlMessage::SetWaveform(waveform) => self.set_waveform(waveform),
                ControlMessage::SetEnvelope(update) => self.set_envelope(update),
                ControlMessage::SetLowpassCutoff(hz) => self.set_lowpass_cutoff(hz),
                ControlMessage::SetHighpassCutoff(hz) => self.set_highpass_cutoff(hz),
                ControlMessage::SetOctaveOffset(semitones) => self.set_octave_offset(semitones),
                ControlMessage::ShiftOctave(semitones) => self.shift_octave(semitones),
                ControlMessage::AllNotesOff => {
                    self.held_keys.clear();
                    self.registry.all_notes_off(self.params.envelope.release)
                }
            }
        }
    }

    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn registry(&self) -> &VoiceRegistry {
        &self.registry
    }
}
