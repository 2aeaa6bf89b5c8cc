use std::collections::BTreeMap;

use crate::dsp::Waveform;
use crate::synth::params::SynthParams;
use crate::synth::voice::{Voice, VoiceState};
use crate::MAX_BLOCK_SIZE;

/*
Voice registry
==============

The note-number -> voice map, and the only owner of voices. Invariant: at
most one live voice per note number. Lifecycle rules:

  note_on    an existing voice for the note is force-evicted first (moved
             out of the map into the fading pool with a 20 ms fade), THEN a
             fresh voice starts its attack. Rapid re-triggering of one note
             never overlaps audibly and never leaks a voice. Other notes are
             untouched; evict-then-create happens entirely inside this call.

  note_off   transitions the voice to Releasing with the release time in
             force at that instant. The voice stays in the map while it
             releases, so a later note_on can still find and evict it.
             A duplicate note_off is a no-op.

  disposal   happens in render_mix, on the pass where a voice's envelope
             reaches idle: it is dropped from the map (or the fading pool).
             Each voice is disposed of exactly once, no matter how many
             note_on/note_off calls referenced it.

The optional activity listener is the hook for key-highlighting UIs. It is
wired once at construction; when absent the registry simply runs without it.
*/

/// Optional collaborator notified on per-note activity changes.
pub trait ActivityListener: Send {
    fn voice_activity(&mut self, note: u8, active: bool);
}

impl<F: FnMut(u8, bool) + Send> ActivityListener for F {
    fn voice_activity(&mut self, note: u8, active: bool) {
        self(note, active)
    }
}

pub struct VoiceRegistry {
    sample_rate: f32,
    /// Live voices, at most one per note number.
    voices: BTreeMap<u8, Voice>,
    /// Force-evicted voices finishing their quick fade. Decoupled from the
    /// map so an evicted tail and its replacement never share state.
    fading: Vec<Voice>,
    /// Frames rendered so far; stamps voice creation times.
    frame_clock: u64,
    mix_buffer: Vec<f32>,
    listener: Option<Box<dyn ActivityListener>>,
}

impl VoiceRegistry {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            voices: BTreeMap::new(),
            fading: Vec::new(),
            frame_clock: 0,
            mix_buffer: vec![0.0; MAX_BLOCK_SIZE],
            listener: None,
        }
    }

    pub fn set_listener(&mut self, listener: Box<dyn ActivityListener>) {
        self.listener = Some(listener);
    }

    fn notify(&mut self, note: u8, active: bool) {
        if let Some(listener) = self.listener.as_mut() {
            listener.voice_activity(note, active);
        }
    }

    /// Start a voice for `note`, evicting any existing one first.
    pub fn note_on(&mut self, note: u8, params: &SynthParams) {
        if let Some(mut old) = self.voices.remove(&note) {
            old.evict();
            self.fading.push(old);
        }

        let voice = Voice::new(
            note,
            params.waveform,
            params.envelope,
            self.sample_rate,
            self.frame_clock,
        );
        self.voices.insert(note, voice);
        self.notify(note, true);
    }

    /// Release the voice for `note`, if one is live and not already
    /// releasing. Unknown notes and duplicate offs are ignored by policy.
    pub fn note_off(&mut self, note: u8, release_seconds: f32) {
        let released = match self.voices.get_mut(&note) {
            Some(voice) => voice.release(release_seconds),
            None => false,
        };
        if released {
            self.notify(note, false);
        }
    }

    /// Release every live voice (used on shutdown and panic keys).
    pub fn all_notes_off(&mut self, release_seconds: f32) {
        let notes: Vec<u8> = self.voices.keys().copied().collect();
        for note in notes {
            self.note_off(note, release_seconds);
        }
    }

    /// Live-retarget the waveform of everything currently sounding.
    pub fn retarget_waveform(&mut self, waveform: Waveform) {
        for voice in self.voices.values_mut() {
            voice.set_waveform(waveform);
        }
        for voice in self.fading.iter_mut() {
            voice.set_waveform(waveform);
        }
    }

    /// Mix all voices into `out` (overwrites), then dispose of any voice
    /// whose envelope finished during this block.
    pub fn render_mix(&mut self, out: &mut [f32]) {
        debug_assert!(out.len() <= MAX_BLOCK_SIZE);
        out.fill(0.0);

        let scratch = &mut self.mix_buffer[..out.len()];
        for voice in self.voices.values_mut().chain(self.fading.iter_mut()) {
            voice.render(scratch);
            for (o, v) in out.iter_mut().zip(scratch.iter()) {
                *o += v;
            }
        }

        self.frame_clock += out.len() as u64;

        // Disposal: exactly once per voice, when its envelope goes idle.
        self.voices.retain(|_, voice| !voice.is_finished());
        self.fading.retain(|voice| !voice.is_finished());
    }

    pub fn is_live(&self, note: u8) -> bool {
        self.voices.contains_key(&note)
    }

    pub fn voice_state(&self, note: u8) -> Option<VoiceState> {
        self.voices.get(&note).map(|v| v.state())
    }

    /// Live voices only; evicted tails are not included.
    pub fn live_count(&self) -> usize {
        self.voices.len()
    }

    /// Everything still producing sound, including evicted tails.
    pub fn sounding_count(&self) -> usize {
        self.voices.len() + self.fading.len()
    }

    pub fn live_notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.voices.keys().copied()
    }

    pub fn frame_clock(&self) -> u64 {
        self.frame_clock
    }
}
