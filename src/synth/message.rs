#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::dsp::Waveform;
use crate::synth::params::EnvelopeUpdate;

/// Control-plane messages for driving a `Synth` across threads. The UI or
/// input thread produces these; the audio thread drains them at the top of
/// each render block, which preserves per-note arrival order.
#[derive(Debug, Copy, Clone)]
pub enum ControlMessage {
    NoteOn { note: u8 },
    NoteOff { note: u8 },
    /// Physical-key variants; the synth resolves them through the pitch
    /// mapper with its current octave offset.
    KeyDown { key: char },
    KeyUp { key: char },
    SetWaveform(Waveform),
    SetEnvelope(EnvelopeUpdate),
    SetLowpassCutoff(f32),
    SetHighpassCutoff(f32),
    SetOctaveOffset(i32),
    /// Octave-shift trigger, in semitones (typically +/-12).
    ShiftOctave(i32),
    AllNotesOff,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<ControlMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<ControlMessage> {
    fn pop(&mut self) -> Option<ControlMessage> {
        Consumer::pop(self).ok()
    }
}
