//! Low-level DSP primitives used by the voice and chain layers.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside voice structs or the shared output chain. They stay
//! focused on the signal-processing math; lifecycle orchestration lives in
//! `crate::synth`.

/// Feed-forward dynamics limiter for the output stage.
pub mod compressor;
/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// State-variable filter with smoothed cutoff for the shared chain.
pub mod filter;
/// Phase-accumulator oscillator waveforms.
pub mod oscillator;

pub use envelope::EnvelopeStage;
pub use oscillator::Waveform;
