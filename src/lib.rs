pub mod analysis; // FFT tap for waveform/spectrum snapshots
pub mod chain; // Shared output signal chain
pub mod dsp;
pub mod pitch; // Key/piano-roll to note-number mapping
pub mod synth; // Voice lifecycle and the engine facade

pub const MAX_BLOCK_SIZE: usize = 2048;

/// FFT window length shared by the analysis tap and its consumers.
/// Time-domain snapshots carry this many samples; frequency snapshots
/// carry half as many bins.
pub const ANALYSIS_WINDOW: usize = 2048;

pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
