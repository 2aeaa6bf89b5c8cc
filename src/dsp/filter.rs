use std::f32::consts::TAU;

/*
Chain filter stage
==================

A state-variable filter (Chamberlin/Zavalishin topology) providing the
low-pass and high-pass responses used by the shared output chain:

| type      | passes       | rejects      |
| --------- | ------------ | ------------ |
| low-pass  | below cutoff | above cutoff |
| high-pass | above cutoff | below cutoff |

Cutoff changes arrive from UI controls and would click if applied as a step
while audio is flowing. `set_cutoff` therefore only moves a target; the
effective cutoff glides toward it with a one-pole smoother (about 15 ms time
constant), re-deriving the integrator gain as it goes.
*/

/// Smoothing time constant for cutoff glides, in seconds.
const CUTOFF_GLIDE: f32 = 0.015;

/// Cutoff bounds: audible band, and safely below Nyquist at common rates.
const MIN_CUTOFF_HZ: f32 = 10.0;
const MAX_CUTOFF_HZ: f32 = 20_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    LowPass,
    HighPass,
}

pub struct ChainFilter {
    mode: FilterMode,
    sample_rate: f32,

    // Integrator memories.
    ic1eq: f32,
    ic2eq: f32,

    cutoff_hz: f32,
    target_cutoff_hz: f32,
    /// Upper cutoff bound for this instance; stays below Nyquist so the
    /// prewarp tangent never wraps.
    max_cutoff_hz: f32,
    /// Per-sample smoothing coefficient derived from CUTOFF_GLIDE.
    glide_coeff: f32,
}

impl ChainFilter {
    pub fn new(mode: FilterMode, cutoff_hz: f32, sample_rate: f32) -> Self {
        let max_cutoff = MAX_CUTOFF_HZ.min(0.45 * sample_rate);
        let cutoff = cutoff_hz.clamp(MIN_CUTOFF_HZ, max_cutoff);
        Self {
            mode,
            sample_rate,
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz: cutoff,
            target_cutoff_hz: cutoff,
            max_cutoff_hz: max_cutoff,
            glide_coeff: (-1.0 / (CUTOFF_GLIDE * sample_rate)).exp(),
        }
    }

    pub fn lowpass(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self::new(FilterMode::LowPass, cutoff_hz, sample_rate)
    }

    pub fn highpass(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self::new(FilterMode::HighPass, cutoff_hz, sample_rate)
    }

    /// Set the cutoff target. The effective cutoff glides there over a few
    /// milliseconds rather than stepping.
    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.target_cutoff_hz = cutoff_hz.clamp(MIN_CUTOFF_HZ, self.max_cutoff_hz);
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn target_cutoff(&self) -> f32 {
        self.target_cutoff_hz
    }

    #[inline]
    fn integrator_gain(&self) -> f32 {
        // Bilinear-transform prewarp of the cutoff frequency.
        (TAU * self.cutoff_hz / (2.0 * self.sample_rate)).tan()
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32) -> f32 {
        // Glide the cutoff toward its target before deriving coefficients.
        self.cutoff_hz =
            self.target_cutoff_hz + (self.cutoff_hz - self.target_cutoff_hz) * self.glide_coeff;

        let g = self.integrator_gain();
        let k = 2.0; // no resonance in the chain stages
        let h = 1.0 / (1.0 + g * (g + k));

        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        match self.mode {
            FilterMode::LowPass => v2,
            FilterMode::HighPass => sample - k * v1 - v2,
        }
    }

    /// Process a block in place.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}
