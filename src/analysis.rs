use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::ANALYSIS_WINDOW;

/*
Analysis tap
============

Read-only sampling point between the chain's filter stages and the output
limiter. The chain feeds every rendered block into a circular history of
ANALYSIS_WINDOW (2048) samples; consumers snapshot it on their own cadence
(typically the display refresh).

A snapshot carries both representations:

  time domain   the raw window, oldest sample first, 2048 values
  frequency     Hann-windowed forward FFT, magnitude per bin in dB,
                2048 / 2 = 1024 bins, floored at -120 dB

Sampling never mutates voice or registry state, and is safe with zero
active voices: the history starts zeroed, so silence yields a flat
time-domain trace at the 0.0 baseline.
*/

/// Magnitude floor for empty bins, in dB.
pub const DB_FLOOR: f64 = -120.0;

/// One snapshot of the tapped signal.
#[derive(Debug, Clone)]
pub struct AnalysisFrame {
    /// Amplitude samples, oldest first; `ANALYSIS_WINDOW` values.
    pub time_domain: Vec<f32>,
    /// Magnitude per frequency bin in dB; `ANALYSIS_WINDOW / 2` values.
    pub frequency_db: Vec<f64>,
}

pub struct AnalysisTap {
    sample_rate: f32,
    /// Circular history of the most recent window.
    history: Vec<f32>,
    write_pos: usize,
    fft: Arc<dyn Fft<f32>>,
    /// Hann window coefficients, reduces spectral leakage.
    window: Vec<f32>,
}

impl AnalysisTap {
    pub fn new(sample_rate: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(ANALYSIS_WINDOW);

        let denom = (ANALYSIS_WINDOW - 1) as f32;
        let window = (0..ANALYSIS_WINDOW)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / denom).cos()))
            .collect();

        Self {
            sample_rate,
            history: vec![0.0; ANALYSIS_WINDOW],
            write_pos: 0,
            fft,
            window,
        }
    }

    /// Called by the chain after its filter stages, once per rendered block.
    pub fn feed(&mut self, block: &[f32]) {
        for &sample in block {
            self.history[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % ANALYSIS_WINDOW;
        }
    }

    /// Snapshot the current window in both domains.
    ///
    /// Allocates its own scratch so the tap itself stays untouched; this
    /// runs at display rate, not audio rate.
    pub fn sample(&self) -> AnalysisFrame {
        let mut time_domain = Vec::with_capacity(ANALYSIS_WINDOW);
        time_domain.extend_from_slice(&self.history[self.write_pos..]);
        time_domain.extend_from_slice(&self.history[..self.write_pos]);

        let mut scratch: Vec<Complex<f32>> = time_domain
            .iter()
            .zip(self.window.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        self.fft.process(&mut scratch);

        let frequency_db = scratch[..ANALYSIS_WINDOW / 2]
            .iter()
            .map(|bin| {
                let power = (bin.re * bin.re + bin.im * bin.im) as f64;
                (10.0 * power.max(1e-12).log10()).max(DB_FLOOR)
            })
            .collect();

        AnalysisFrame {
            time_domain,
            frequency_db,
        }
    }

    /// Center frequency of a bin, for axis labeling.
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate / ANALYSIS_WINDOW as f32
    }
}
