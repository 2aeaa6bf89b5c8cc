use crate::analysis::AnalysisTap;
use crate::dsp::compressor::Limiter;
use crate::dsp::filter::ChainFilter;

/// The fixed output topology every voice passes through:
///
/// ```text
/// mixed voices -> low-pass -> high-pass -> [analysis tap] -> limiter -> out
/// ```
///
/// The chain is shared; there is no per-voice filtering. Both cutoffs are
/// mutable and glide smoothly (see `ChainFilter`); the limiter constants are
/// fixed. The tap deliberately sits before the limiter so visualizations
/// show the filtered signal, not the gain-reduced one.
pub struct SignalChain {
    lowpass: ChainFilter,
    highpass: ChainFilter,
    limiter: Limiter,
}

impl SignalChain {
    pub fn new(lowpass_hz: f32, highpass_hz: f32, sample_rate: f32) -> Self {
        Self {
            lowpass: ChainFilter::lowpass(lowpass_hz, sample_rate),
            highpass: ChainFilter::highpass(highpass_hz, sample_rate),
            limiter: Limiter::new(sample_rate),
        }
    }

    pub fn set_lowpass_cutoff(&mut self, cutoff_hz: f32) {
        self.lowpass.set_cutoff(cutoff_hz);
    }

    pub fn set_highpass_cutoff(&mut self, cutoff_hz: f32) {
        self.highpass.set_cutoff(cutoff_hz);
    }

    /// Run one block through the chain in place, feeding the tap at its
    /// topology point.
    pub fn process(&mut self, buffer: &mut [f32], tap: &mut AnalysisTap) {
        self.lowpass.render(buffer);
        self.highpass.render(buffer);
        tap.feed(buffer);
        self.limiter.render(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    const SAMPLE_RATE: f32 = 48_000.0;

    #[test]
    fn tap_sees_filtered_signal_before_limiting() {
        let mut chain = SignalChain::new(20_000.0, 20.0, SAMPLE_RATE);
        let mut tap = AnalysisTap::new(SAMPLE_RATE);

        // Hot signal: the limiter will pull it down, the tap must not.
        let mut buffer: Vec<f32> = (0..2048)
            .map(|n| (TAU * 440.0 * n as f32 / SAMPLE_RATE).sin())
            .collect();
        chain.process(&mut buffer, &mut tap);

        let frame = tap.sample();
        let tap_peak = frame.time_domain.iter().fold(0.0f32, |a, &s| a.max(s.abs()));
        assert!(tap_peak > 0.9, "tap should see the unlimited signal");

        // Once the limiter's detector has settled, the output is well below
        // the tapped level.
        let settled_peak = buffer[1536..].iter().fold(0.0f32, |a, &s| a.max(s.abs()));
        assert!(settled_peak < 0.5, "output should be gain-reduced, got {settled_peak}");
    }

    #[test]
    fn lowpass_stage_shapes_the_output() {
        let mut open = SignalChain::new(20_000.0, 20.0, SAMPLE_RATE);
        let mut closed = SignalChain::new(200.0, 20.0, SAMPLE_RATE);
        let mut tap_a = AnalysisTap::new(SAMPLE_RATE);
        let mut tap_b = AnalysisTap::new(SAMPLE_RATE);

        let signal: Vec<f32> = (0..4096)
            .map(|n| 0.05 * (TAU * 4_000.0 * n as f32 / SAMPLE_RATE).sin())
            .collect();

        let mut through_open = signal.clone();
        open.process(&mut through_open, &mut tap_a);
        let mut through_closed = signal;
        closed.process(&mut through_closed, &mut tap_b);

        let peak = |b: &[f32]| b[1024..].iter().fold(0.0f32, |a, &s| a.max(s.abs()));
        assert!(peak(&through_closed) < peak(&through_open) * 0.5);
    }
}
