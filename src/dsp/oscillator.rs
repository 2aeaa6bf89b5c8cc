use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Oscillator
==========

The raw sound source for a voice. A phase accumulator wraps in [0, 1) once
per cycle; each waveform is a fixed function of that phase:

  Sine      sin(2*pi*phase)           fundamental only, smooth and hollow
  Square    +1 / -1 at half cycle     odd harmonics, hollow but powerful
  Sawtooth  ramp -1 -> +1             all harmonics, bright and buzzy
  Triangle  folded ramp               weak odd harmonics, soft and mellow

Switching the waveform mid-note keeps the phase accumulator, so a retarget
changes timbre without a discontinuity in cycle position. This mirrors how
the selector on a hardware synth behaves while a key is held.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

pub struct Oscillator {
    waveform: Waveform,
    frequency_hz: f32,
    /// Normalized phase in [0, 1). One wrap = one cycle.
    phase: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency_hz: f32) -> Self {
        Self {
            waveform,
            frequency_hz,
            phase: 0.0,
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn frequency(&self) -> f32 {
        self.frequency_hz
    }

    /// Retarget the waveform in place. Phase is preserved so a change while
    /// the note is sounding does not click.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    #[inline]
    fn shape(&self) -> f32 {
        match self.waveform {
            Waveform::Sine => (TAU * self.phase).sin(),
            Waveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * self.phase - 1.0,
            Waveform::Triangle => {
                // -1 -> +1 -> -1 over one cycle, peak at half phase
                let folded = 4.0 * (self.phase - (self.phase + 0.5).floor()).abs();
                folded - 1.0
            }
        }
    }

    #[inline]
    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        let value = self.shape();
        self.phase += self.frequency_hz / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        value
    }

    /// Fill a block with oscillator output.
    pub fn render(&mut self, out: &mut [f32], sample_rate: f32) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(sample_rate);
        }
    }
}
