/*
Output limiter
==============

Feed-forward soft-knee compressor sitting at the very end of the shared
chain. Its job is loudness safety, not tone shaping: several voices mixed at
full scale would otherwise clip the output sink. The constants are fixed
(the chain exposes no controls for them):

  threshold  -24 dB
  knee        30 dB
  ratio       12 : 1
  attack       3 ms
  release    250 ms

Detector: the input magnitude in dB is smoothed with separate attack and
release one-pole coefficients. Gain computer: standard soft-knee transfer
curve, quadratic inside the knee. The computed reduction (in dB) is applied
as a linear gain per sample.
*/

const THRESHOLD_DB: f32 = -24.0;
const KNEE_DB: f32 = 30.0;
const RATIO: f32 = 12.0;
const ATTACK_SECONDS: f32 = 0.003;
const RELEASE_SECONDS: f32 = 0.25;

/// Detector floor; treats anything quieter as silence.
const FLOOR_DB: f32 = -96.0;

pub struct Limiter {
    attack_coeff: f32,
    release_coeff: f32,
    /// Smoothed detector level in dB.
    envelope_db: f32,
}

impl Limiter {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            attack_coeff: (-1.0 / (ATTACK_SECONDS * sample_rate)).exp(),
            release_coeff: (-1.0 / (RELEASE_SECONDS * sample_rate)).exp(),
            envelope_db: FLOOR_DB,
        }
    }

    /// Soft-knee gain computer: desired output level for a detector level.
    #[inline]
    fn gain_reduction_db(level_db: f32) -> f32 {
        let half_knee = KNEE_DB / 2.0;
        if level_db < THRESHOLD_DB - half_knee {
            0.0
        } else if level_db <= THRESHOLD_DB + half_knee {
            let over = level_db - THRESHOLD_DB + half_knee;
            (1.0 / RATIO - 1.0) * over * over / (2.0 * KNEE_DB)
        } else {
            THRESHOLD_DB + (level_db - THRESHOLD_DB) / RATIO - level_db
        }
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32) -> f32 {
        let magnitude_db = if sample.abs() > 1e-5 {
            20.0 * sample.abs().log10()
        } else {
            FLOOR_DB
        };

        // Fast attack, slow release.
        let coeff = if magnitude_db > self.envelope_db {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope_db = magnitude_db + (self.envelope_db - magnitude_db) * coeff;

        let reduction_db = Self::gain_reduction_db(self.envelope_db);
        sample * 10.0f32.powf(reduction_db / 20.0)
    }

    /// Process a block in place.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.envelope_db = FLOOR_DB;
    }
}
