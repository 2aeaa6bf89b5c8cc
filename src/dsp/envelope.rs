use crate::MIN_TIME;

/*
ADSR Envelope
=============

Linear gain-vs-time shaping for one voice. Four segments:

  Level
    1.0 |     /\
        |    /  \___________
    S   |   /               \
        |  /                 \
    0.0 |_/___________________\___  Time
        Attack Decay  Sustain  Release

The gate drives a small state machine:

  Idle --note_on--> Attack --level=1--> Decay --level=S--> Sustain
  any stage --note_off--> Release --level=0--> Idle

Two contract points matter more than the ramp math:

  * Release starts from the CURRENT level, wherever the gate drops. An off
    during attack releases from that partial level, never from 1.0. This is
    what prevents clicks on short taps.

  * The release duration is supplied at note_off time, not at construction.
    The registry reads the process-wide release setting at the instant the
    key comes up, so a user tweak between press and release is honored.

Parameters captured at construction are fixed for this envelope's lifetime;
a mid-decay sustain change elsewhere never bends an in-flight ramp.

The sustain level is clamped to (SUSTAIN_FLOOR, 1.0]. A sustain of exactly
zero would make a held note indistinguishable from a finished one, and the
registry relies on "level reached zero in Release" as the disposal signal.
*/

/// Re-trigger fade length in seconds. Deliberately short and fixed so that
/// evicting a voice never clicks, regardless of the user's release setting.
pub const QUICK_FADE: f32 = 0.02;

/// Smallest permitted sustain level. See module notes.
pub const SUSTAIN_FLOOR: f32 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,    // gate low, level = 0
    Attack,  // ramping up to 1.0
    Decay,   // ramping down to the sustain level
    Sustain, // holding until the gate drops
    Release, // ramping down to 0
}

pub struct Envelope {
    sample_rate: f32,

    // Shape parameters, fixed at note-on.
    attack_time: f32,
    decay_time: f32,
    sustain_level: f32,

    // Runtime state.
    stage: EnvelopeStage,
    level: f32,

    // Release bookkeeping, snapshotted at note_off for precision.
    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl Envelope {
    pub fn new(sample_rate: f32, attack: f32, decay: f32, sustain: f32) -> Self {
        Self {
            sample_rate,
            attack_time: attack.max(MIN_TIME),
            decay_time: decay.max(MIN_TIME),
            sustain_level: sustain.clamp(SUSTAIN_FLOOR, 1.0),
            stage: EnvelopeStage::Idle,
            level: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        }
    }

    /// Gate high: start the attack phase from zero.
    pub fn gate_on(&mut self) {
        self.level = 0.0;
        self.stage = EnvelopeStage::Attack;
        self.release_elapsed_samples = 0;
    }

    /// Gate low: ramp from the current level to zero over `release_seconds`.
    ///
    /// No-op while idle, and no-op if release is already underway: a second
    /// note_off must not restart or reschedule the ramp.
    pub fn gate_off(&mut self, release_seconds: f32) {
        if matches!(self.stage, EnvelopeStage::Idle | EnvelopeStage::Release) {
            return;
        }
        self.begin_release(release_seconds);
    }

    /// Forced eviction on re-trigger: a fixed short fade from the current
    /// level, shorter than any sensible user release. Unlike `gate_off`,
    /// this re-schedules even if a normal release is already in flight.
    pub fn quick_fade(&mut self) {
        if matches!(self.stage, EnvelopeStage::Idle) {
            return;
        }
        self.begin_release(QUICK_FADE);
    }

    fn begin_release(&mut self, release_seconds: f32) {
        self.release_start_level = self.level;
        self.release_total_samples = (release_seconds.max(MIN_TIME) * self.sample_rate)
            .round()
            .max(1.0) as u32;
        self.release_elapsed_samples = 0;
        self.stage = EnvelopeStage::Release;
    }

    /// Advance by one sample and return the new level.
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }

            EnvelopeStage::Attack => {
                let increment = 1.0 / (self.attack_time * self.sample_rate);
                self.level += increment;

                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }

            EnvelopeStage::Decay => {
                let target = self.sustain_level;
                let decrement = (1.0 - target) / (self.decay_time * self.sample_rate);
                self.level -= decrement;

                if self.level <= target {
                    self.level = target;
                    self.stage = EnvelopeStage::Sustain;
                }
            }

            EnvelopeStage::Sustain => {
                self.level = self.sustain_level;
            }

            EnvelopeStage::Release => {
                let progress =
                    self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);

                self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);

                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// Apply the envelope to a block in place (gain multiply per sample).
    pub fn apply(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample *= self.next_sample();
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.stage, EnvelopeStage::Idle)
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn advance(env: &mut Envelope, samples: usize) {
        for _ in 0..samples {
            env.next_sample();
        }
    }

    #[test]
    fn attack_reaches_full_level_on_time() {
        let mut env = Envelope::new(SAMPLE_RATE, 0.01, 0.1, 0.7);
        env.gate_on();
        advance(&mut env, (0.01 * SAMPLE_RATE) as usize);

        assert!(env.level() > 0.99, "attack should reach full level");
        assert!(env.stage() != EnvelopeStage::Attack);
    }

    #[test]
    fn decay_settles_on_sustain_level() {
        let sustain = 0.6;
        let mut env = Envelope::new(SAMPLE_RATE, 0.01, 0.05, sustain);
        env.gate_on();
        advance(&mut env, ((0.01 + 0.05) * SAMPLE_RATE) as usize + 5);

        assert_eq!(env.stage(), EnvelopeStage::Sustain);
        assert!((env.level() - sustain).abs() < 0.05);
    }

    #[test]
    fn release_starts_from_partial_attack_level() {
        let mut env = Envelope::new(SAMPLE_RATE, 0.1, 0.05, 0.5);
        env.gate_on();
        // Halfway through the attack, well below 1.0.
        advance(&mut env, (0.05 * SAMPLE_RATE) as usize);
        let level_at_off = env.level();
        assert!(level_at_off < 0.6);

        env.gate_off(0.03);
        env.next_sample();
        assert!(
            env.level() <= level_at_off,
            "release must ramp down from the partial level, not jump to 1.0"
        );
    }

    #[test]
    fn release_falls_back_to_idle() {
        let release = 0.03;
        let mut env = Envelope::new(SAMPLE_RATE, 0.01, 0.05, 0.5);
        env.gate_on();
        advance(&mut env, (0.02 * SAMPLE_RATE) as usize);

        env.gate_off(release);
        advance(&mut env, (release * SAMPLE_RATE) as usize + 2);

        assert!(env.level() <= 0.001);
        assert_eq!(env.stage(), EnvelopeStage::Idle);
    }

    #[test]
    fn duplicate_gate_off_does_not_reschedule() {
        let mut env = Envelope::new(SAMPLE_RATE, 0.01, 0.05, 0.5);
        env.gate_on();
        advance(&mut env, 30);

        env.gate_off(0.05);
        advance(&mut env, 20);
        let mid_release = env.level();

        // A second gate_off with a long release must not stretch the ramp.
        env.gate_off(10.0);
        env.next_sample();
        assert!(env.level() < mid_release);
        advance(&mut env, (0.05 * SAMPLE_RATE) as usize);
        assert_eq!(env.stage(), EnvelopeStage::Idle);
    }

    #[test]
    fn zero_sustain_is_clamped_to_floor() {
        let mut env = Envelope::new(SAMPLE_RATE, 0.001, 0.001, 0.0);
        env.gate_on();
        advance(&mut env, 10);

        assert_eq!(env.stage(), EnvelopeStage::Sustain);
        assert!(env.level() >= SUSTAIN_FLOOR);
        assert!(env.is_active(), "clamped sustain must keep the voice alive");
    }

    #[test]
    fn quick_fade_is_shorter_than_configured_release() {
        let mut env = Envelope::new(SAMPLE_RATE, 0.001, 0.01, 0.8);
        env.gate_on();
        advance(&mut env, 50);

        env.quick_fade();
        advance(&mut env, (QUICK_FADE * SAMPLE_RATE) as usize + 2);
        assert_eq!(env.stage(), EnvelopeStage::Idle);
    }

    #[test]
    fn quick_fade_overrides_release_in_flight() {
        let mut env = Envelope::new(SAMPLE_RATE, 0.001, 0.01, 0.8);
        env.gate_on();
        advance(&mut env, 50);
        env.gate_off(5.0); // long user release
        advance(&mut env, 10);

        env.quick_fade();
        advance(&mut env, (QUICK_FADE * SAMPLE_RATE) as usize + 2);
        assert_eq!(
            env.stage(),
            EnvelopeStage::Idle,
            "eviction fade must cut through a slow release"
        );
    }
}
