//! Beat detection against an adaptive energy reference.

use crate::config::BeatConfig;
use crate::math::{clamp01, lerp};
use tracing::debug;

/// Detects percussive onsets by comparing band energy against a decaying
/// reference of recent loudness.
///
/// The ratio threshold adapts to quiet and loud passages alike: sustained
/// loud sections raise the reference and stop retriggering, quiet passages
/// lower it so soft hits still register. Epsilon floors keep the detector
/// well-behaved at absolute silence.
#[derive(Debug, Clone)]
pub struct BeatDetector {
    /// Exponential reference of recent energy.
    prev_energy: f32,
    /// Energy of the most recent beat, feeds the pulse bonus.
    last_beat_energy: f32,
    /// Remaining pulse time, seconds.
    pulse_timer: f32,
    /// Set once a first usable energy reading has seeded the reference.
    primed: bool,
}

impl BeatDetector {
    /// Detector with an unseeded reference; the first audible tick primes it
    /// without firing.
    pub fn new() -> Self {
        Self {
            prev_energy: 0.0,
            last_beat_energy: 0.0,
            pulse_timer: 0.0,
            primed: false,
        }
    }

    /// Feed one tick's energy. Returns true when a beat fires.
    pub fn update(&mut self, energy: f32, config: &BeatConfig, dt: f32) -> bool {
        self.pulse_timer = (self.pulse_timer - dt).max(0.0);

        let energy = if energy.is_finite() { energy.max(0.0) } else { 0.0 };

        if !self.primed {
            if energy > config.min_energy_floor {
                self.prev_energy = energy;
                self.primed = true;
            }
            return false;
        }

        // Threshold uses the reference as it stood entering this tick, so the
        // attack itself does not inflate the bar it must clear.
        let reference = self.prev_energy;
        self.prev_energy = lerp(self.prev_energy, energy, clamp01(config.decay_speed))
            .max(config.min_energy_floor);

        let threshold = (reference * config.threshold_ratio).max(config.min_beat_energy);
        let fired = energy > threshold;
        if fired {
            self.last_beat_energy = energy;
            self.pulse_timer = config.pulse_duration;
            debug!(energy, threshold, "beat detected");
        }
        fired
    }

    /// Let the pulse decay without feeding energy (silence path).
    pub fn decay_pulse(&mut self, dt: f32) {
        self.pulse_timer = (self.pulse_timer - dt).max(0.0);
    }

    /// Linear 1 -> 0 ramp over the pulse duration; 0 when no pulse is active.
    pub fn pulse_factor(&self, config: &BeatConfig) -> f32 {
        if config.pulse_duration <= 0.0 {
            return 0.0;
        }
        clamp01(self.pulse_timer / config.pulse_duration)
    }

    /// True while a beat pulse is still running.
    pub fn pulse_active(&self) -> bool {
        self.pulse_timer > 0.0
    }

    /// Energy recorded at the most recent beat.
    pub fn last_beat_energy(&self) -> f32 {
        self.last_beat_energy
    }

    /// Forget all history (re-layout).
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for BeatDetector {
    fn default() -> Self {
        Self::new()
    }
}
