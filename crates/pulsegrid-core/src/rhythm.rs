//! Rhythm adaptation: retunes smoothing and shuffle cadence from the
//! spectrum's statistical spread.

use crate::config::RhythmConfig;
use crate::energy::FrameStats;
use crate::math::{clamp01, inverse_lerp, lerp};

/// Empirical spread bounds on magnitude std-dev. Spread at or below the low
/// bound reads as fully sustained material, at or above the high bound as
/// fully percussive.
const SPREAD_LOW: f32 = 0.01;
const SPREAD_HIGH: f32 = 0.15;

/// Smoothing time and shuffle period chosen for the current tick.
#[derive(Debug, Clone, Copy)]
pub struct RhythmOutput {
    /// Height smoother time constant, seconds.
    pub smoothing_time: f32,
    /// Shuffler period, seconds.
    pub shuffle_interval: f32,
}

/// Tracks a smoothed measure of the music's dynamic range and maps it onto
/// the engine's own tuning parameters.
///
/// Dynamic, percussive material (high spread) yields snappier smoothing and
/// faster shuffling; sustained tones yield slower, calmer motion.
#[derive(Debug, Clone, Default)]
pub struct RhythmAdaptation {
    smoothed_spread: f32,
}

impl RhythmAdaptation {
    /// Feed this tick's frame statistics and derive the tuning parameters.
    ///
    /// `base_smoothing_time` and `base_shuffle_interval` are returned
    /// unchanged when adaptation is disabled.
    pub fn update(
        &mut self,
        stats: FrameStats,
        config: &RhythmConfig,
        base_smoothing_time: f32,
        base_shuffle_interval: f32,
        dt: f32,
    ) -> RhythmOutput {
        if !config.enabled {
            return RhythmOutput {
                smoothing_time: base_smoothing_time,
                shuffle_interval: base_shuffle_interval,
            };
        }

        let blend = clamp01(config.response_speed * dt);
        self.smoothed_spread = lerp(self.smoothed_spread, stats.std_dev, blend);

        // High spread maps to the snappy end of both ranges.
        let t = inverse_lerp(SPREAD_LOW, SPREAD_HIGH, self.smoothed_spread);
        RhythmOutput {
            smoothing_time: lerp(config.max_smoothing_time, config.min_smoothing_time, t),
            shuffle_interval: lerp(config.max_shuffle_interval, config.min_shuffle_interval, t),
        }
    }

    /// Forget the smoothed spread (re-layout).
    pub fn reset(&mut self) {
        self.smoothed_spread = 0.0;
    }
}
