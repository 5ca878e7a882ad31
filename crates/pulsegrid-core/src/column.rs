//! Per-column state: envelope follower and anti-stuck suppressor.

use crate::config::AntiStuckConfig;
use crate::math::{clamp01, lerp, smooth_damp};

/// Mutable state for one grid column.
///
/// Lives in a flat arena indexed by column number; reset only on explicit
/// re-layout.
#[derive(Debug, Clone, Default)]
pub struct ColumnState {
    /// Envelope-followed intensity, >= 0, unnormalized.
    pub(crate) smoothed_intensity: f32,
    /// Displayed height in rows, within [0, M].
    pub(crate) visual_height: f32,
    /// Momentum of the height smoother.
    pub(crate) height_velocity: f32,
    /// Seconds this column has sat above the anti-stuck threshold.
    pub(crate) stuck_timer: f32,
    /// Per-column floor subtracted while the column is stuck.
    pub(crate) falloff_baseline: f32,
    /// Momentum of the floor's damped pursuit.
    pub(crate) falloff_velocity: f32,
}

impl ColumnState {
    /// Asymmetric envelope update: fast attack toward `raw`, exponential
    /// release toward zero, never negative.
    pub(crate) fn follow(&mut self, raw: f32, attack_speed: f32, release_speed: f32, dt: f32) {
        if raw > self.smoothed_intensity {
            self.smoothed_intensity =
                lerp(self.smoothed_intensity, raw, clamp01(attack_speed * dt));
        } else {
            self.smoothed_intensity =
                (self.smoothed_intensity - self.smoothed_intensity * release_speed * dt).max(0.0);
        }
    }

    /// Fade toward zero at `rate` per second (silence fallback).
    pub(crate) fn fade(&mut self, rate: f32, dt: f32) {
        self.smoothed_intensity = lerp(self.smoothed_intensity, 0.0, clamp01(rate * dt));
        self.stuck_timer = 0.0;
    }

    /// Anti-stuck suppression of a normalized intensity.
    ///
    /// A column holding above the threshold past the time limit grows a floor
    /// that pursues the current level; the output becomes the re-normalized
    /// excess above that floor, revealing variation above the "new normal".
    /// While not stuck the floor relaxes linearly back toward zero.
    pub(crate) fn suppress(&mut self, normalized: f32, config: &AntiStuckConfig, dt: f32) -> f32 {
        if !config.enabled {
            return normalized;
        }

        if normalized > config.threshold {
            self.stuck_timer += dt;
        } else {
            self.stuck_timer = 0.0;
        }

        if self.stuck_timer > config.time_limit {
            self.falloff_baseline = clamp01(smooth_damp(
                self.falloff_baseline,
                normalized,
                &mut self.falloff_velocity,
                config.baseline_memory,
                dt,
            ));
        } else {
            let relax = dt / config.baseline_memory.max(1e-3);
            self.falloff_baseline = (self.falloff_baseline - relax).max(0.0);
            self.falloff_velocity = 0.0;
        }

        let span = (1.0 - self.falloff_baseline).max(1e-3);
        clamp01((normalized - self.falloff_baseline) / span)
    }
}
