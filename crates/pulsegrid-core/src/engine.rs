//! The per-tick visualization engine.
//!
//! Single-threaded and tick-driven: one `tick` call per rendering frame, no
//! blocking, every stage a bounded computation over the fixed-size column
//! arena. All mutable state is owned here; the spectrum frame is only read.

use crate::beat::BeatDetector;
use crate::column::ColumnState;
use crate::config::{BeatMode, ConfigError, EngineConfig, GainMode};
use crate::energy::{band_energy, frame_stats, magnitude, wideband_energy};
use crate::index_map::ColumnIndexMap;
use crate::math::{clamp01, smooth_damp};
use crate::palette::{ColorCycler, Rgba};
use crate::rhythm::{RhythmAdaptation, RhythmOutput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

/// Floor of the auto-gain ceiling; keeps normalization defined at silence.
const GAIN_FLOOR: f32 = 1e-3;
/// Per-second rate of the silence fade-out.
const SILENCE_FADE_RATE: f32 = 6.0;
/// Height smoothing time multiplier while a beat pulse is active.
const PULSE_SNAP: f32 = 0.35;

/// Everything the engine consumes in one tick.
#[derive(Debug, Clone, Copy)]
pub struct TickInput<'a> {
    /// Spectrum magnitude frame, length K. Shorter or degenerate frames are
    /// tolerated (clamped / sanitized).
    pub spectrum: &'a [f32],
    /// Time-domain samples for wideband beat detection; ignored in band mode.
    pub waveform: Option<&'a [f32]>,
    /// False routes the tick through the silence fallback.
    pub is_producing_audio: bool,
    /// Tick duration in seconds, > 0.
    pub delta_time: f32,
}

/// Audio-reactive grid engine: spectrum frames in, per-cell activation levels
/// and per-column colors out.
pub struct Engine {
    config: EngineConfig,
    columns: Vec<ColumnState>,
    index_map: ColumnIndexMap,
    rng: StdRng,
    beat: BeatDetector,
    rhythm: RhythmAdaptation,
    cycler: ColorCycler,
    /// Auto-gain ceiling: decaying running max of raw intensities.
    max_observed_intensity: f32,
    shuffle_timer: f32,
    /// Tuning from the most recent audible tick; silence keeps using it.
    tuning: RhythmOutput,
}

impl Engine {
    /// Build an engine from a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        debug!(
            columns = config.columns,
            rows = config.rows,
            bins = config.spectrum_bins,
            "engine created"
        );

        let tuning = RhythmOutput {
            smoothing_time: config.base_smoothing_time,
            shuffle_interval: config.shuffle.interval,
        };

        Ok(Self {
            columns: vec![ColumnState::default(); config.columns],
            index_map: ColumnIndexMap::identity(config.columns),
            rng,
            beat: BeatDetector::new(),
            rhythm: RhythmAdaptation::default(),
            cycler: ColorCycler::default(),
            max_observed_intensity: GAIN_FLOOR,
            shuffle_timer: 0.0,
            tuning,
            config,
        })
    }

    /// Run one tick of the pipeline.
    pub fn tick(&mut self, input: TickInput<'_>) {
        let dt = if input.delta_time.is_finite() {
            input.delta_time.max(0.0)
        } else {
            0.0
        };
        if dt <= 0.0 {
            return;
        }

        if !input.is_producing_audio || input.spectrum.is_empty() {
            self.fade_out(dt);
            return;
        }

        let stats = frame_stats(input.spectrum);

        self.tuning = self.rhythm.update(
            stats,
            &self.config.rhythm,
            self.config.base_smoothing_time,
            self.config.shuffle.interval,
            dt,
        );

        if self.config.shuffle.enabled {
            self.shuffle_timer += dt;
            if self.shuffle_timer >= self.tuning.shuffle_interval {
                self.index_map.remap(self.config.shuffle.style, &mut self.rng);
                self.shuffle_timer = 0.0;
                trace!(style = ?self.config.shuffle.style, "column map reshuffled");
            }
        }

        let energy = match self.config.beat.mode {
            BeatMode::Band { min_hz, max_hz } => band_energy(
                input.spectrum,
                min_hz,
                max_hz,
                self.config.sample_rate,
                self.config.spectrum_bins,
            ),
            BeatMode::Wideband => wideband_energy(input.waveform.unwrap_or(&[])),
        };
        self.beat.update(energy, &self.config.beat, dt);

        // Envelope pass: each column reads its mapped bin, floored at the
        // frame-mean baseline so near-silence still breathes.
        let baseline = stats.mean * self.config.baseline_sensitivity;
        let manual_gain = match self.config.gain {
            GainMode::Manual { gain } => Some(gain),
            GainMode::Auto { .. } => None,
        };
        let bins = self.config.spectrum_bins;
        let n = self.columns.len();
        let mut frame_max = 0.0f32;
        for c in 0..n {
            let bin = self.index_map.slot(c) * bins / n;
            let mut raw = magnitude(input.spectrum, bin);
            if let Some(gain) = manual_gain {
                raw *= gain;
            }
            raw = raw.max(baseline);
            frame_max = frame_max.max(raw);
            self.columns[c].follow(raw, self.config.attack_speed, self.config.release_speed, dt);
        }

        if let GainMode::Auto { decay_speed } = self.config.gain {
            self.max_observed_intensity = (self.max_observed_intensity
                * (1.0 - decay_speed * dt).max(0.0))
            .max(GAIN_FLOOR);
            if frame_max > self.max_observed_intensity {
                self.max_observed_intensity = frame_max;
            }
        }

        // Mix the beat pulse and settle displayed heights. The bonus is added
        // after suppression so a pulse bypasses the anti-stuck floor.
        let rows = self.config.rows as f32;
        let pulse = self.beat.pulse_factor(&self.config.beat);
        let bonus = self.beat.last_beat_energy() * self.config.beat.boost * pulse;
        let smoothing_time = if self.beat.pulse_active() {
            self.tuning.smoothing_time * PULSE_SNAP
        } else {
            self.tuning.smoothing_time
        };
        for col in &mut self.columns {
            let normalized = match self.config.gain {
                GainMode::Auto { .. } => {
                    clamp01(col.smoothed_intensity / self.max_observed_intensity)
                }
                GainMode::Manual { .. } => clamp01(col.smoothed_intensity),
            };
            let shown = col.suppress(normalized, &self.config.anti_stuck, dt);
            let target = (shown * rows + bonus).clamp(0.0, rows);
            col.visual_height = smooth_damp(
                col.visual_height,
                target,
                &mut col.height_velocity,
                smoothing_time,
                dt,
            )
            .clamp(0.0, rows);
        }

        self.cycler
            .advance(self.config.color_cycle_speed, dt, self.config.palette.len());
    }

    /// Silence fallback: bypass the pipeline and fade everything toward zero
    /// at a fixed fast rate, so playback stopping never freezes the display.
    fn fade_out(&mut self, dt: f32) {
        self.beat.decay_pulse(dt);
        let rows = self.config.rows as f32;
        let smoothing_time = self.tuning.smoothing_time;
        for col in &mut self.columns {
            col.fade(SILENCE_FADE_RATE, dt);
            col.visual_height = smooth_damp(
                col.visual_height,
                0.0,
                &mut col.height_velocity,
                smoothing_time,
                dt,
            )
            .clamp(0.0, rows);
        }
    }

    /// Activation level of cell (`column`, `row`) in [0, 1]: fully lit when
    /// the column's height exceeds `row + 1`, fractional for the topmost lit
    /// row, dark above.
    pub fn activation_level(&self, column: usize, row: usize) -> f32 {
        clamp01(self.columns[column].visual_height - row as f32)
    }

    /// Current display color for `column`.
    pub fn column_color(&self, column: usize) -> Rgba {
        let len = self.config.palette.len();
        self.config.palette[self.cycler.palette_index(column, len)]
    }

    /// Displayed height of `column` in rows, within [0, M].
    pub fn column_height(&self, column: usize) -> f32 {
        self.columns[column].visual_height
    }

    /// Unnormalized envelope intensity of `column`.
    pub fn smoothed_intensity(&self, column: usize) -> f32 {
        self.columns[column].smoothed_intensity
    }

    /// Number of grid columns.
    pub fn columns(&self) -> usize {
        self.columns.len()
    }

    /// Rows per column.
    pub fn rows(&self) -> usize {
        self.config.rows
    }

    /// Current column-to-slot permutation.
    pub fn index_map(&self) -> &ColumnIndexMap {
        &self.index_map
    }

    /// Current auto-gain ceiling. Never below its epsilon floor.
    pub fn max_observed_intensity(&self) -> f32 {
        self.max_observed_intensity
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Re-layout the grid between ticks. Fully reinitializes per-column and
    /// analysis state; not safe to call from within a tick.
    pub fn set_grid(&mut self, columns: usize, rows: usize) -> Result<(), ConfigError> {
        let mut config = self.config.clone();
        config.columns = columns;
        config.rows = rows;
        config.validate()?;
        self.config = config;

        self.columns = vec![ColumnState::default(); columns];
        self.index_map = ColumnIndexMap::identity(columns);
        self.beat.reset();
        self.rhythm.reset();
        self.shuffle_timer = 0.0;
        self.max_observed_intensity = GAIN_FLOOR;
        self.tuning = RhythmOutput {
            smoothing_time: self.config.base_smoothing_time,
            shuffle_interval: self.config.shuffle.interval,
        };

        debug!(columns, rows, "grid re-layout");
        Ok(())
    }

    /// Swap in a new configuration between ticks. A change of column count
    /// triggers a full re-layout; other changes keep accumulated state.
    pub fn update_config(&mut self, config: EngineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let relayout = config.columns != self.columns.len();
        let (columns, rows) = (config.columns, config.rows);
        self.config = config;
        if relayout {
            self.set_grid(columns, rows)?;
        }
        debug!("engine configuration updated");
        Ok(())
    }
}
