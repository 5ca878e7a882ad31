//! Engine configuration surface.
//!
//! Everything is settable before the first tick; most knobs can also be
//! changed live via [`crate::Engine::update_config`]. Validation happens at
//! construction/update time so a running engine never has to re-check.

use crate::palette::{default_palette, Rgba};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of grid columns.
pub const MAX_COLUMNS: usize = 100;
/// Maximum number of stacked rows per column.
pub const MAX_ROWS: usize = 20;

/// Errors surfaced when a configuration is rejected.
///
/// These are not recoverable mid-run; fix the configuration and reinitialize.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Column count outside `1..=MAX_COLUMNS`
    #[error("column count {0} out of range 1..=100")]
    ColumnCount(usize),

    /// Row count outside `1..=MAX_ROWS`
    #[error("row count {0} out of range 1..=20")]
    RowCount(usize),

    /// Palette cannot cover every column
    #[error("palette has {palette} colors but {columns} columns are configured")]
    PaletteTooShort {
        /// Number of palette entries provided
        palette: usize,
        /// Configured column count
        columns: usize,
    },

    /// Band-limited beat detection needs a non-empty frequency range
    #[error("invalid beat band: {min_hz} Hz .. {max_hz} Hz")]
    InvalidBeatBand {
        /// Lower edge of the configured band
        min_hz: f32,
        /// Upper edge of the configured band
        max_hz: f32,
    },

    /// Spectrum length must be known and non-zero
    #[error("spectrum bin count must be > 0")]
    ZeroSpectrumBins,

    /// Sample rate is needed for Hz to bin conversion
    #[error("sample rate must be > 0")]
    ZeroSampleRate,
}

/// How per-column intensities are normalized for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GainMode {
    /// Normalize against a decaying running maximum of observed intensities.
    Auto {
        /// Per-second decay rate of the running maximum
        decay_speed: f32,
    },
    /// Scale raw intensities by a fixed multiplier, clamp to [0, 1].
    Manual {
        /// Fixed intensity multiplier
        gain: f32,
    },
}

/// Which energy definition feeds the beat detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BeatMode {
    /// Average spectrum magnitude over a frequency band (cleaner beat edges
    /// for low-frequency percussive content).
    Band {
        /// Lower band edge in Hz
        min_hz: f32,
        /// Upper band edge in Hz
        max_hz: f32,
    },
    /// Mean of squared time-domain samples from the tick's waveform buffer.
    Wideband,
}

/// How the shuffler perturbs the column index map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShuffleStyle {
    /// Cyclic shift by one position; slow continuous drift.
    Rotate,
    /// Fisher-Yates permutation; abrupt remapping.
    Random,
}

/// Periodic remapping of which spectrum region feeds which column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShuffleConfig {
    /// Disabled shuffling freezes the map at its last state.
    pub enabled: bool,
    /// Seconds between remaps (rhythm adaptation may override).
    pub interval: f32,
    /// Remap style.
    pub style: ShuffleStyle,
}

impl Default for ShuffleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: 8.0,
            style: ShuffleStyle::Rotate,
        }
    }
}

/// Retunes smoothing time and shuffle cadence from the music's dynamics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RhythmConfig {
    /// Disabled adaptation keeps `base_smoothing_time` and the configured
    /// shuffle interval.
    pub enabled: bool,
    /// Snappiest height smoothing time constant, seconds.
    pub min_smoothing_time: f32,
    /// Calmest height smoothing time constant, seconds.
    pub max_smoothing_time: f32,
    /// Fastest shuffle period, seconds.
    pub min_shuffle_interval: f32,
    /// Slowest shuffle period, seconds.
    pub max_shuffle_interval: f32,
    /// Per-second blend rate toward the newly measured spread.
    pub response_speed: f32,
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_smoothing_time: 0.05,
            max_smoothing_time: 0.35,
            min_shuffle_interval: 2.0,
            max_shuffle_interval: 16.0,
            response_speed: 0.8,
        }
    }
}

/// Re-floors columns that sit pinned near maximum during loud passages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AntiStuckConfig {
    /// Disabled suppression passes normalized intensity through unchanged.
    pub enabled: bool,
    /// Normalized intensity above which a column counts as stuck.
    pub threshold: f32,
    /// Seconds a column may stay above the threshold before re-flooring.
    pub time_limit: f32,
    /// Seconds over which the floor pursues the current intensity.
    pub baseline_memory: f32,
}

impl Default for AntiStuckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.85,
            time_limit: 1.5,
            baseline_memory: 0.6,
        }
    }
}

/// Beat detection and the visual pulse it triggers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatConfig {
    /// Energy definition.
    pub mode: BeatMode,
    /// Multiplier applied to the firing energy for the height bonus.
    pub boost: f32,
    /// Beat fires when energy exceeds reference x ratio.
    pub threshold_ratio: f32,
    /// Per-tick blend rate of the reference toward the current energy.
    pub decay_speed: f32,
    /// Seconds the visual pulse lasts after a beat.
    pub pulse_duration: f32,
    /// Floor for the decaying reference; prevents degeneracy at silence.
    pub min_energy_floor: f32,
    /// Absolute minimum energy below which no beat can fire.
    pub min_beat_energy: f32,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            mode: BeatMode::Band {
                min_hz: 60.0,
                max_hz: 120.0,
            },
            boost: 6.0,
            threshold_ratio: 1.3,
            decay_speed: 0.15,
            pulse_duration: 0.25,
            min_energy_floor: 1e-4,
            min_beat_energy: 1e-3,
        }
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of grid columns (N).
    pub columns: usize,
    /// Rows stacked per column (M).
    pub rows: usize,
    /// Spectrum frame length (K), fixed at initialization.
    pub spectrum_bins: usize,
    /// Sample rate of the audio source, for Hz to bin conversion.
    pub sample_rate: u32,

    /// Per-second rise rate of the envelope follower.
    pub attack_speed: f32,
    /// Per-second exponential fall rate of the envelope follower.
    pub release_speed: f32,
    /// Multiplier on the frame mean that forms the "breathing" floor.
    pub baseline_sensitivity: f32,
    /// Intensity normalization mode.
    pub gain: GainMode,

    /// Height smoothing time constant when rhythm adaptation is off, seconds.
    pub base_smoothing_time: f32,
    /// Palette rotation speed, positions per second.
    pub color_cycle_speed: f32,

    /// Shuffler settings.
    #[serde(default)]
    pub shuffle: ShuffleConfig,
    /// Rhythm adaptation settings.
    #[serde(default)]
    pub rhythm: RhythmConfig,
    /// Anti-stuck suppressor settings.
    #[serde(default)]
    pub anti_stuck: AntiStuckConfig,
    /// Beat detection settings.
    #[serde(default)]
    pub beat: BeatConfig,

    /// Fixed RNG seed for reproducible shuffle sequences; `None` seeds from
    /// the OS.
    #[serde(default)]
    pub shuffle_seed: Option<u64>,

    /// Per-column display colors; must cover at least `columns` entries.
    pub palette: Vec<Rgba>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let columns = 32;
        Self {
            columns,
            rows: 12,
            spectrum_bins: 512,
            sample_rate: 44100,
            attack_speed: 12.0,
            release_speed: 4.0,
            baseline_sensitivity: 0.4,
            gain: GainMode::Auto { decay_speed: 0.3 },
            base_smoothing_time: 0.15,
            color_cycle_speed: 0.5,
            shuffle: ShuffleConfig::default(),
            rhythm: RhythmConfig::default(),
            anti_stuck: AntiStuckConfig::default(),
            beat: BeatConfig::default(),
            shuffle_seed: None,
            palette: default_palette(columns),
        }
    }
}

impl EngineConfig {
    /// Check the configuration for values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns == 0 || self.columns > MAX_COLUMNS {
            return Err(ConfigError::ColumnCount(self.columns));
        }
        if self.rows == 0 || self.rows > MAX_ROWS {
            return Err(ConfigError::RowCount(self.rows));
        }
        if self.palette.len() < self.columns {
            return Err(ConfigError::PaletteTooShort {
                palette: self.palette.len(),
                columns: self.columns,
            });
        }
        if self.spectrum_bins == 0 {
            return Err(ConfigError::ZeroSpectrumBins);
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if let BeatMode::Band { min_hz, max_hz } = self.beat.mode {
            if min_hz >= max_hz || min_hz < 0.0 {
                return Err(ConfigError::InvalidBeatBand { min_hz, max_hz });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_columns_rejected() {
        let config = EngineConfig {
            columns: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ColumnCount(0)));
    }

    #[test]
    fn test_too_many_rows_rejected() {
        let config = EngineConfig {
            rows: MAX_ROWS + 1,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::RowCount(MAX_ROWS + 1)));
    }

    #[test]
    fn test_short_palette_rejected() {
        let mut config = EngineConfig::default();
        config.palette.truncate(config.columns - 1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PaletteTooShort { .. })
        ));
    }

    #[test]
    fn test_inverted_beat_band_rejected() {
        let config = EngineConfig {
            beat: BeatConfig {
                mode: BeatMode::Band {
                    min_hz: 200.0,
                    max_hz: 100.0,
                },
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBeatBand { .. })
        ));
    }

    #[test]
    fn test_wideband_mode_skips_band_check() {
        let config = EngineConfig {
            beat: BeatConfig {
                mode: BeatMode::Wideband,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let original = EngineConfig::default();
        let serialized = serde_json::to_string(&original).expect("Failed to serialize");
        let deserialized: EngineConfig =
            serde_json::from_str(&serialized).expect("Failed to deserialize");
        assert_eq!(original, deserialized);
    }
}
