//! Pulsegrid Core - Audio-reactive grid visualization engine
//!
//! This crate turns a per-tick spectrum magnitude frame into per-cell
//! activation levels for an N-column x M-row grid, including:
//! - Per-column envelope following with auto-gain normalization
//! - Band-limited beat detection with adaptive thresholds and a visual pulse
//! - Periodic shuffling of the column-to-spectrum mapping
//! - Rhythm adaptation that retunes smoothing and shuffle cadence
//! - Anti-stuck suppression of columns pinned at maximum
//! - A rotating per-column color cycler
//!
//! Audio decoding, playback transport and rendering are external concerns:
//! the engine consumes [`TickInput`] and exposes activation levels + colors.

#![warn(missing_docs)]

pub mod analyzer;
pub mod beat;
mod column;
pub mod config;
pub mod energy;
pub mod engine;
pub mod index_map;
mod math;
pub mod palette;
pub mod rhythm;

// --- Re-exports grouped by category ---

// Engine & tick surface
pub use engine::{Engine, TickInput};

// Configuration
pub use config::{
    AntiStuckConfig, BeatConfig, BeatMode, ConfigError, EngineConfig, GainMode, RhythmConfig,
    ShuffleConfig, ShuffleStyle, MAX_COLUMNS, MAX_ROWS,
};

// Pipeline components
pub use beat::BeatDetector;
pub use energy::{band_energy, frame_stats, wideband_energy, FrameStats};
pub use index_map::ColumnIndexMap;
pub use rhythm::{RhythmAdaptation, RhythmOutput};

// Colors
pub use palette::{default_palette, ColorCycler, Rgba};

// Spectrum source adapter
pub use analyzer::{AnalyzerConfig, SpectrumAnalyzer, SpectrumFrame};
