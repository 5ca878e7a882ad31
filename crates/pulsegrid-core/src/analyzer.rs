//! Spectrum source adapter: turns raw audio samples into the magnitude
//! frames the engine consumes.
//!
//! The engine itself only reads frames; any provider works. This one does
//! Hann-windowed FFTs over a ring buffer at a configurable hop size and
//! publishes the newest frame over a bounded channel, so an audio callback
//! thread can feed it while the render thread ticks the engine.

use crossbeam_channel::{bounded, Receiver, Sender};
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;
use tracing::debug;

/// One analyzed snapshot: spectrum magnitudes plus the waveform that
/// produced them (for wideband beat detection).
#[derive(Debug, Clone, Default)]
pub struct SpectrumFrame {
    /// Magnitudes for the positive-frequency half of the FFT.
    pub magnitudes: Vec<f32>,
    /// Most recent input samples, up to one FFT window.
    pub waveform: Vec<f32>,
    /// Seconds of audio consumed when this frame was produced.
    pub timestamp: f64,
}

/// Configuration for [`SpectrumAnalyzer`].
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerConfig {
    /// Sample rate of the incoming audio.
    pub sample_rate: u32,
    /// FFT size (power of two).
    pub fft_size: usize,
    /// Overlap ratio between consecutive FFT frames, [0, 1).
    pub overlap: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            fft_size: 1024,
            overlap: 0.5,
        }
    }
}

/// Windowed, ring-buffered FFT producer of [`SpectrumFrame`]s.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    config: AnalyzerConfig,

    input_buffer: Vec<f32>,
    write_pos: usize,
    samples_since_fft: usize,
    hop_size: usize,
    total_samples: u64,

    fft_buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    window: Vec<f32>,

    latest: SpectrumFrame,
    frame_sender: Sender<SpectrumFrame>,
    frame_receiver: Receiver<SpectrumFrame>,
}

fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let t = i as f32 / (len.max(2) - 1) as f32;
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * t).cos())
        })
        .collect()
}

impl SpectrumAnalyzer {
    /// Build an analyzer for the given configuration.
    pub fn new(config: AnalyzerConfig) -> Self {
        let fft_size = config.fft_size.max(2);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        let hop_size = (((1.0 - config.overlap) * fft_size as f32) as usize).max(1);
        let (tx, rx) = bounded(16);

        debug!(
            sample_rate = config.sample_rate,
            fft_size, hop_size, "spectrum analyzer created"
        );

        Self {
            fft,
            config,
            input_buffer: vec![0.0; fft_size],
            write_pos: 0,
            samples_since_fft: 0,
            hop_size,
            total_samples: 0,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            window: hann_window(fft_size),
            latest: SpectrumFrame::default(),
            frame_sender: tx,
            frame_receiver: rx,
        }
    }

    /// Feed raw samples. Non-finite samples are scrubbed to zero before they
    /// can contaminate the spectrum.
    pub fn process_samples(&mut self, samples: &[f32]) {
        let fft_size = self.input_buffer.len();
        for &sample in samples {
            let sample = if sample.is_finite() { sample } else { 0.0 };
            self.input_buffer[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % fft_size;
            self.samples_since_fft += 1;
            self.total_samples += 1;

            if self.samples_since_fft >= self.hop_size && self.total_samples >= fft_size as u64 {
                self.analyze_window();
                self.samples_since_fft = 0;
            }
        }
    }

    fn analyze_window(&mut self) {
        let fft_size = self.input_buffer.len();

        // Unwrap the ring buffer: the write position is the oldest sample.
        for i in 0..fft_size {
            let src = (self.write_pos + i) % fft_size;
            self.fft_buffer[i] = Complex::new(self.input_buffer[src] * self.window[i], 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch);

        let half = fft_size / 2;
        let norm = 1.0 / (fft_size as f32).sqrt();
        let mut magnitudes = Vec::with_capacity(half);
        for bin in &self.fft_buffer[..half] {
            magnitudes.push(bin.norm() * norm);
        }

        let mut waveform = Vec::with_capacity(fft_size);
        for i in 0..fft_size {
            waveform.push(self.input_buffer[(self.write_pos + i) % fft_size]);
        }

        let frame = SpectrumFrame {
            magnitudes,
            waveform,
            timestamp: self.total_samples as f64 / self.config.sample_rate.max(1) as f64,
        };
        self.latest = frame.clone();
        let _ = self.frame_sender.try_send(frame);
    }

    /// Most recent frame (empty until one full FFT window has been fed).
    pub fn latest_frame(&self) -> &SpectrumFrame {
        &self.latest
    }

    /// Drain one frame from the channel, if any is pending.
    pub fn try_receive(&self) -> Option<SpectrumFrame> {
        self.frame_receiver.try_recv().ok()
    }

    /// Number of spectrum bins this analyzer produces per frame.
    pub fn bins(&self) -> usize {
        self.input_buffer.len() / 2
    }

    /// Drop all buffered audio and frames.
    pub fn reset(&mut self) {
        self.input_buffer.fill(0.0);
        self.write_pos = 0;
        self.samples_since_fft = 0;
        self.total_samples = 0;
        self.latest = SpectrumFrame::default();
        while self.frame_receiver.try_recv().is_ok() {}
        debug!("spectrum analyzer reset");
    }
}
