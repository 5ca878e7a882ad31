//! Spectrum frame access and band energy estimation.
//!
//! The engine never trusts the incoming frame: NaN and negative magnitudes
//! read as zero, and out-of-range bin indices clamp to the last valid bin, so
//! a short or degenerate frame degrades gracefully instead of panicking.

/// Read one magnitude, sanitized. Index clamps into the frame; NaN and
/// negative values read as zero.
pub(crate) fn magnitude(frame: &[f32], bin: usize) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let v = frame[bin.min(frame.len() - 1)];
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

/// Mean and population standard deviation of a sanitized frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    /// Mean magnitude.
    pub mean: f32,
    /// Population standard deviation of the magnitudes.
    pub std_dev: f32,
}

/// Compute [`FrameStats`] over the sanitized frame.
pub fn frame_stats(frame: &[f32]) -> FrameStats {
    if frame.is_empty() {
        return FrameStats::default();
    }
    let n = frame.len() as f32;
    let mut sum = 0.0;
    for i in 0..frame.len() {
        sum += magnitude(frame, i);
    }
    let mean = sum / n;

    let mut var = 0.0;
    for i in 0..frame.len() {
        let d = magnitude(frame, i) - mean;
        var += d * d;
    }
    FrameStats {
        mean,
        std_dev: (var / n).sqrt(),
    }
}

/// Average magnitude over the inclusive bin range covering `[min_hz, max_hz]`.
///
/// `bin = floor(hz / (nyquist / bins))`, both ends clamped to the valid range;
/// a collapsed range degenerates to a single-bin average.
pub fn band_energy(
    frame: &[f32],
    min_hz: f32,
    max_hz: f32,
    sample_rate: u32,
    bins: usize,
) -> f32 {
    if frame.is_empty() || bins == 0 || sample_rate == 0 {
        return 0.0;
    }
    let nyquist = sample_rate as f32 / 2.0;
    let hz_per_bin = nyquist / bins as f32;
    let last = bins.min(frame.len()) - 1;
    let lo = ((min_hz / hz_per_bin) as usize).min(last);
    let hi = ((max_hz / hz_per_bin) as usize).clamp(lo, last);

    let mut sum = 0.0;
    for bin in lo..=hi {
        sum += magnitude(frame, bin);
    }
    sum / (hi - lo + 1) as f32
}

/// Mean of squared time-domain samples. Coarser than the band estimate but
/// needs no spectrum.
pub fn wideband_energy(waveform: &[f32]) -> f32 {
    if waveform.is_empty() {
        return 0.0;
    }
    let sum: f32 = waveform
        .iter()
        .map(|&s| if s.is_finite() { s * s } else { 0.0 })
        .sum();
    sum / waveform.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude_sanitizes() {
        let frame = [0.5, f32::NAN, -1.0, f32::INFINITY];
        assert_eq!(magnitude(&frame, 0), 0.5);
        assert_eq!(magnitude(&frame, 1), 0.0);
        assert_eq!(magnitude(&frame, 2), 0.0);
        assert_eq!(magnitude(&frame, 3), 0.0);
        // Out-of-range index clamps to the last bin
        assert_eq!(magnitude(&frame, 100), 0.0);
        assert_eq!(magnitude(&[0.3], 100), 0.3);
    }

    #[test]
    fn test_frame_stats_uniform() {
        let stats = frame_stats(&[0.5; 64]);
        assert!((stats.mean - 0.5).abs() < 1e-6);
        assert!(stats.std_dev < 1e-6);
    }

    #[test]
    fn test_frame_stats_spread() {
        // Half zeros, half ones: mean 0.5, population std dev 0.5
        let mut frame = vec![0.0; 32];
        frame.extend(vec![1.0; 32]);
        let stats = frame_stats(&frame);
        assert!((stats.mean - 0.5).abs() < 1e-6);
        assert!((stats.std_dev - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_band_energy_selects_bins() {
        // 512 bins over a 22050 Hz nyquist: ~43.07 Hz per bin.
        // Put energy only in bins 2..=3 (~86..~172 Hz).
        let mut frame = vec![0.0; 512];
        frame[2] = 1.0;
        frame[3] = 1.0;

        let low = band_energy(&frame, 90.0, 160.0, 44100, 512);
        assert!(low > 0.9, "expected full band energy, got {}", low);

        let high = band_energy(&frame, 4000.0, 8000.0, 44100, 512);
        assert_eq!(high, 0.0);
    }

    #[test]
    fn test_band_energy_collapsed_range() {
        let mut frame = vec![0.0; 512];
        frame[1] = 0.8;
        // 60..61 Hz collapses to the single bin 1
        let e = band_energy(&frame, 60.0, 61.0, 44100, 512);
        assert!((e - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_band_energy_clamps_beyond_nyquist() {
        let frame = vec![0.1; 512];
        let e = band_energy(&frame, 30000.0, 40000.0, 44100, 512);
        // Both edges clamp to the last bin
        assert!((e - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_band_energy_short_frame() {
        // Frame shorter than the configured bin count must not panic
        let frame = vec![0.2; 16];
        let e = band_energy(&frame, 60.0, 120.0, 44100, 512);
        assert!(e >= 0.0);
    }

    #[test]
    fn test_wideband_energy_mean_square() {
        let e = wideband_energy(&[1.0, -1.0, 1.0, -1.0]);
        assert!((e - 1.0).abs() < 1e-6);
        assert_eq!(wideband_energy(&[]), 0.0);
        assert_eq!(wideband_energy(&[f32::NAN]), 0.0);
    }
}
