//! Spectrum analyzer and band-energy measurement
//!
//! Averages windowed power spectra over half-overlapping frames (Welch's
//! method) to measure how much of a signal's power sits in a frequency band.

use super::fft::FftEngine;
use super::windowing::multiply;
use crate::error::{AudioError, Result};
use crate::filters::windows::{generate_periodic_window, WindowType};

/// Spectrum analyzer configuration
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// FFT size (number of samples, should be power of 2)
    pub fft_size: usize,

    /// Window type for spectral analysis
    pub window_type: WindowType,

    /// Sample rate in Hz
    pub sample_rate: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 4096,
            window_type: WindowType::Hann,
            sample_rate: 44100.0,
        }
    }
}

/// Averaged power spectrum analyzer
pub struct SpectrumAnalyzer {
    config: AnalyzerConfig,
    fft_engine: FftEngine,
    window: Vec<f64>,
    window_power: f64,
}

impl SpectrumAnalyzer {
    /// Create new spectrum analyzer
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        if config.fft_size < 2 || config.fft_size % 2 != 0 {
            return Err(AudioError::Transform(format!(
                "analyzer FFT size must be even and >= 2 (got {})",
                config.fft_size
            )));
        }
        if !(config.sample_rate > 0.0) {
            return Err(AudioError::Transform(format!(
                "sample rate must be positive (got {})",
                config.sample_rate
            )));
        }

        let window = generate_periodic_window(config.window_type, config.fft_size);
        let window_power = window.iter().map(|w| w * w).sum();
        let fft_engine = FftEngine::new(config.fft_size);

        Ok(Self {
            config,
            fft_engine,
            window,
            window_power,
        })
    }

    /// One-sided power spectral density averaged over frames
    ///
    /// Scaled so the sum over all bins equals the mean-square value of the
    /// signal. Signals shorter than one frame are zero-padded.
    pub fn power_spectrum(&mut self, signal: &[f64]) -> Result<Vec<f64>> {
        let n = self.config.fft_size;
        let hop = n / 2;
        let bins = self.num_bins();
        let mut accum = vec![0.0; bins];

        if signal.is_empty() {
            return Ok(accum);
        }

        // Full frames only; a signal shorter than one frame gets a single padded frame
        let starts: Vec<usize> = if signal.len() <= n {
            vec![0]
        } else {
            (0..=(signal.len() - n) / hop).map(|i| i * hop).collect()
        };

        for &start in &starts {
            let end = (start + n).min(signal.len());
            let windowed = multiply(&signal[start..end], &self.window);
            let power = self.fft_engine.compute_power(&windowed)?;
            for (a, p) in accum.iter_mut().zip(power) {
                *a += p;
            }
        }
        let frames = starts.len();

        let scale = 1.0 / (frames as f64 * n as f64 * self.window_power);
        for (k, a) in accum.iter_mut().enumerate() {
            // Every bin except DC and Nyquist stands for two conjugate bins
            let sides = if k == 0 || k == bins - 1 { 1.0 } else { 2.0 };
            *a *= sides * scale;
        }
        Ok(accum)
    }

    /// Mean-square power between `lo_hz` and `hi_hz` inclusive
    pub fn band_energy(&mut self, signal: &[f64], lo_hz: f64, hi_hz: f64) -> Result<f64> {
        if !(lo_hz >= 0.0 && hi_hz > lo_hz) {
            return Err(AudioError::Transform(format!(
                "invalid band [{}, {}] Hz",
                lo_hz, hi_hz
            )));
        }
        let spectrum = self.power_spectrum(signal)?;
        let freqs = self.frequency_bins_hz();
        Ok(spectrum
            .iter()
            .zip(freqs)
            .filter(|(_, f)| *f >= lo_hz && *f <= hi_hz)
            .map(|(p, _)| p)
            .sum())
    }

    /// Get frequency bins in Hz
    pub fn frequency_bins_hz(&self) -> Vec<f64> {
        (0..self.num_bins())
            .map(|bin| self.fft_engine.bin_to_hz(bin, self.config.sample_rate))
            .collect()
    }

    /// Get current configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Get number of frequency bins
    pub fn num_bins(&self) -> usize {
        self.fft_engine.num_bins()
    }
}

/// Mean-square power of `samples` between `lo_hz` and `hi_hz`
///
/// # Arguments
/// * `samples` - One channel
/// * `sample_rate` - Sample rate in Hz
/// * `lo_hz`, `hi_hz` - Band edges in Hz
pub fn band_energy(samples: &[f64], sample_rate: u32, lo_hz: f64, hi_hz: f64) -> Result<f64> {
    let mut analyzer = SpectrumAnalyzer::new(AnalyzerConfig {
        sample_rate: sample_rate as f64,
        ..AnalyzerConfig::default()
    })?;
    analyzer.band_energy(samples, lo_hz, hi_hz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, amplitude: f64, sample_rate: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|n| amplitude * (2.0 * PI * freq * n as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_total_power_matches_mean_square() {
        let signal = sine(1000.0, 0.5, 44100.0, 44100);
        let mut analyzer = SpectrumAnalyzer::new(AnalyzerConfig::default()).unwrap();

        let total: f64 = analyzer.power_spectrum(&signal).unwrap().iter().sum();
        assert!((total - 0.125).abs() < 0.125 * 0.05);
    }

    #[test]
    fn test_band_energy_isolates_tone() {
        let sr = 44100.0;
        let low = sine(100.0, 0.5, sr, 88200);
        let high = sine(3000.0, 0.5, sr, 88200);
        let mixed: Vec<f64> = low.iter().zip(&high).map(|(a, b)| a + b).collect();

        let low_band = band_energy(&mixed, 44100, 0.0, 250.0).unwrap();
        let high_band = band_energy(&mixed, 44100, 2000.0, 4000.0).unwrap();

        assert!((low_band - 0.125).abs() < 0.125 * 0.05);
        assert!((high_band - 0.125).abs() < 0.125 * 0.05);
        assert!(band_energy(&low, 44100, 1000.0, 2000.0).unwrap() < 1e-6);
    }

    #[test]
    fn test_silence_and_invalid_band() {
        assert_eq!(band_energy(&[0.0; 1000], 8000, 0.0, 250.0).unwrap(), 0.0);
        assert_eq!(band_energy(&[], 8000, 0.0, 250.0).unwrap(), 0.0);
        assert!(band_energy(&[0.1; 10], 8000, 300.0, 200.0).is_err());
        assert!(band_energy(&[0.1; 10], 0, 0.0, 200.0).is_err());
    }

    #[test]
    fn test_frequency_axis() {
        let analyzer = SpectrumAnalyzer::new(AnalyzerConfig {
            fft_size: 1024,
            window_type: WindowType::Hann,
            sample_rate: 48000.0,
        })
        .unwrap();
        let freqs = analyzer.frequency_bins_hz();

        assert_eq!(freqs.len(), 513);
        assert_eq!(freqs[0], 0.0);
        assert!((freqs[512] - 24000.0).abs() < 1e-9);
    }
}
