//! FFT engine using realfft for real-valued signals
//!
//! Forward and inverse transforms share one plan size and reuse their
//! scratch buffers across frames.

use crate::error::Result;
use num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// FFT engine for real-valued signals
pub struct FftEngine {
    /// FFT size (number of samples)
    fft_size: usize,

    r2c: Arc<dyn RealToComplex<f64>>,
    c2r: Arc<dyn ComplexToReal<f64>>,

    /// Reusable time-domain buffer
    time_buffer: Vec<f64>,

    /// Reusable spectrum buffer (fft_size/2 + 1 bins)
    spectrum_buffer: Vec<Complex<f64>>,
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples)
    pub fn new(fft_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(fft_size);
        let c2r = planner.plan_fft_inverse(fft_size);

        Self {
            fft_size,
            r2c,
            c2r,
            time_buffer: vec![0.0; fft_size],
            spectrum_buffer: vec![Complex::new(0.0, 0.0); fft_size / 2 + 1],
        }
    }

    /// Forward transform of one frame
    ///
    /// # Arguments
    /// * `frame` - Input samples (zero-padded or truncated to fft_size)
    ///
    /// # Returns
    /// Complex spectrum X[k] for k = 0..fft_size/2
    pub fn forward(&mut self, frame: &[f64]) -> Result<Vec<Complex<f64>>> {
        let copy_len = frame.len().min(self.fft_size);
        self.time_buffer[..copy_len].copy_from_slice(&frame[..copy_len]);
        self.time_buffer[copy_len..].fill(0.0);

        self.r2c
            .process(&mut self.time_buffer, &mut self.spectrum_buffer)?;

        Ok(self.spectrum_buffer.clone())
    }

    /// Inverse transform of one half-spectrum
    ///
    /// Scaled by 1/fft_size so `inverse(forward(x)) == x`. The imaginary
    /// parts of the DC and Nyquist bins are discarded since a real signal
    /// cannot carry them.
    ///
    /// # Arguments
    /// * `spectrum` - fft_size/2 + 1 complex bins
    pub fn inverse(&mut self, spectrum: &[Complex<f64>]) -> Result<Vec<f64>> {
        let bins = self.num_bins();
        let copy_len = spectrum.len().min(bins);
        self.spectrum_buffer[..copy_len].copy_from_slice(&spectrum[..copy_len]);
        self.spectrum_buffer[copy_len..].fill(Complex::new(0.0, 0.0));

        self.spectrum_buffer[0].im = 0.0;
        if self.fft_size % 2 == 0 {
            self.spectrum_buffer[bins - 1].im = 0.0;
        }

        self.c2r
            .process(&mut self.spectrum_buffer, &mut self.time_buffer)?;

        let scale = 1.0 / self.fft_size as f64;
        Ok(self.time_buffer.iter().map(|&s| s * scale).collect())
    }

    /// Compute FFT and return magnitude spectrum
    ///
    /// # Returns
    /// Magnitude spectrum |X[k]| for k = 0..fft_size/2 (positive frequencies only)
    pub fn compute_magnitude(&mut self, signal: &[f64]) -> Result<Vec<f64>> {
        Ok(self.forward(signal)?.iter().map(|c| c.norm()).collect())
    }

    /// Compute power spectrum (magnitude squared)
    pub fn compute_power(&mut self, signal: &[f64]) -> Result<Vec<f64>> {
        Ok(self.forward(signal)?.iter().map(|c| c.norm_sqr()).collect())
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Get number of frequency bins (fft_size/2 + 1 for real FFT)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Centre frequency of `bin` in Hz
    pub fn bin_to_hz(&self, bin: usize, sample_rate: f64) -> f64 {
        bin as f64 * sample_rate / self.fft_size as f64
    }
}
