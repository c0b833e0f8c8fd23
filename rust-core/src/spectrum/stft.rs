//! Short-time Fourier analysis and overlap-add resynthesis
//!
//! Frames are centred: the signal is zero-padded by fft_size/2 on both sides
//! so frame `t` is centred on sample `t * hop`. Analysis uses a periodic Hann
//! window; resynthesis windows again and divides by the summed squared
//! window, which gives perfect reconstruction for any hop <= fft_size.

use super::fft::FftEngine;
use super::windowing::{multiply, window_sum_square};
use crate::error::{AudioError, Result};
use crate::filters::windows::{generate_periodic_window, WindowType};
use num_complex::Complex;

/// Framed forward/inverse transform with a fixed size and hop
pub struct Stft {
    fft_size: usize,
    hop: usize,
    window: Vec<f64>,
    engine: FftEngine,
}

impl Stft {
    /// Create a new STFT
    ///
    /// # Arguments
    /// * `fft_size` - Frame length in samples (even, >= 2)
    /// * `hop` - Frame advance in samples (1..=fft_size)
    pub fn new(fft_size: usize, hop: usize) -> Result<Self> {
        if fft_size < 2 || fft_size % 2 != 0 {
            return Err(AudioError::Transform(format!(
                "STFT frame length must be even and >= 2 (got {})",
                fft_size
            )));
        }
        if hop == 0 || hop > fft_size {
            return Err(AudioError::Transform(format!(
                "STFT hop must be in 1..={} (got {})",
                fft_size, hop
            )));
        }

        Ok(Self {
            fft_size,
            hop,
            window: generate_periodic_window(WindowType::Hann, fft_size),
            engine: FftEngine::new(fft_size),
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    pub fn window(&self) -> &[f64] {
        &self.window
    }

    /// Number of centred frames covering `signal_len` samples
    pub fn frame_count(&self, signal_len: usize) -> usize {
        1 + signal_len / self.hop
    }

    /// Zero-pad by fft_size/2 on each side
    pub fn pad_centered(&self, signal: &[f64]) -> Vec<f64> {
        let half = self.fft_size / 2;
        let mut padded = vec![0.0; signal.len() + 2 * half];
        padded[half..half + signal.len()].copy_from_slice(signal);
        padded
    }

    /// Spectrum of frame `index` of an already padded signal
    ///
    /// Frames past the end of the signal are all-zero.
    pub fn analyze_frame(&mut self, padded: &[f64], index: usize) -> Result<Vec<Complex<f64>>> {
        let start = index * self.hop;
        if start + self.fft_size > padded.len() {
            return Ok(vec![Complex::new(0.0, 0.0); self.num_bins()]);
        }
        let frame = multiply(&padded[start..start + self.fft_size], &self.window);
        self.engine.forward(&frame)
    }

    /// Full analysis: one spectrum per centred frame
    pub fn analyze(&mut self, signal: &[f64]) -> Result<Vec<Vec<Complex<f64>>>> {
        let padded = self.pad_centered(signal);
        (0..self.frame_count(signal.len()))
            .map(|t| self.analyze_frame(&padded, t))
            .collect()
    }

    /// Inverse transform of one spectrum, windowed for overlap-add
    pub fn synthesize_frame(&mut self, spectrum: &[Complex<f64>]) -> Result<Vec<f64>> {
        let time = self.engine.inverse(spectrum)?;
        Ok(multiply(&time, &self.window))
    }

    /// Full resynthesis from a frame sequence
    ///
    /// # Arguments
    /// * `frames` - Spectra at `hop` spacing
    /// * `length` - Exact output length (zero-padded or truncated), or the
    ///   natural length when `None`
    pub fn synthesize(
        &mut self,
        frames: &[Vec<Complex<f64>>],
        length: Option<usize>,
    ) -> Result<Vec<f64>> {
        let mut ola = OverlapAdd::new(self.fft_size, self.hop);
        for spectrum in frames {
            let frame = self.synthesize_frame(spectrum)?;
            ola.add_frame(&frame);
        }
        Ok(ola.finish(&self.window, length))
    }
}

/// Overlap-add accumulator for windowed time frames
pub struct OverlapAdd {
    fft_size: usize,
    hop: usize,
    signal: Vec<f64>,
    n_frames: usize,
}

impl OverlapAdd {
    pub fn new(fft_size: usize, hop: usize) -> Self {
        Self {
            fft_size,
            hop,
            signal: Vec::new(),
            n_frames: 0,
        }
    }

    /// Add the next frame at `n_frames * hop`
    pub fn add_frame(&mut self, frame: &[f64]) {
        let start = self.n_frames * self.hop;
        let end = start + self.fft_size;
        if self.signal.len() < end {
            self.signal.resize(end, 0.0);
        }
        for (out, &s) in self.signal[start..end].iter_mut().zip(frame) {
            *out += s;
        }
        self.n_frames += 1;
    }

    pub fn frame_count(&self) -> usize {
        self.n_frames
    }

    /// Normalize by the squared-window envelope and strip the centring pad
    pub fn finish(self, window: &[f64], length: Option<usize>) -> Vec<f64> {
        let mut signal = self.signal;
        let envelope = window_sum_square(window, self.hop, self.n_frames);
        for (s, &e) in signal.iter_mut().zip(&envelope) {
            if e > f64::MIN_POSITIVE {
                *s /= e;
            }
        }

        let half = self.fft_size / 2;
        match length {
            Some(len) => {
                let mut out: Vec<f64> = signal.into_iter().skip(half).take(len).collect();
                out.resize(len, 0.0);
                out
            }
            None => {
                let end = signal.len().saturating_sub(half);
                if end <= half {
                    Vec::new()
                } else {
                    signal[half..end].to_vec()
                }
            }
        }
    }
}
