//! Phase-vocoder time stretching
//!
//! Changes duration without changing pitch. Analysis frames are read at a
//! fractional rate, magnitudes are interpolated between neighbouring frames,
//! and phases are re-accumulated so every bin keeps advancing at its own
//! instantaneous frequency.

use super::stft::{OverlapAdd, Stft};
use crate::audio::buffer::SampleBuffer;
use crate::audio::processor::Quality;
use crate::config::StretchConfig;
use crate::error::{AudioError, Result};
use num_complex::Complex;
use std::f64::consts::PI;
use tracing::debug;

/// Time-stretcher with fixed framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeStretcher {
    fft_size: usize,
    hop: usize,
}

impl TimeStretcher {
    /// Create a stretcher with explicit framing
    ///
    /// # Arguments
    /// * `fft_size` - Analysis frame length (even)
    /// * `hop` - Frame advance in samples
    pub fn new(fft_size: usize, hop: usize) -> Result<Self> {
        // Validates the framing up front
        Stft::new(fft_size, hop)?;
        Ok(Self { fft_size, hop })
    }

    /// Stretcher framed for a quality tier
    pub fn for_quality(config: &StretchConfig, quality: Quality) -> Result<Self> {
        Self::new(config.fft_size, config.hop_for(quality))
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Stretch one channel
    ///
    /// # Arguments
    /// * `samples` - Channel samples (non-empty)
    /// * `tempo_factor` - > 1 shortens, < 1 lengthens
    ///
    /// # Returns
    /// `round(len / tempo_factor)` samples at the same pitch
    pub fn stretch(&self, samples: &[f64], tempo_factor: f64) -> Result<Vec<f64>> {
        validate_tempo(tempo_factor)?;
        if samples.is_empty() {
            return Err(AudioError::Transform("cannot time-stretch an empty buffer".into()));
        }

        let mut stft = Stft::new(self.fft_size, self.hop)?;
        let padded = stft.pad_centered(samples);
        let n_frames = stft.frame_count(samples.len());
        let n_bins = stft.num_bins();

        // Expected phase advance per hop for each bin centre
        let phi_advance: Vec<f64> = (0..n_bins)
            .map(|k| 2.0 * PI * self.hop as f64 * k as f64 / self.fft_size as f64)
            .collect();

        let mut left = stft.analyze_frame(&padded, 0)?;
        let mut right = stft.analyze_frame(&padded, 1)?;
        let mut loaded = 0usize;

        let mut phase_acc: Vec<f64> = left.iter().map(|c| c.arg()).collect();
        let mut ola = OverlapAdd::new(self.fft_size, self.hop);
        let mut out_frame = vec![Complex::new(0.0, 0.0); n_bins];

        let mut step_index = 0usize;
        loop {
            let step = step_index as f64 * tempo_factor;
            if step >= n_frames as f64 {
                break;
            }
            let frame_index = step.floor() as usize;
            let alpha = step - step.floor();

            if frame_index != loaded {
                if frame_index == loaded + 1 {
                    std::mem::swap(&mut left, &mut right);
                } else {
                    left = stft.analyze_frame(&padded, frame_index)?;
                }
                right = stft.analyze_frame(&padded, frame_index + 1)?;
                loaded = frame_index;
            }

            for k in 0..n_bins {
                let magnitude = (1.0 - alpha) * left[k].norm() + alpha * right[k].norm();
                out_frame[k] = Complex::from_polar(magnitude, phase_acc[k]);

                let mut dphase = right[k].arg() - left[k].arg() - phi_advance[k];
                dphase -= 2.0 * PI * (dphase / (2.0 * PI)).round();
                phase_acc[k] += phi_advance[k] + dphase;
            }

            let frame = stft.synthesize_frame(&out_frame)?;
            ola.add_frame(&frame);
            step_index += 1;
        }

        let length = (samples.len() as f64 / tempo_factor).round() as usize;
        debug!(
            input_len = samples.len(),
            output_len = length,
            analysis_frames = n_frames,
            synthesis_frames = ola.frame_count(),
            "phase vocoder"
        );

        Ok(ola.finish(stft.window(), Some(length)))
    }

    /// Stretch every channel of a buffer with identical parameters
    ///
    /// Channels are independent; with `parallel` they run on the rayon pool.
    pub fn stretch_buffer(
        &self,
        buffer: &SampleBuffer,
        tempo_factor: f64,
        parallel: bool,
    ) -> Result<SampleBuffer> {
        validate_tempo(tempo_factor)?;
        if buffer.is_empty() {
            return Err(AudioError::Transform("cannot time-stretch an empty buffer".into()));
        }
        buffer.try_map_channels(parallel, |channel| self.stretch(channel, tempo_factor))
    }
}

fn validate_tempo(tempo_factor: f64) -> Result<()> {
    if !tempo_factor.is_finite() || tempo_factor <= 0.0 {
        return Err(AudioError::Transform(format!(
            "tempo factor must be positive and finite (got {})",
            tempo_factor
        )));
    }
    Ok(())
}
