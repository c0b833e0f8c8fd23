//! Deinterleaved multi-channel sample buffer
//!
//! Channels are stored independently for the whole pipeline. Interleaving
//! happens only at the encode boundary.

use crate::error::{AudioError, Result};
use rayon::prelude::*;

/// One or more equal-length channels of `f64` samples in roughly [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f64>>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Create buffer from per-channel sample vectors
    ///
    /// # Arguments
    /// * `channels` - One vector per channel, all the same length
    /// * `sample_rate` - Sample rate in Hz (must be positive)
    pub fn new(channels: Vec<Vec<f64>>, sample_rate: u32) -> Result<Self> {
        if channels.is_empty() {
            return Err(AudioError::Transform("buffer has no channels".into()));
        }
        if sample_rate == 0 {
            return Err(AudioError::Transform("sample rate must be positive".into()));
        }
        let frames = channels[0].len();
        if let Some(idx) = channels.iter().position(|c| c.len() != frames) {
            return Err(AudioError::Transform(format!(
                "channel {} has {} samples, expected {}",
                idx,
                channels[idx].len(),
                frames
            )));
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Create single-channel buffer
    pub fn mono(samples: Vec<f64>, sample_rate: u32) -> Result<Self> {
        Self::new(vec![samples], sample_rate)
    }

    /// Split interleaved frames (`L R L R ...`) into channels
    pub fn from_interleaved(data: &[f64], channel_count: usize, sample_rate: u32) -> Result<Self> {
        if channel_count == 0 || data.len() % channel_count != 0 {
            return Err(AudioError::Transform(format!(
                "{} interleaved samples do not divide into {} channels",
                data.len(),
                channel_count
            )));
        }
        let frames = data.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in data.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self::new(channels, sample_rate)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples per channel
    pub fn frames(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> &[f64] {
        &self.channels[index]
    }

    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    pub fn into_channels(self) -> Vec<Vec<f64>> {
        self.channels
    }

    /// Largest absolute sample across all channels
    pub fn peak(&self) -> f64 {
        self.channels
            .iter()
            .flat_map(|c| c.iter())
            .fold(0.0_f64, |acc, &s| acc.max(s.abs()))
    }

    /// Interleave channels into frame order for output
    pub fn interleaved(&self) -> Vec<f64> {
        let frames = self.frames();
        let mut out = Vec::with_capacity(frames * self.channels.len());
        for i in 0..frames {
            for channel in &self.channels {
                out.push(channel[i]);
            }
        }
        out
    }

    /// Build a new buffer by running `f` over every channel
    ///
    /// Each channel is handed to `f` independently with no shared state, so
    /// channels may run concurrently when `parallel` is set. If the results
    /// differ in length they are truncated to the shortest one.
    pub fn try_map_channels<F>(&self, parallel: bool, f: F) -> Result<Self>
    where
        F: Fn(&[f64]) -> Result<Vec<f64>> + Send + Sync,
    {
        let mut processed: Vec<Vec<f64>> = if parallel && self.channels.len() > 1 {
            self.channels
                .par_iter()
                .map(|c| f(c))
                .collect::<Result<Vec<_>>>()?
        } else {
            self.channels
                .iter()
                .map(|c| f(c))
                .collect::<Result<Vec<_>>>()?
        };

        let shortest = processed.iter().map(Vec::len).min().unwrap_or(0);
        for channel in processed.iter_mut() {
            channel.truncate(shortest);
        }

        Self::new(processed, self.sample_rate)
    }
}
