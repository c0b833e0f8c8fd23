//! Bass enhancement
//!
//! Two strategies share the same gain mapping, g = 10^(dB/20), and the same
//! blend `x + (filtered - x) * (g - 1) * mix`, so 0 dB always reproduces the
//! input. Each channel is filtered on its own and normalized afterwards.
//!
//! - Shelving: one causal pass of a 2nd-order Butterworth low-pass.
//! - Multi-band peaking: resonant bands applied in turn, each zero-phase and
//!   each contributing a damped share of the gain.

use super::design::{butterworth_lowpass, resonant_peak, BiquadCoefficients};
use super::iir::{filtfilt, lfilter};
use crate::audio::buffer::SampleBuffer;
use crate::audio::normalize::normalize_peak;
use crate::config::BassConfig;
use crate::error::{AudioError, Result};
use tracing::{debug, warn};

/// Bass enhancement strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BassStrategy {
    /// Low-pass shelf, single causal pass
    Shelving,
    /// Resonant peaks at each configured band, zero-phase
    MultiBandPeaking,
}

/// Filters designed for one sample rate, ready to run
#[derive(Debug, Clone, PartialEq)]
pub enum BassPlan {
    Shelving {
        lowpass: BiquadCoefficients,
    },
    MultiBandPeaking {
        bands: Vec<BiquadCoefficients>,
    },
}

impl BassPlan {
    pub fn strategy(&self) -> BassStrategy {
        match self {
            BassPlan::Shelving { .. } => BassStrategy::Shelving,
            BassPlan::MultiBandPeaking { .. } => BassStrategy::MultiBandPeaking,
        }
    }
}

/// Convert a boost in decibels to a linear amplitude factor
pub fn db_to_gain(boost_db: f64) -> f64 {
    10f64.powf(boost_db / 20.0)
}

/// Bass enhancer bound to a tuning
#[derive(Debug, Clone, Default)]
pub struct BassEnhancer {
    config: BassConfig,
}

impl BassEnhancer {
    pub fn new(config: BassConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BassConfig {
        &self.config
    }

    /// Whether every peaking band can be designed at `sample_rate`
    pub fn peaking_supported(&self, sample_rate: u32) -> bool {
        let nyquist = sample_rate as f64 / 2.0;
        !self.config.peak_frequencies_hz.is_empty()
            && self
                .config
                .peak_frequencies_hz
                .iter()
                .all(|&f| f > 0.0 && f < nyquist)
    }

    /// Strategy that will actually run for a request
    ///
    /// Multi-band peaking degrades to shelving when any band sits at or above
    /// Nyquist.
    pub fn select_strategy(&self, requested: BassStrategy, sample_rate: u32) -> BassStrategy {
        match requested {
            BassStrategy::MultiBandPeaking if !self.peaking_supported(sample_rate) => {
                warn!(
                    sample_rate,
                    bands = ?self.config.peak_frequencies_hz,
                    "peaking bands exceed Nyquist, falling back to shelving"
                );
                BassStrategy::Shelving
            }
            other => other,
        }
    }

    /// Design filters for `strategy` at `sample_rate`
    ///
    /// # Returns
    /// A plan whose strategy may differ from the request (see
    /// [`select_strategy`](Self::select_strategy)), or `Transform` when even
    /// the shelf cannot be designed
    pub fn design(&self, requested: BassStrategy, sample_rate: u32) -> Result<BassPlan> {
        if sample_rate == 0 {
            return Err(AudioError::Transform("sample rate must be positive".into()));
        }
        let fs = sample_rate as f64;

        match self.select_strategy(requested, sample_rate) {
            BassStrategy::Shelving => Ok(BassPlan::Shelving {
                lowpass: butterworth_lowpass(self.config.shelf_cutoff_hz, fs)?,
            }),
            BassStrategy::MultiBandPeaking => {
                let bands = self
                    .config
                    .peak_frequencies_hz
                    .iter()
                    .map(|&f| resonant_peak(f, self.config.peak_q, fs))
                    .collect::<Result<Vec<_>>>()?;
                Ok(BassPlan::MultiBandPeaking { bands })
            }
        }
    }

    /// Enhance one channel with a designed plan
    pub fn apply_channel(&self, plan: &BassPlan, samples: &[f64], boost_db: f64) -> Vec<f64> {
        let delta = db_to_gain(boost_db) - 1.0;

        let boosted = match plan {
            BassPlan::Shelving { lowpass } => {
                let low = lfilter(lowpass, samples);
                samples
                    .iter()
                    .zip(&low)
                    .map(|(&x, &l)| x + (l - x) * delta)
                    .collect::<Vec<f64>>()
            }
            BassPlan::MultiBandPeaking { bands } => {
                let share = delta * self.config.peak_mix;
                let mut acc = samples.to_vec();
                for band in bands {
                    let filtered = filtfilt(band, &acc);
                    for (a, f) in acc.iter_mut().zip(filtered) {
                        *a += (f - *a) * share;
                    }
                }
                acc
            }
        };

        normalize_peak(&boosted, self.config.target_peak)
    }

    /// Enhance every channel of `buffer`
    ///
    /// # Arguments
    /// * `buffer` - Input audio (left untouched)
    /// * `boost_db` - Boost in dB, >= 0
    /// * `requested` - Preferred strategy
    /// * `parallel` - Run channels on the rayon pool
    pub fn enhance(
        &self,
        buffer: &SampleBuffer,
        boost_db: f64,
        requested: BassStrategy,
        parallel: bool,
    ) -> Result<SampleBuffer> {
        if !boost_db.is_finite() || boost_db < 0.0 {
            return Err(AudioError::Transform(format!(
                "bass boost must be a non-negative number of dB (got {})",
                boost_db
            )));
        }

        let plan = self.design(requested, buffer.sample_rate())?;
        debug!(
            strategy = ?plan.strategy(),
            boost_db,
            channels = buffer.channel_count(),
            "bass enhancement"
        );

        buffer.try_map_channels(parallel, |channel| {
            Ok(self.apply_channel(&plan, channel, boost_db))
        })
    }
}
