//! Pipeline configuration
//!
//! Every field has a default, so a JSON document only needs to name what it
//! overrides.

use crate::audio::processor::Quality;
use crate::error::{AudioError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Short-time Fourier framing for the time-stretcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StretchConfig {
    /// Analysis frame length in samples (power of two)
    pub fft_size: usize,

    /// Hop length for `Quality::Standard`
    pub standard_hop: usize,

    /// Hop length for `Quality::High` (must be smaller than `standard_hop`)
    pub high_hop: usize,
}

impl Default for StretchConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            standard_hop: 512,
            high_hop: 256,
        }
    }
}

impl StretchConfig {
    /// Hop length used for a quality tier
    pub fn hop_for(&self, quality: Quality) -> usize {
        match quality {
            Quality::Standard => self.standard_hop,
            Quality::High => self.high_hop,
        }
    }
}

/// Bass enhancer tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BassConfig {
    /// Cutoff of the 2nd-order low-pass used by the shelving strategy
    pub shelf_cutoff_hz: f64,

    /// Centre frequencies of the peaking bands, applied in order
    pub peak_frequencies_hz: Vec<f64>,

    /// Quality factor shared by every peaking band
    pub peak_q: f64,

    /// Fraction of the full gain delta each peaking band contributes
    pub peak_mix: f64,

    /// Peak level (full scale = 1.0) the normalizer scales to
    pub target_peak: f64,
}

impl Default for BassConfig {
    fn default() -> Self {
        Self {
            shelf_cutoff_hz: 250.0,
            peak_frequencies_hz: vec![60.0, 120.0, 180.0],
            peak_q: 0.7,
            peak_mix: 0.3,
            target_peak: 0.95,
        }
    }
}

/// PCM sample format written by the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitDepth {
    Int16,
    Int24,
    Float32,
}

impl BitDepth {
    pub fn bits(&self) -> u16 {
        match self {
            BitDepth::Int16 => 16,
            BitDepth::Int24 => 24,
            BitDepth::Float32 => 32,
        }
    }
}

/// Encoder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub bit_depth: BitDepth,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            bit_depth: BitDepth::Int16,
        }
    }
}

/// Accepted ranges for user-facing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterLimits {
    pub tempo_min: f64,
    pub tempo_max: f64,
    pub bass_min_db: f64,
    pub bass_max_db: f64,
}

impl Default for ParameterLimits {
    fn default() -> Self {
        Self {
            tempo_min: 0.1,
            tempo_max: 3.0,
            bass_min_db: 0.0,
            bass_max_db: 20.0,
        }
    }
}

/// Top-level pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub stretch: StretchConfig,
    pub bass: BassConfig,
    pub encoder: EncoderConfig,
    pub limits: ParameterLimits,

    /// Process channels of a stage concurrently
    pub parallel_channels: bool,

    /// Route `Quality::High` to the multi-band peaking bass strategy
    pub high_quality_bass: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stretch: StretchConfig::default(),
            bass: BassConfig::default(),
            encoder: EncoderConfig::default(),
            limits: ParameterLimits::default(),
            parallel_channels: true,
            high_quality_bass: true,
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        let s = &self.stretch;
        if s.fft_size < 16 || !s.fft_size.is_power_of_two() {
            return Err(AudioError::Config(format!(
                "fft_size must be a power of two >= 16 (got {})",
                s.fft_size
            )));
        }
        if s.high_hop == 0 || s.standard_hop == 0 {
            return Err(AudioError::Config("hop lengths must be positive".into()));
        }
        if s.high_hop >= s.standard_hop {
            return Err(AudioError::Config(format!(
                "high_hop ({}) must be smaller than standard_hop ({})",
                s.high_hop, s.standard_hop
            )));
        }
        if s.standard_hop > s.fft_size {
            return Err(AudioError::Config(format!(
                "standard_hop ({}) must not exceed fft_size ({})",
                s.standard_hop, s.fft_size
            )));
        }

        let b = &self.bass;
        if !(b.shelf_cutoff_hz > 0.0) {
            return Err(AudioError::Config("shelf_cutoff_hz must be positive".into()));
        }
        if b.peak_frequencies_hz.iter().any(|&f| !(f > 0.0)) {
            return Err(AudioError::Config("peak frequencies must be positive".into()));
        }
        if !(b.peak_q > 0.0) {
            return Err(AudioError::Config("peak_q must be positive".into()));
        }
        if !(b.target_peak > 0.0 && b.target_peak <= 1.0) {
            return Err(AudioError::Config(format!(
                "target_peak must be in (0, 1] (got {})",
                b.target_peak
            )));
        }

        let l = &self.limits;
        if !(l.tempo_min > 0.0 && l.tempo_min <= l.tempo_max) {
            return Err(AudioError::Config("tempo limits must satisfy 0 < min <= max".into()));
        }
        if !(l.bass_min_db >= 0.0 && l.bass_min_db <= l.bass_max_db) {
            return Err(AudioError::Config("bass limits must satisfy 0 <= min <= max".into()));
        }

        Ok(())
    }
}
