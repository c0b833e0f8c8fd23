//! Peak normalization
//!
//! Uniform per-channel scaling so the loudest sample lands on the target
//! peak, or only lands there when it would exceed it (limiting). Silence
//! passes through untouched.

use super::buffer::SampleBuffer;
use crate::error::Result;

/// Default peak level after normalization (fraction of full scale)
pub const DEFAULT_TARGET_PEAK: f64 = 0.95;

/// Scale `samples` so `max(|s|) == target_peak`
///
/// Returns the input unchanged when it is empty or all zeros, so no
/// division by zero and no NaN.
pub fn normalize_peak(samples: &[f64], target_peak: f64) -> Vec<f64> {
    let max_abs = samples.iter().fold(0.0_f64, |acc, &s| acc.max(s.abs()));
    if max_abs > 0.0 && max_abs.is_finite() {
        let scale = target_peak / max_abs;
        samples.iter().map(|&s| (s * scale).clamp(-target_peak, target_peak)).collect()
    } else {
        samples.to_vec()
    }
}

/// Scale `samples` down to `target_peak` only when they exceed it
///
/// Quieter input is returned as-is, so level is preserved for clips that
/// already fit.
pub fn limit_peak(samples: &[f64], target_peak: f64) -> Vec<f64> {
    let max_abs = samples.iter().fold(0.0_f64, |acc, &s| acc.max(s.abs()));
    if max_abs > target_peak {
        normalize_peak(samples, target_peak)
    } else {
        samples.to_vec()
    }
}

/// Peak-limit every channel of `buffer` independently
pub fn limit_buffer(
    buffer: &SampleBuffer,
    target_peak: f64,
    parallel: bool,
) -> Result<SampleBuffer> {
    buffer.try_map_channels(parallel, |c| Ok(limit_peak(c, target_peak)))
}
