//! Window functions for short-time analysis and band measurements

use std::f64::consts::PI;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowType {
    /// Hann window: w[n] = 0.5 - 0.5*cos(2πn/D)
    /// Overlap-adds to a constant at 75% overlap
    Hann,

    /// Hamming window: w[n] = 0.54 - 0.46*cos(2πn/D)
    Hamming,

    /// Blackman window: w[n] = 0.42 - 0.5*cos(2πn/D) + 0.08*cos(4πn/D)
    Blackman,

    /// Rectangular window (no windowing)
    Rectangular,
}

/// Symmetric windows end on the same value they start on (D = M-1).
/// Periodic windows are one period of a length-M cosine series (D = M) and
/// are the ones to use for STFT framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSymmetry {
    Symmetric,
    Periodic,
}

/// Generate symmetric window coefficients
///
/// # Arguments
/// * `window_type` - Type of window function
/// * `length` - Number of samples (M)
///
/// # Returns
/// Vector of window coefficients w[n] for n = 0..M-1
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f64> {
    build_window(window_type, length, WindowSymmetry::Symmetric)
}

/// Generate periodic window coefficients (DFT-even), as used for STFT frames
pub fn generate_periodic_window(window_type: WindowType, length: usize) -> Vec<f64> {
    build_window(window_type, length, WindowSymmetry::Periodic)
}

/// Generate window coefficients with explicit symmetry
pub fn build_window(window_type: WindowType, length: usize, symmetry: WindowSymmetry) -> Vec<f64> {
    if length == 0 {
        return Vec::new();
    }
    if length == 1 {
        return vec![1.0];
    }

    let denom = match symmetry {
        WindowSymmetry::Symmetric => (length - 1) as f64,
        WindowSymmetry::Periodic => length as f64,
    };

    (0..length)
        .map(|n| {
            let angle = 2.0 * PI * n as f64 / denom;
            match window_type {
                WindowType::Hann => 0.5 - 0.5 * angle.cos(),
                WindowType::Hamming => 0.54 - 0.46 * angle.cos(),
                WindowType::Blackman => 0.42 - 0.5 * angle.cos() + 0.08 * (2.0 * angle).cos(),
                WindowType::Rectangular => 1.0,
            }
        })
        .collect()
}
