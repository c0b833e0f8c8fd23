//! Windowing helpers for framed spectral processing
//!
//! Applies precomputed analysis windows and computes the overlap-add
//! envelope needed to undo them after resynthesis.

/// Element-wise product of a frame and precomputed window coefficients
pub fn multiply(frame: &[f64], window: &[f64]) -> Vec<f64> {
    frame.iter().zip(window.iter()).map(|(&s, &w)| s * w).collect()
}

/// Sum of squared windows overlap-added at `hop` spacing
///
/// # Arguments
/// * `window` - Window coefficients (frame length)
/// * `hop` - Frame advance in samples
/// * `n_frames` - Number of frames
///
/// # Returns
/// Envelope of length `window.len() + hop * (n_frames - 1)`
pub fn window_sum_square(window: &[f64], hop: usize, n_frames: usize) -> Vec<f64> {
    if n_frames == 0 {
        return Vec::new();
    }
    let len = window.len() + hop * (n_frames - 1);
    let squared: Vec<f64> = window.iter().map(|w| w * w).collect();

    let mut envelope = vec![0.0; len];
    for frame in 0..n_frames {
        let start = frame * hop;
        for (e, &w2) in envelope[start..start + window.len()].iter_mut().zip(&squared) {
            *e += w2;
        }
    }
    envelope
}
