//! Biquad IIR filtering with state management
//!
//! Transposed direct form II. Offers causal filtering over a block and a
//! zero-phase forward-backward pass.

use super::design::BiquadCoefficients;

/// Stateful second-order section (transposed direct form II)
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    coeffs: BiquadCoefficients,

    /// Delay line z[0], z[1]
    state: [f64; 2],
}

impl BiquadFilter {
    /// Create filter with zeroed state
    pub fn new(coeffs: BiquadCoefficients) -> Self {
        Self {
            coeffs,
            state: [0.0; 2],
        }
    }

    /// Process single sample
    ///
    /// # Arguments
    /// * `input` - Input sample x[n]
    ///
    /// # Returns
    /// Filtered output sample y[n]
    #[inline]
    pub fn process_sample(&mut self, input: f64) -> f64 {
        let BiquadCoefficients { b, a } = self.coeffs;
        let output = b[0] * input + self.state[0];
        self.state[0] = b[1] * input - a[1] * output + self.state[1];
        self.state[1] = b[2] * input - a[2] * output;
        output
    }

    /// Process a block of samples
    pub fn process_block(&mut self, input: &[f64]) -> Vec<f64> {
        input.iter().map(|&x| self.process_sample(x)).collect()
    }

    /// Process a block in-place
    pub fn process_block_inplace(&mut self, buffer: &mut [f64]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Load the delay line directly
    pub fn set_state(&mut self, state: [f64; 2]) {
        self.state = state;
    }

    /// Reset filter state (clear delay line)
    pub fn reset(&mut self) {
        self.state = [0.0; 2];
    }

    pub fn coefficients(&self) -> &BiquadCoefficients {
        &self.coeffs
    }

    /// Delay-line contents for a unit step in steady state
    ///
    /// Scaling this by the first input sample starts the filter as if the
    /// signal had always been at that level, which removes the turn-on
    /// transient.
    pub fn steady_state(coeffs: &BiquadCoefficients) -> [f64; 2] {
        let gain = coeffs.dc_gain();
        [gain - coeffs.b[0], coeffs.b[2] - coeffs.a[2] * gain]
    }
}

/// Causal filtering from rest
pub fn lfilter(coeffs: &BiquadCoefficients, input: &[f64]) -> Vec<f64> {
    BiquadFilter::new(*coeffs).process_block(input)
}

/// Zero-phase filtering: forward pass, then backward pass
///
/// The signal is extended at both ends by odd reflection (up to 9 samples,
/// fewer for very short input) and each pass starts from steady state so the
/// edges do not ring. The magnitude response is squared and the phase is
/// zero.
pub fn filtfilt(coeffs: &BiquadCoefficients, input: &[f64]) -> Vec<f64> {
    let n = input.len();
    if n == 0 {
        return Vec::new();
    }

    // 3 * max(len(a), len(b))
    let pad = 9.min(n - 1);
    let extended = odd_extend(input, pad);
    let zi = BiquadFilter::steady_state(coeffs);

    let mut filter = BiquadFilter::new(*coeffs);
    filter.set_state([zi[0] * extended[0], zi[1] * extended[0]]);
    let mut forward = filter.process_block(&extended);

    forward.reverse();
    let start = forward[0];
    filter.set_state([zi[0] * start, zi[1] * start]);
    filter.process_block_inplace(&mut forward);
    forward.reverse();

    forward[pad..pad + n].to_vec()
}

/// Point-symmetric extension about each endpoint
fn odd_extend(x: &[f64], pad: usize) -> Vec<f64> {
    let n = x.len();
    let first = x[0];
    let last = x[n - 1];

    let mut out = Vec::with_capacity(n + 2 * pad);
    out.extend((1..=pad).rev().map(|i| 2.0 * first - x[i]));
    out.extend_from_slice(x);
    out.extend((1..=pad).map(|i| 2.0 * last - x[n - 1 - i]));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::design::{butterworth_lowpass, resonant_peak};
    use std::f64::consts::PI;

    fn sine(freq: f64, sample_rate: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|n| (2.0 * PI * freq * n as f64 / sample_rate).sin())
            .collect()
    }

    fn rms(x: &[f64]) -> f64 {
        (x.iter().map(|s| s * s).sum::<f64>() / x.len() as f64).sqrt()
    }

    #[test]
    fn test_impulse_response_starts_with_b0() {
        let lp = butterworth_lowpass(1000.0, 8000.0).unwrap();
        let mut impulse = vec![0.0; 16];
        impulse[0] = 1.0;

        let out = lfilter(&lp, &impulse);
        assert!((out[0] - lp.b[0]).abs() < 1e-15);
        assert!((out[1] - (lp.b[1] - lp.a[1] * lp.b[0])).abs() < 1e-15);
    }

    #[test]
    fn test_lowpass_passes_dc_step() {
        let lp = butterworth_lowpass(250.0, 44100.0).unwrap();
        let out = lfilter(&lp, &vec![1.0; 20000]);
        assert!((out[19999] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_filtfilt_constant_has_no_edge_transient() {
        let lp = butterworth_lowpass(250.0, 44100.0).unwrap();
        let out = filtfilt(&lp, &vec![0.5; 500]);
        assert!(out.iter().all(|&s| (s - 0.5).abs() < 1e-9));
    }

    #[test]
    fn test_filtfilt_is_zero_phase_at_peak_centre() {
        let sr = 8000.0;
        let peak = resonant_peak(100.0, 0.7, sr).unwrap();
        let x = sine(100.0, sr, 8000);

        let y = filtfilt(&peak, &x);

        // Unity magnitude squared and no phase shift at the centre
        let mid = &y[2000..6000];
        let reference = &x[2000..6000];
        let err = mid
            .iter()
            .zip(reference)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f64, f64::max);
        assert!(err < 1e-3, "max deviation {}", err);
    }

    #[test]
    fn test_filtfilt_attenuates_out_of_band_twice() {
        let sr = 44100.0;
        let lp = butterworth_lowpass(250.0, sr).unwrap();
        let x = sine(2000.0, sr, 44100);

        let single = lfilter(&lp, &x);
        let double = filtfilt(&lp, &x);

        assert!(rms(&double[4410..39690]) < rms(&single[4410..39690]) * 0.1);
    }

    #[test]
    fn test_filtfilt_short_inputs() {
        let lp = butterworth_lowpass(250.0, 44100.0).unwrap();
        assert!(filtfilt(&lp, &[]).is_empty());
        let one = filtfilt(&lp, &[0.3]);
        assert_eq!(one.len(), 1);
        assert!((one[0] - 0.3).abs() < 1e-12);
        assert_eq!(filtfilt(&lp, &[0.1, 0.2, 0.3]).len(), 3);
    }

    #[test]
    fn test_odd_extension() {
        let ext = odd_extend(&[1.0, 2.0, 4.0], 2);
        assert_eq!(ext, vec![-2.0, 0.0, 1.0, 2.0, 4.0, 6.0, 7.0]);
    }
}
