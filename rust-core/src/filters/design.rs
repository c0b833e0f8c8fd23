//! Second-order IIR section design
//!
//! Bilinear-transform designs used by the bass enhancer: a Butterworth
//! low-pass for the shelf and a resonant peak for each band.

use crate::error::{AudioError, Result};
use num_complex::Complex;
use std::f64::consts::{PI, SQRT_2};

/// Normalized biquad coefficients (a0 == 1)
///
/// H(z) = (b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    pub b: [f64; 3],
    /// Denominator with a[0] fixed at 1.0
    pub a: [f64; 3],
}

impl BiquadCoefficients {
    /// Build from raw coefficients, dividing through by `a0`
    pub fn new(b: [f64; 3], a: [f64; 3]) -> Result<Self> {
        let a0 = a[0];
        if a0 == 0.0 || !a0.is_finite() {
            return Err(AudioError::Transform(format!(
                "biquad leading denominator must be finite and non-zero (got {})",
                a0
            )));
        }
        let coeffs = Self {
            b: [b[0] / a0, b[1] / a0, b[2] / a0],
            a: [1.0, a[1] / a0, a[2] / a0],
        };
        if coeffs.b.iter().chain(coeffs.a.iter()).any(|c| !c.is_finite()) {
            return Err(AudioError::Transform("biquad coefficients are not finite".into()));
        }
        Ok(coeffs)
    }

    /// Poles strictly inside the unit circle
    ///
    /// For a monic quadratic 1 + a1 z^-1 + a2 z^-2 this is |a2| < 1 and
    /// |a1| < 1 + a2.
    pub fn is_stable(&self) -> bool {
        let (a1, a2) = (self.a[1], self.a[2]);
        a2.abs() < 1.0 && a1.abs() < 1.0 + a2
    }

    /// Gain at DC, sum(b) / sum(a)
    pub fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    /// Complex response H(e^jω) at `freq_hz`
    ///
    /// # Arguments
    /// * `freq_hz` - Evaluation frequency in Hz
    /// * `sample_rate` - Sample rate in Hz
    pub fn frequency_response(&self, freq_hz: f64, sample_rate: f64) -> Complex<f64> {
        let omega = 2.0 * PI * freq_hz / sample_rate;
        let z1 = Complex::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = Complex::new(self.b[0], 0.0) + z1 * self.b[1] + z2 * self.b[2];
        let den = Complex::new(self.a[0], 0.0) + z1 * self.a[1] + z2 * self.a[2];
        num / den
    }

    /// |H| at `freq_hz`
    pub fn magnitude_at(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        self.frequency_response(freq_hz, sample_rate).norm()
    }
}

fn check_frequency(freq_hz: f64, sample_rate: f64, what: &str) -> Result<f64> {
    let nyquist = sample_rate / 2.0;
    if !(sample_rate > 0.0) {
        return Err(AudioError::Transform(format!(
            "sample rate must be positive (got {})",
            sample_rate
        )));
    }
    if !(freq_hz > 0.0 && freq_hz < nyquist) {
        return Err(AudioError::Transform(format!(
            "{} {} Hz must lie in (0, {}) for sample rate {} Hz",
            what, freq_hz, nyquist, sample_rate
        )));
    }
    Ok(nyquist)
}

/// Design a 2nd-order Butterworth low-pass
///
/// Pre-warped bilinear transform with K = tan(π·fc/fs); unity gain at DC,
/// -3 dB at `cutoff_hz`.
///
/// # Arguments
/// * `cutoff_hz` - Cutoff frequency in Hz, strictly below Nyquist
/// * `sample_rate` - Sample rate in Hz
pub fn butterworth_lowpass(cutoff_hz: f64, sample_rate: f64) -> Result<BiquadCoefficients> {
    check_frequency(cutoff_hz, sample_rate, "cutoff")?;

    let k = (PI * cutoff_hz / sample_rate).tan();
    let k2 = k * k;
    let norm = 1.0 / (1.0 + SQRT_2 * k + k2);

    let b0 = k2 * norm;
    BiquadCoefficients::new(
        [b0, 2.0 * b0, b0],
        [1.0, 2.0 * (k2 - 1.0) * norm, (1.0 - SQRT_2 * k + k2) * norm],
    )
}

/// Design a resonant peak (band-pass) section centred on `center_hz`
///
/// Unity gain at the centre, zeros at DC and Nyquist. Bandwidth is
/// `center / q` measured at -3 dB.
///
/// # Arguments
/// * `center_hz` - Centre frequency in Hz, strictly below Nyquist
/// * `q` - Quality factor (> 0)
/// * `sample_rate` - Sample rate in Hz
pub fn resonant_peak(center_hz: f64, q: f64, sample_rate: f64) -> Result<BiquadCoefficients> {
    let nyquist = check_frequency(center_hz, sample_rate, "centre frequency")?;
    if !(q > 0.0) {
        return Err(AudioError::Transform(format!("Q must be positive (got {})", q)));
    }

    let w0 = PI * center_hz / nyquist;
    let bw = w0 / q;
    let beta = (bw / 2.0).tan();
    let gain = 1.0 / (1.0 + beta);

    BiquadCoefficients::new(
        [1.0 - gain, 0.0, -(1.0 - gain)],
        [1.0, -2.0 * gain * w0.cos(), 2.0 * gain - 1.0],
    )
}
