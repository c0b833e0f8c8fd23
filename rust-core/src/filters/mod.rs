//! Window functions, biquad design and bass enhancement

pub mod bass;
pub mod design;
pub mod iir;
pub mod windows;

pub use bass::{BassEnhancer, BassPlan, BassStrategy};
pub use design::{butterworth_lowpass, resonant_peak, BiquadCoefficients};
pub use iir::{filtfilt, lfilter, BiquadFilter};
pub use windows::{generate_periodic_window, generate_window, WindowType};
