//! Spectral analysis, STFT and phase-vocoder time stretching

pub mod analysis;
pub mod fft;
pub mod stft;
pub mod vocoder;
pub mod windowing;

pub use analysis::{band_energy, SpectrumAnalyzer};
pub use fft::FftEngine;
pub use stft::Stft;
pub use vocoder::TimeStretcher;
