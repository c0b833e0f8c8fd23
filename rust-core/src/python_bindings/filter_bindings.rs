//! Python bindings for bass enhancement

use super::processor_bindings::PyQuality;
use super::spectrum_bindings::{buffer_from_array, buffer_to_array};
use crate::audio::processor::Pipeline;
use crate::filters::BassEnhancer;
use numpy::{PyArray2, PyReadonlyArray2};
use pyo3::prelude::*;

/// Boost low frequencies and renormalize
///
/// Args:
///     audio: Samples shaped (channels, frames)
///     sample_rate: Sample rate in Hz
///     boost_db: Boost in dB (0 still renormalizes to a 0.95 peak)
///     quality: Standard uses a shelving lowpass, High uses peaking bands
///
/// Returns:
///     Boosted samples with peak at most 0.95
#[pyfunction]
#[pyo3(signature = (audio, sample_rate, boost_db, quality=PyQuality::Standard))]
pub fn boost_bass<'py>(
    py: Python<'py>,
    audio: PyReadonlyArray2<f64>,
    sample_rate: u32,
    boost_db: f64,
    quality: PyQuality,
) -> PyResult<&'py PyArray2<f64>> {
    let buffer = buffer_from_array(&audio, sample_rate)?;
    let pipeline = Pipeline::default();
    let strategy = pipeline.bass_strategy(quality.into());
    let enhancer = BassEnhancer::new(pipeline.config().bass.clone());
    let boosted = py.allow_threads(|| enhancer.enhance(&buffer, boost_db, strategy, true))?;
    buffer_to_array(py, boosted)
}
