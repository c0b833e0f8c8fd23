//! Python bindings for time stretching and band analysis

use super::processor_bindings::PyQuality;
use crate::audio::buffer::SampleBuffer;
use crate::config::StretchConfig;
use crate::spectrum::{self, TimeStretcher};
use ndarray::Array2;
use numpy::{PyArray2, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

/// Copy a (channels, frames) array into a buffer
pub(super) fn buffer_from_array(
    audio: &PyReadonlyArray2<f64>,
    sample_rate: u32,
) -> PyResult<SampleBuffer> {
    let view = audio.as_array();
    let channels: Vec<Vec<f64>> = view.outer_iter().map(|row| row.to_vec()).collect();
    Ok(SampleBuffer::new(channels, sample_rate)?)
}

/// Convert a buffer back into a (channels, frames) array
pub(super) fn buffer_to_array<'py>(
    py: Python<'py>,
    buffer: SampleBuffer,
) -> PyResult<&'py PyArray2<f64>> {
    let shape = (buffer.channel_count(), buffer.frames());
    let flat: Vec<f64> = buffer.into_channels().into_iter().flatten().collect();
    let array = Array2::from_shape_vec(shape, flat)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(PyArray2::from_owned_array(py, array))
}

/// Change tempo without changing pitch
///
/// Args:
///     audio: Samples shaped (channels, frames)
///     sample_rate: Sample rate in Hz
///     tempo_factor: Playback speed multiplier (0.75 = 25% slower)
///     quality: Quality tier (High uses a finer hop)
///
/// Returns:
///     Stretched samples shaped (channels, round(frames / tempo_factor))
#[pyfunction]
#[pyo3(signature = (audio, sample_rate, tempo_factor, quality=PyQuality::Standard))]
pub fn time_stretch<'py>(
    py: Python<'py>,
    audio: PyReadonlyArray2<f64>,
    sample_rate: u32,
    tempo_factor: f64,
    quality: PyQuality,
) -> PyResult<&'py PyArray2<f64>> {
    let buffer = buffer_from_array(&audio, sample_rate)?;
    let stretcher = TimeStretcher::for_quality(&StretchConfig::default(), quality.into())?;
    let stretched = py.allow_threads(|| stretcher.stretch_buffer(&buffer, tempo_factor, true))?;
    buffer_to_array(py, stretched)
}

/// Mean-square energy between two frequencies
///
/// Args:
///     signal: Mono samples
///     sample_rate: Sample rate in Hz
///     lo_hz: Lower band edge
///     hi_hz: Upper band edge
#[pyfunction]
pub fn band_energy(
    signal: PyReadonlyArray1<f64>,
    sample_rate: u32,
    lo_hz: f64,
    hi_hz: f64,
) -> PyResult<f64> {
    let samples = signal.as_slice()?;
    Ok(spectrum::band_energy(samples, sample_rate, lo_hz, hi_hz)?)
}
