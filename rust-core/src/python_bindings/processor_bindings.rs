//! Python bindings for the processing pipeline

use crate::audio::decoder;
use crate::audio::processor::{self, Quality};
use crate::audio::session::Session;
use crate::audio::source::AudioSource;
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict};

/// Quality tier exposed to Python
#[pyclass(name = "Quality")]
#[derive(Clone, Copy)]
pub enum PyQuality {
    Standard,
    High,
}

impl From<PyQuality> for Quality {
    fn from(py_quality: PyQuality) -> Self {
        match py_quality {
            PyQuality::Standard => Quality::Standard,
            PyQuality::High => Quality::High,
        }
    }
}

/// Process an encoded audio file
///
/// Args:
///     audio_bytes: Encoded input (wav, mp3, flac, m4a, ogg)
///     tempo_factor: Playback speed multiplier (1.0 = unchanged)
///     bass_boost_db: Low-frequency boost in dB (0 = unchanged)
///     quality: Quality tier
///
/// Returns:
///     16-bit PCM WAV file as bytes
#[pyfunction]
#[pyo3(signature = (audio_bytes, tempo_factor=1.0, bass_boost_db=0.0, quality=PyQuality::Standard))]
pub fn process<'py>(
    py: Python<'py>,
    audio_bytes: &[u8],
    tempo_factor: f64,
    bass_boost_db: f64,
    quality: PyQuality,
) -> PyResult<&'py PyBytes> {
    let quality = quality.into();
    let output = py.allow_threads(|| {
        processor::process(audio_bytes, tempo_factor, bass_boost_db, quality)
    })?;
    Ok(PyBytes::new(py, &output))
}

/// Read stream properties without decoding
///
/// Returns:
///     dict with duration (seconds or None), sample_rate, channels, codec
#[pyfunction]
#[pyo3(signature = (audio_bytes, filename=None))]
pub fn probe_info<'py>(
    py: Python<'py>,
    audio_bytes: &[u8],
    filename: Option<&str>,
) -> PyResult<&'py PyDict> {
    let extension =
        filename.and_then(|name| AudioSource::from_upload(Vec::new(), name).extension());
    let info = decoder::probe_info(audio_bytes, extension.as_deref())?;

    let dict = PyDict::new(py);
    dict.set_item("duration", info.duration_secs)?;
    dict.set_item("sample_rate", info.sample_rate)?;
    dict.set_item("channels", info.channels)?;
    dict.set_item("codec", info.codec)?;
    Ok(dict)
}

/// Session holding the current original and processed audio
#[pyclass(name = "Session")]
pub struct PySession {
    session: Session,
}

#[pymethods]
impl PySession {
    #[new]
    fn new() -> Self {
        Self {
            session: Session::default(),
        }
    }

    /// Load an uploaded file as the current original
    ///
    /// Args:
    ///     data: File contents
    ///     filename: Original file name (extension guides decoding)
    fn load_upload(&mut self, data: &[u8], filename: &str) {
        self.session
            .load(AudioSource::from_upload(data.to_vec(), filename));
    }

    /// Load downloaded audio, named after the clip title
    fn load_download(&mut self, data: &[u8], title: &str) {
        self.session.load(AudioSource::from_download(data.to_vec(), title));
    }

    /// Process the current original
    ///
    /// On failure the previous processed result is kept.
    #[pyo3(signature = (tempo_factor=1.0, bass_boost_db=0.0, quality=PyQuality::Standard))]
    fn process(
        &mut self,
        py: Python<'_>,
        tempo_factor: f64,
        bass_boost_db: f64,
        quality: PyQuality,
    ) -> PyResult<()> {
        let request = self
            .session
            .pipeline()
            .request(tempo_factor, bass_boost_db, quality.into())?;
        let session = &mut self.session;
        py.allow_threads(|| session.process(&request).map(|_| ()))?;
        Ok(())
    }

    /// Processed WAV bytes, or None before the first successful run
    fn processed_bytes<'py>(&self, py: Python<'py>) -> Option<&'py PyBytes> {
        self.session
            .processed()
            .map(|processed| PyBytes::new(py, processed.bytes()))
    }

    /// Suggested download name for the processed audio
    fn output_file_name(&self) -> Option<String> {
        self.session.processed().map(|processed| processed.file_name())
    }

    fn original_file_name(&self) -> Option<String> {
        self.session.original().map(|source| source.filename().to_string())
    }

    /// Advisory notes for a parameter combination
    #[staticmethod]
    #[pyo3(signature = (tempo_factor, bass_boost_db, quality=PyQuality::Standard))]
    fn recommendations(
        tempo_factor: f64,
        bass_boost_db: f64,
        quality: PyQuality,
    ) -> PyResult<Vec<String>> {
        let request = Session::default()
            .pipeline()
            .request(tempo_factor, bass_boost_db, quality.into())?;
        Ok(request
            .recommendations()
            .iter()
            .map(|r| r.message().to_string())
            .collect())
    }
}
