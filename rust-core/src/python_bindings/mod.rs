//! PyO3 bindings for Python integration

use crate::error::{AudioError, ErrorKind, PipelineError};
use pyo3::create_exception;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use tracing_subscriber::EnvFilter;

mod filter_bindings;
mod processor_bindings;
mod spectrum_bindings;

create_exception!(slowboost, DecodeError, PyRuntimeError);
create_exception!(slowboost, TransformError, PyRuntimeError);
create_exception!(slowboost, EncodeError, PyRuntimeError);
create_exception!(slowboost, SourceUnavailableError, PyRuntimeError);
create_exception!(slowboost, CancelledError, PyRuntimeError);

fn exception_for(kind: ErrorKind, message: String) -> PyErr {
    match kind {
        ErrorKind::Decode => DecodeError::new_err(message),
        ErrorKind::Transform => TransformError::new_err(message),
        ErrorKind::Encode => EncodeError::new_err(message),
        ErrorKind::SourceUnavailable => SourceUnavailableError::new_err(message),
        ErrorKind::Cancelled => CancelledError::new_err(message),
        ErrorKind::Config => PyValueError::new_err(message),
    }
}

impl From<AudioError> for PyErr {
    fn from(err: AudioError) -> Self {
        exception_for(err.kind(), err.to_string())
    }
}

impl From<PipelineError> for PyErr {
    fn from(err: PipelineError) -> Self {
        exception_for(err.kind(), err.to_string())
    }
}

/// Install a stderr log subscriber
///
/// Args:
///     level: Filter directive such as "info" or "slowboost=debug"
///
/// Calling again after a subscriber is installed has no effect.
#[pyfunction]
#[pyo3(signature = (level="info"))]
fn init_logging(level: &str) -> PyResult<()> {
    let filter = EnvFilter::try_new(level)
        .map_err(|e| PyValueError::new_err(format!("invalid log filter '{}': {}", level, e)))?;
    // Err only means a subscriber is already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}

/// Python module definition
#[pymodule]
fn slowboost(py: Python, m: &PyModule) -> PyResult<()> {
    m.add("DecodeError", py.get_type::<DecodeError>())?;
    m.add("TransformError", py.get_type::<TransformError>())?;
    m.add("EncodeError", py.get_type::<EncodeError>())?;
    m.add("SourceUnavailableError", py.get_type::<SourceUnavailableError>())?;
    m.add("CancelledError", py.get_type::<CancelledError>())?;

    m.add_class::<processor_bindings::PyQuality>()?;
    m.add_class::<processor_bindings::PySession>()?;
    m.add_function(wrap_pyfunction!(processor_bindings::process, m)?)?;
    m.add_function(wrap_pyfunction!(processor_bindings::probe_info, m)?)?;
    m.add_function(wrap_pyfunction!(spectrum_bindings::time_stretch, m)?)?;
    m.add_function(wrap_pyfunction!(spectrum_bindings::band_energy, m)?)?;
    m.add_function(wrap_pyfunction!(filter_bindings::boost_bass, m)?)?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;

    Ok(())
}
