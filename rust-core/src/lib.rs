//! Slowboost - slowed + bass-boosted audio rendering
//!
//! Decodes an audio file, time-stretches it with a phase vocoder, boosts the
//! low end and writes 16-bit WAV. Python bindings are built with the
//! `python` feature.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod audio;
pub mod config;
pub mod error;
pub mod filters;
pub mod spectrum;

#[cfg(feature = "python")]
mod python_bindings;

pub use audio::{process, Pipeline, ProcessingRequest, Quality, SampleBuffer, Session};
pub use config::PipelineConfig;
pub use error::{AudioError, PipelineError, Stage};
pub use filters::{BassEnhancer, BassStrategy};
pub use spectrum::{band_energy, TimeStretcher};
