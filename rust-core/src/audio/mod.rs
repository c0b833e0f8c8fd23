//! Audio buffers, codecs and the processing pipeline

pub mod buffer;
pub mod decoder;
pub mod encoder;
pub mod normalize;
pub mod processor;
pub mod session;
pub mod source;

pub use buffer::SampleBuffer;
pub use decoder::{decode, probe_info, AudioInfo};
pub use encoder::encode_wav;
pub use normalize::{limit_buffer, limit_peak, normalize_peak, DEFAULT_TARGET_PEAK};
pub use processor::{
    estimate_processing_time, process, CancelToken, EncodedAudio, Pipeline, PipelineRun,
    PipelineState, ProcessingRequest, Quality, Recommendation,
};
pub use session::{ProcessedAudio, Session};
pub use source::{AudioSource, SourceFetcher, SourceInfo};
