//! Caller-owned session state
//!
//! One slot for the current original and one for the latest processed
//! result. A failed run leaves the previous result in place.

use super::processor::{
    CancelToken, EncodedAudio, Pipeline, PipelineRun, PipelineState, ProcessingRequest,
};
use super::source::AudioSource;
use crate::error::{AudioError, PipelineError, Stage};

/// Result of a successful run, tied to the source it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedAudio {
    audio: EncodedAudio,
    source_stem: String,
    request: ProcessingRequest,
}

impl ProcessedAudio {
    pub fn bytes(&self) -> &[u8] {
        &self.audio.bytes
    }

    pub fn audio(&self) -> &EncodedAudio {
        &self.audio
    }

    pub fn request(&self) -> &ProcessingRequest {
        &self.request
    }

    /// Download name, `processed_<original stem>.wav`
    pub fn file_name(&self) -> String {
        format!("processed_{}.wav", self.source_stem)
    }
}

/// Single-slot session cache
#[derive(Debug, Default)]
pub struct Session {
    pipeline: Pipeline,
    original: Option<AudioSource>,
    processed: Option<ProcessedAudio>,
}

impl Session {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            original: None,
            processed: None,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Replace the current original; any processed result is dropped
    pub fn load(&mut self, source: AudioSource) {
        self.original = Some(source);
        self.processed = None;
    }

    pub fn original(&self) -> Option<&AudioSource> {
        self.original.as_ref()
    }

    pub fn processed(&self) -> Option<&ProcessedAudio> {
        self.processed.as_ref()
    }

    /// Process the current original
    pub fn process(
        &mut self,
        request: &ProcessingRequest,
    ) -> Result<&ProcessedAudio, PipelineError> {
        self.process_with_cancel(request, &CancelToken::new())
            .into_result()?;
        self.processed.as_ref().ok_or_else(|| {
            PipelineError::new(Stage::Encode, AudioError::Encode("no result stored".into()))
        })
    }

    /// Process the current original with cancellation and keep the trace
    ///
    /// The processed slot is only overwritten when the run succeeds.
    pub fn process_with_cancel(
        &mut self,
        request: &ProcessingRequest,
        cancel: &CancelToken,
    ) -> PipelineRun {
        let source = match &self.original {
            Some(source) => source,
            None => {
                return PipelineRun {
                    trace: vec![PipelineState::Idle, PipelineState::Failed(Stage::Decode)],
                    result: Err(PipelineError::new(
                        Stage::Decode,
                        AudioError::Decode("no audio loaded".into()),
                    )),
                }
            }
        };

        let extension = source.extension();
        let run = self
            .pipeline
            .run(source.bytes(), extension.as_deref(), request, cancel);

        if let Ok(audio) = &run.result {
            self.processed = Some(ProcessedAudio {
                audio: audio.clone(),
                source_stem: source.stem().to_string(),
                request: *request,
            });
        }
        run
    }

    /// Drop both slots
    pub fn clear(&mut self) {
        self.original = None;
        self.processed = None;
    }
}
