//! Pipeline orchestration
//!
//! Decode → (time-stretch) → (bass boost) → encode, each stage at most once
//! per run and skipped when its parameter is the identity. The first failure
//! ends the run and carries the stage that produced it.

use super::buffer::SampleBuffer;
use super::{decoder, encoder, normalize};
use crate::config::{ParameterLimits, PipelineConfig};
use crate::error::{AudioError, PipelineError, Result, Stage};
use crate::filters::bass::{BassEnhancer, BassStrategy};
use crate::spectrum::vocoder::TimeStretcher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Processing quality tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Quality {
    /// Larger hop, shelving bass
    #[default]
    Standard,
    /// Half the hop, multi-band peaking bass
    High,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Standard => f.write_str("Standard"),
            Quality::High => f.write_str("High"),
        }
    }
}

impl FromStr for Quality {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Quality::Standard),
            "high" => Ok(Quality::High),
            other => Err(AudioError::Transform(format!(
                "unknown quality tier '{}' (expected Standard or High)",
                other
            ))),
        }
    }
}

/// Validated user parameters for one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessingRequest {
    tempo_factor: f64,
    bass_boost_db: f64,
    quality: Quality,
}

/// Advisory notes about a parameter combination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    /// Tempo below 0.5 tends to smear transients
    VerySlowTempo,
    /// Tempo above 1.5 tends to sound choppy
    VeryFastTempo,
    /// Boost above 10 dB eats headroom
    HighBassBoost,
    /// Slowed and boosted together
    SlowedAndBoosted,
}

impl Recommendation {
    pub fn is_warning(&self) -> bool {
        !matches!(self, Recommendation::SlowedAndBoosted)
    }

    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::VerySlowTempo => {
                "Very slow tempo may result in artifacts. Consider using 0.5x or higher."
            }
            Recommendation::VeryFastTempo => {
                "Very fast tempo may cause quality degradation. Consider using 1.5x or lower."
            }
            Recommendation::HighBassBoost => {
                "High bass boost may cause distortion. Consider using 10 dB or lower."
            }
            Recommendation::SlowedAndBoosted => {
                "Slowed songs with bass boost create the popular 'slowed + reverb' effect."
            }
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

pub(crate) fn check_tempo(tempo_factor: f64, limits: &ParameterLimits) -> Result<()> {
    if !tempo_factor.is_finite() || tempo_factor <= 0.0 {
        return Err(AudioError::Transform(format!(
            "tempo_factor must be a positive number (got {})",
            tempo_factor
        )));
    }
    if tempo_factor < limits.tempo_min || tempo_factor > limits.tempo_max {
        return Err(AudioError::Transform(format!(
            "tempo_factor must be between {} and {} (got {})",
            limits.tempo_min, limits.tempo_max, tempo_factor
        )));
    }
    Ok(())
}

pub(crate) fn check_boost(bass_boost_db: f64, limits: &ParameterLimits) -> Result<()> {
    if !bass_boost_db.is_finite() || bass_boost_db < 0.0 {
        return Err(AudioError::Transform(format!(
            "bass_boost_db must be a non-negative number (got {})",
            bass_boost_db
        )));
    }
    if bass_boost_db < limits.bass_min_db || bass_boost_db > limits.bass_max_db {
        return Err(AudioError::Transform(format!(
            "bass_boost_db must be between {} and {} dB (got {})",
            limits.bass_min_db, limits.bass_max_db, bass_boost_db
        )));
    }
    Ok(())
}

impl ProcessingRequest {
    /// Validate and build a request
    ///
    /// # Arguments
    /// * `tempo_factor` - Playback speed multiplier (1.0 = unchanged)
    /// * `bass_boost_db` - Low-frequency boost in dB (0 = unchanged)
    /// * `quality` - Quality tier
    /// * `limits` - Accepted parameter ranges
    pub fn new(
        tempo_factor: f64,
        bass_boost_db: f64,
        quality: Quality,
        limits: &ParameterLimits,
    ) -> Result<Self> {
        check_tempo(tempo_factor, limits)?;
        check_boost(bass_boost_db, limits)?;
        Ok(Self {
            tempo_factor,
            bass_boost_db,
            quality,
        })
    }

    pub fn tempo_factor(&self) -> f64 {
        self.tempo_factor
    }

    pub fn bass_boost_db(&self) -> f64 {
        self.bass_boost_db
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Stretch runs unless the tempo is exactly 1.0
    pub fn needs_stretch(&self) -> bool {
        self.tempo_factor != 1.0
    }

    /// Bass runs unless the boost is exactly 0 dB
    pub fn needs_bass(&self) -> bool {
        self.bass_boost_db != 0.0
    }

    pub fn recommendations(&self) -> Vec<Recommendation> {
        let mut notes = Vec::new();
        if self.tempo_factor < 0.5 {
            notes.push(Recommendation::VerySlowTempo);
        }
        if self.tempo_factor > 1.5 {
            notes.push(Recommendation::VeryFastTempo);
        }
        if self.bass_boost_db > 10.0 {
            notes.push(Recommendation::HighBassBoost);
        }
        if self.tempo_factor < 1.0 && self.bass_boost_db > 5.0 {
            notes.push(Recommendation::SlowedAndBoosted);
        }
        notes
    }
}

/// Rough wall-clock estimate for a run over `size_bytes` of input
///
/// Half a second per megabyte, scaled up for stretching, boosting and the
/// High tier, never below two seconds.
pub fn estimate_processing_time(size_bytes: u64, request: &ProcessingRequest) -> Duration {
    let megabytes = size_bytes as f64 / (1024.0 * 1024.0);
    let mut seconds = megabytes * 0.5;
    if request.needs_stretch() {
        seconds *= 1.5;
    }
    if request.bass_boost_db > 0.0 {
        seconds *= 1.1;
    }
    if request.quality == Quality::High {
        seconds *= 1.5;
    }
    Duration::from_secs_f64(seconds.max(2.0))
}

/// Cooperative cancellation flag, checked between stages
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Orchestrator states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Decoded,
    Stretched,
    BassBoosted,
    Encoded,
    Done,
    Failed(Stage),
}

/// Encoded output of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedAudio {
    pub bytes: Vec<u8>,
    pub sample_rate: u32,
    pub channels: usize,
    pub frames: usize,
}

impl EncodedAudio {
    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Outcome of one run plus the states it passed through
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub trace: Vec<PipelineState>,
    pub result: std::result::Result<EncodedAudio, PipelineError>,
}

impl PipelineRun {
    pub fn into_result(self) -> std::result::Result<EncodedAudio, PipelineError> {
        self.result
    }

    pub fn final_state(&self) -> PipelineState {
        self.trace.last().copied().unwrap_or(PipelineState::Idle)
    }
}

/// Stateless pipeline bound to a configuration
///
/// Holds no buffers between runs, so one instance can serve concurrent
/// callers.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create pipeline after validating `config`
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate raw parameters against this pipeline's limits
    pub fn request(
        &self,
        tempo_factor: f64,
        bass_boost_db: f64,
        quality: Quality,
    ) -> Result<ProcessingRequest> {
        ProcessingRequest::new(tempo_factor, bass_boost_db, quality, &self.config.limits)
    }

    /// Bass strategy for a quality tier
    pub fn bass_strategy(&self, quality: Quality) -> BassStrategy {
        match quality {
            Quality::High if self.config.high_quality_bass => BassStrategy::MultiBandPeaking,
            _ => BassStrategy::Shelving,
        }
    }

    /// Run the whole pipeline and keep the state trace
    ///
    /// # Arguments
    /// * `audio_bytes` - Encoded input file
    /// * `extension_hint` - Optional file extension to guide probing
    /// * `request` - Validated parameters
    /// * `cancel` - Checked before each stage
    pub fn run(
        &self,
        audio_bytes: &[u8],
        extension_hint: Option<&str>,
        request: &ProcessingRequest,
        cancel: &CancelToken,
    ) -> PipelineRun {
        let started = Instant::now();
        let mut trace = vec![PipelineState::Idle];

        let result = self.execute(audio_bytes, extension_hint, request, cancel, &mut trace);

        match &result {
            Ok(output) => {
                trace.push(PipelineState::Done);
                info!(
                    tempo = request.tempo_factor,
                    bass_db = request.bass_boost_db,
                    quality = %request.quality,
                    input_bytes = audio_bytes.len(),
                    output_bytes = output.bytes.len(),
                    duration_secs = output.duration_secs(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "pipeline run complete"
                );
            }
            Err(err) => {
                trace.push(PipelineState::Failed(err.stage));
                debug!(stage = %err.stage, error = %err.error, "pipeline run failed");
            }
        }

        PipelineRun { trace, result }
    }

    /// Run the pipeline without cancellation
    pub fn process(
        &self,
        audio_bytes: &[u8],
        extension_hint: Option<&str>,
        request: &ProcessingRequest,
    ) -> std::result::Result<EncodedAudio, PipelineError> {
        self.run(audio_bytes, extension_hint, request, &CancelToken::new())
            .into_result()
    }

    /// Apply the transform stages to an already decoded buffer
    pub fn transform(
        &self,
        buffer: &SampleBuffer,
        request: &ProcessingRequest,
    ) -> std::result::Result<SampleBuffer, PipelineError> {
        let mut trace = Vec::new();
        self.transform_stages(buffer.clone(), request, &CancelToken::new(), &mut trace)
    }

    fn execute(
        &self,
        audio_bytes: &[u8],
        extension_hint: Option<&str>,
        request: &ProcessingRequest,
        cancel: &CancelToken,
        trace: &mut Vec<PipelineState>,
    ) -> std::result::Result<EncodedAudio, PipelineError> {
        checkpoint(cancel, Stage::Decode)?;
        let decoded = decoder::decode(audio_bytes, extension_hint)
            .map_err(|e| PipelineError::new(Stage::Decode, e))?;
        trace.push(PipelineState::Decoded);
        debug!(
            state = ?PipelineState::Decoded,
            sample_rate = decoded.sample_rate(),
            channels = decoded.channel_count(),
            frames = decoded.frames(),
            "stage complete"
        );

        let buffer = self.transform_stages(decoded, request, cancel, trace)?;

        checkpoint(cancel, Stage::Encode)?;
        let bytes = encoder::encode_wav(&buffer, &self.config.encoder)
            .map_err(|e| PipelineError::new(Stage::Encode, e))?;
        trace.push(PipelineState::Encoded);
        debug!(state = ?PipelineState::Encoded, bytes = bytes.len(), "stage complete");

        Ok(EncodedAudio {
            bytes,
            sample_rate: buffer.sample_rate(),
            channels: buffer.channel_count(),
            frames: buffer.frames(),
        })
    }

    fn transform_stages(
        &self,
        mut buffer: SampleBuffer,
        request: &ProcessingRequest,
        cancel: &CancelToken,
        trace: &mut Vec<PipelineState>,
    ) -> std::result::Result<SampleBuffer, PipelineError> {
        let parallel = self.config.parallel_channels;

        if request.needs_stretch() {
            checkpoint(cancel, Stage::Stretch)?;
            let stretcher = TimeStretcher::for_quality(&self.config.stretch, request.quality)
                .map_err(|e| PipelineError::new(Stage::Stretch, e))?;
            let stretched = stretcher
                .stretch_buffer(&buffer, request.tempo_factor, parallel)
                .map_err(|e| PipelineError::new(Stage::Stretch, e))?;
            // Resynthesis can overshoot full scale on transients
            buffer =
                normalize::limit_buffer(&stretched, self.config.bass.target_peak, parallel)
                    .map_err(|e| PipelineError::new(Stage::Stretch, e))?;
            trace.push(PipelineState::Stretched);
            debug!(
                state = ?PipelineState::Stretched,
                tempo = request.tempo_factor,
                hop = stretcher.hop(),
                frames = buffer.frames(),
                "stage complete"
            );
        }

        if request.needs_bass() {
            checkpoint(cancel, Stage::BassBoost)?;
            let enhancer = BassEnhancer::new(self.config.bass.clone());
            buffer = enhancer
                .enhance(
                    &buffer,
                    request.bass_boost_db,
                    self.bass_strategy(request.quality),
                    parallel,
                )
                .map_err(|e| PipelineError::new(Stage::BassBoost, e))?;
            trace.push(PipelineState::BassBoosted);
            debug!(
                state = ?PipelineState::BassBoosted,
                bass_db = request.bass_boost_db,
                peak = buffer.peak(),
                "stage complete"
            );
        }

        Ok(buffer)
    }
}

fn checkpoint(cancel: &CancelToken, next: Stage) -> std::result::Result<(), PipelineError> {
    if cancel.is_cancelled() {
        debug!(stage = %next, "cancelled before stage");
        return Err(PipelineError::new(next, AudioError::Cancelled));
    }
    Ok(())
}

/// One-shot processing with the default configuration
///
/// # Arguments
/// * `audio_bytes` - Encoded input file (any supported container)
/// * `tempo_factor` - Playback speed multiplier
/// * `bass_boost_db` - Low-frequency boost in dB
/// * `quality` - Quality tier
///
/// # Returns
/// 16-bit PCM WAV bytes at the input's sample rate and channel count
pub fn process(
    audio_bytes: &[u8],
    tempo_factor: f64,
    bass_boost_db: f64,
    quality: Quality,
) -> std::result::Result<Vec<u8>, PipelineError> {
    let pipeline = Pipeline::default();
    let limits = &pipeline.config().limits;
    check_tempo(tempo_factor, limits).map_err(|e| PipelineError::new(Stage::Stretch, e))?;
    check_boost(bass_boost_db, limits).map_err(|e| PipelineError::new(Stage::BassBoost, e))?;

    let request = ProcessingRequest {
        tempo_factor,
        bass_boost_db,
        quality,
    };
    pipeline
        .process(audio_bytes, None, &request)
        .map(|output| output.bytes)
}
