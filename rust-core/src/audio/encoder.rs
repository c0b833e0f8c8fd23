//! WAV encoding with hound
//!
//! Channels are interleaved here and nowhere else.

use super::buffer::SampleBuffer;
use crate::config::{BitDepth, EncoderConfig};
use crate::error::{AudioError, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use tracing::debug;

/// Most channels a written file may carry
pub const MAX_CHANNELS: usize = 8;

/// Highest sample rate accepted for output
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Serialize `buffer` to an in-memory WAV file
///
/// Integer formats use symmetric scaling (multiply by 2^(N-1)) with
/// rounding and saturate out-of-range samples.
///
/// # Arguments
/// * `buffer` - Audio to write
/// * `config` - Output sample format
///
/// # Returns
/// Complete RIFF/WAVE file bytes
pub fn encode_wav(buffer: &SampleBuffer, config: &EncoderConfig) -> Result<Vec<u8>> {
    let channels = buffer.channel_count();
    if channels == 0 || channels > MAX_CHANNELS {
        return Err(AudioError::Encode(format!(
            "unsupported channel count {} (1..={})",
            channels, MAX_CHANNELS
        )));
    }
    let sample_rate = buffer.sample_rate();
    if sample_rate == 0 || sample_rate > MAX_SAMPLE_RATE {
        return Err(AudioError::Encode(format!(
            "unsupported sample rate {} Hz (1..={})",
            sample_rate, MAX_SAMPLE_RATE
        )));
    }

    let spec = WavSpec {
        channels: channels as u16,
        sample_rate,
        bits_per_sample: config.bit_depth.bits(),
        sample_format: match config.bit_depth {
            BitDepth::Float32 => SampleFormat::Float,
            BitDepth::Int16 | BitDepth::Int24 => SampleFormat::Int,
        },
    };

    let data_len = buffer.frames() * channels * spec.bits_per_sample as usize / 8;
    let mut bytes = Vec::with_capacity(44 + data_len);
    {
        let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec)?;
        let interleaved = buffer.interleaved();

        match config.bit_depth {
            BitDepth::Int16 => {
                let mut samples = writer.get_i16_writer(interleaved.len() as u32);
                for &s in &interleaved {
                    samples.write_sample(quantize(s, 32768.0) as i16);
                }
                samples.flush()?;
            }
            BitDepth::Int24 => {
                for &s in &interleaved {
                    writer.write_sample(quantize(s, 8_388_608.0))?;
                }
            }
            BitDepth::Float32 => {
                for &s in &interleaved {
                    writer.write_sample(s as f32)?;
                }
            }
        }

        writer.finalize()?;
    }

    debug!(
        sample_rate,
        channels,
        frames = buffer.frames(),
        bytes = bytes.len(),
        "encoded wav"
    );

    Ok(bytes)
}

/// Round to the nearest integer step and saturate to [-scale, scale - 1]
#[inline]
fn quantize(sample: f64, scale: f64) -> i32 {
    if sample.is_nan() {
        return 0;
    }
    (sample * scale).round().clamp(-scale, scale - 1.0) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;

    #[test]
    fn test_int16_output_is_interleaved() {
        let buffer = SampleBuffer::new(vec![vec![0.5, -0.5], vec![0.25, 1.0]], 44100).unwrap();
        let bytes = encode_wav(&buffer, &EncoderConfig::default()).unwrap();

        let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![16384, 8192, -16384, 32767]);
    }

    #[test]
    fn test_int24_and_float_formats() {
        let buffer = SampleBuffer::mono(vec![0.5, -1.0], 48000).unwrap();

        let bytes = encode_wav(&buffer, &EncoderConfig { bit_depth: BitDepth::Int24 }).unwrap();
        let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
        let samples: Vec<i32> = reader.samples::<i32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![4_194_304, -8_388_608]);

        let bytes = encode_wav(&buffer, &EncoderConfig { bit_depth: BitDepth::Float32 }).unwrap();
        let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_format, SampleFormat::Float);
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0.5, -1.0]);
    }

    #[test]
    fn test_out_of_range_samples_saturate() {
        assert_eq!(quantize(1.7, 32768.0), 32767);
        assert_eq!(quantize(-3.0, 32768.0), -32768);
        assert_eq!(quantize(f64::NAN, 32768.0), 0);
    }

    #[test]
    fn test_rejects_unsupported_layouts() {
        let wide = SampleBuffer::new(vec![vec![0.0; 4]; 9], 44100).unwrap();
        assert!(matches!(
            encode_wav(&wide, &EncoderConfig::default()),
            Err(AudioError::Encode(_))
        ));

        let fast = SampleBuffer::mono(vec![0.0; 4], 768_000).unwrap();
        assert!(matches!(
            encode_wav(&fast, &EncoderConfig::default()),
            Err(AudioError::Encode(_))
        ));
    }

    #[test]
    fn test_empty_buffer_writes_header_only() {
        let buffer = SampleBuffer::mono(Vec::new(), 8000).unwrap();
        let bytes = encode_wav(&buffer, &EncoderConfig::default()).unwrap();
        let reader = WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.len(), 0);
    }
}
