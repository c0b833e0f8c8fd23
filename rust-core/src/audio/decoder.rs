//! Container decoding with symphonia
//!
//! Decodes the whole clip into memory at its native sample rate and channel
//! layout. No resampling, no downmixing.

use super::buffer::SampleBuffer;
use crate::error::{AudioError, Result};
use std::io::Cursor;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::debug;

/// Stream properties read from the container header
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    /// Duration in seconds, when the container declares a frame count
    pub duration_secs: Option<f64>,
    pub sample_rate: u32,
    pub channels: usize,
    /// Short codec name (e.g. "pcm_s16le", "mp3")
    pub codec: String,
}

/// Decode an encoded audio byte stream into a [`SampleBuffer`]
///
/// # Arguments
/// * `bytes` - Complete encoded file contents
/// * `extension_hint` - Optional file extension ("wav", "mp3", ...) to speed up probing
pub fn decode(bytes: &[u8], extension_hint: Option<&str>) -> Result<SampleBuffer> {
    let mut format = open_format(bytes, extension_hint)?;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::Decode("No audio tracks found".into()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AudioError::Decode("Stream does not declare a sample rate".into()))?;
    let mut channel_count = track.codec_params.channels.map(|c| c.count());
    let declared_frames = track.codec_params.n_frames;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut channels: Vec<Vec<f64>> = vec![Vec::new(); channel_count.unwrap_or(0)];

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            // A new logical stream starts; the first one is the clip
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(AudioError::Decode(format!("Error reading packet: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| AudioError::Decode(format!("Corrupt audio packet: {}", e)))?;

        let packet_channels = decoded.spec().channels.count();
        match channel_count {
            None => {
                channel_count = Some(packet_channels);
                channels = vec![Vec::new(); packet_channels];
            }
            Some(expected) if expected != packet_channels => {
                return Err(AudioError::Decode(format!(
                    "Channel layout changed mid-stream ({} -> {})",
                    expected, packet_channels
                )));
            }
            Some(_) => {}
        }

        append_planar(decoded, &mut channels);
    }

    if channels.is_empty() || channels[0].is_empty() {
        return Err(AudioError::Decode("Stream contains no audio frames".into()));
    }
    if let Some(declared) = declared_frames {
        let decoded = channels[0].len() as u64;
        if decoded < declared {
            return Err(AudioError::Decode(format!(
                "Stream is truncated: decoded {} of {} declared frames",
                decoded, declared
            )));
        }
    }

    let buffer = SampleBuffer::new(channels, sample_rate)
        .map_err(|e| AudioError::Decode(e.to_string()))?;

    debug!(
        sample_rate,
        channels = buffer.channel_count(),
        frames = buffer.frames(),
        "decoded audio"
    );

    Ok(buffer)
}

/// Read container properties without decoding the audio
pub fn probe_info(bytes: &[u8], extension_hint: Option<&str>) -> Result<AudioInfo> {
    let format = open_format(bytes, extension_hint)?;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::Decode("No audio tracks found".into()))?;

    let params = &track.codec_params;
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| AudioError::Decode("Stream does not declare a sample rate".into()))?;
    let duration_secs = params
        .n_frames
        .map(|frames| frames as f64 / sample_rate as f64);
    let codec = symphonia::default::get_codecs()
        .get_codec(params.codec)
        .map(|d| d.short_name.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    Ok(AudioInfo {
        duration_secs,
        sample_rate,
        channels: params.channels.map(|c| c.count()).unwrap_or(0),
        codec,
    })
}

fn open_format(bytes: &[u8], extension_hint: Option<&str>) -> Result<Box<dyn FormatReader>> {
    if bytes.is_empty() {
        return Err(AudioError::Decode("Input is empty".into()));
    }

    let source = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(source), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension_hint {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Decode(format!("Unrecognized audio container: {}", e)))?;

    Ok(probed.format)
}

/// Append one decoded packet to the per-channel vectors as `f64`
///
/// Signed integers use symmetric scaling (divide by 2^(N-1)); unsigned
/// integers are re-centred on their midpoint first.
fn append_planar(decoded: AudioBufferRef<'_>, out: &mut [Vec<f64>]) {
    match decoded {
        AudioBufferRef::F32(buf) => extend_channels(&buf, out, |s| s as f64),
        AudioBufferRef::F64(buf) => extend_channels(&buf, out, |s| s),
        AudioBufferRef::S8(buf) => extend_channels(&buf, out, |s| s as f64 / 128.0),
        AudioBufferRef::S16(buf) => extend_channels(&buf, out, |s| s as f64 / 32768.0),
        AudioBufferRef::S24(buf) => extend_channels(&buf, out, |s| s.inner() as f64 / 8388608.0),
        AudioBufferRef::S32(buf) => extend_channels(&buf, out, |s| s as f64 / 2147483648.0),
        AudioBufferRef::U8(buf) => extend_channels(&buf, out, |s| (s as f64 - 128.0) / 128.0),
        AudioBufferRef::U16(buf) => extend_channels(&buf, out, |s| (s as f64 - 32768.0) / 32768.0),
        AudioBufferRef::U24(buf) => {
            extend_channels(&buf, out, |s| (s.inner() as f64 - 8388608.0) / 8388608.0)
        }
        AudioBufferRef::U32(buf) => {
            extend_channels(&buf, out, |s| (s as f64 - 2147483648.0) / 2147483648.0)
        }
    }
}

fn extend_channels<S, F>(buf: &AudioBuffer<S>, out: &mut [Vec<f64>], to_f64: F)
where
    S: Sample,
    F: Fn(S) -> f64,
{
    for (index, channel) in out.iter_mut().enumerate() {
        channel.extend(buf.chan(index).iter().map(|&s| to_f64(s)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};

    fn wav_bytes_i16(channels: &[Vec<i16>], sample_rate: u32) -> Vec<u8> {
        let spec = WavSpec {
            channels: channels.len() as u16,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut bytes = Vec::new();
        {
            let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
            for i in 0..channels[0].len() {
                for channel in channels {
                    writer.write_sample(channel[i]).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        bytes
    }

    #[test]
    fn test_decode_mono_wav_preserves_rate_and_samples() {
        let samples: Vec<i16> = vec![0, 16384, -16384, 32767, -32768];
        let bytes = wav_bytes_i16(&[samples], 22050);

        let buffer = decode(&bytes, Some("wav")).unwrap();

        assert_eq!(buffer.channel_count(), 1);
        assert_eq!(buffer.sample_rate(), 22050);
        assert_eq!(buffer.channel(0), &[0.0, 0.5, -0.5, 32767.0 / 32768.0, -1.0]);
    }

    #[test]
    fn test_decode_stereo_wav_keeps_channels_separate() {
        let left: Vec<i16> = vec![1000; 64];
        let right: Vec<i16> = vec![-2000; 64];
        let bytes = wav_bytes_i16(&[left, right], 48000);

        let buffer = decode(&bytes, None).unwrap();

        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frames(), 64);
        assert!(buffer.channel(0).iter().all(|&s| s == 1000.0 / 32768.0));
        assert!(buffer.channel(1).iter().all(|&s| s == -2000.0 / 32768.0));
    }

    #[test]
    fn test_garbage_bytes_are_decode_error() {
        let err = decode(b"definitely not an audio file", None).unwrap_err();
        assert!(matches!(err, AudioError::Decode(_)));
    }

    #[test]
    fn test_empty_input_is_decode_error() {
        assert!(matches!(decode(&[], None), Err(AudioError::Decode(_))));
    }

    #[test]
    fn test_truncated_header_is_decode_error() {
        let bytes = wav_bytes_i16(&[vec![0; 32]], 8000);
        let err = decode(&bytes[..20], Some("wav")).unwrap_err();
        assert!(matches!(err, AudioError::Decode(_)));
    }

    #[test]
    fn test_truncated_data_is_decode_error() {
        let bytes = wav_bytes_i16(&[vec![100; 8000]], 8000);
        let cut = &bytes[..bytes.len() / 2];

        let err = decode(cut, Some("wav")).unwrap_err();
        assert!(matches!(err, AudioError::Decode(ref msg) if msg.contains("truncated")));
    }

    #[test]
    fn test_probe_info_reports_duration() {
        let bytes = wav_bytes_i16(&[vec![0; 8000], vec![0; 8000]], 16000);
        let info = probe_info(&bytes, Some("wav")).unwrap();

        assert_eq!(info.sample_rate, 16000);
        assert_eq!(info.channels, 2);
        let duration = info.duration_secs.unwrap();
        assert!((duration - 0.5).abs() < 1e-9);
    }
}
