//! End-to-end properties of the processing pipeline
//!
//! Inputs are WAV files written with hound; outputs are read back with hound
//! and measured with the crate's own band analysis.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use proptest::prelude::*;
use slowboost::error::ErrorKind;
use slowboost::{band_energy, process, Quality, Stage};
use std::f64::consts::PI;
use std::io::Cursor;

/// Largest peak after 16-bit quantization of a 0.95-normalized signal
const PEAK_LIMIT: f64 = 0.95 + 1.0 / 32768.0;

// ===== Helpers =====

/// Sum of sines with a 50 ms linear fade-in, same on every channel
fn tones(partials: &[(f64, f64)], seconds: f64, sample_rate: u32) -> Vec<f64> {
    let len = (seconds * sample_rate as f64).round() as usize;
    let fade = (sample_rate as f64 * 0.05) as usize;
    (0..len)
        .map(|n| {
            let t = n as f64 / sample_rate as f64;
            let env = (n as f64 / fade.max(1) as f64).min(1.0);
            env * partials
                .iter()
                .map(|&(freq, amp)| amp * (2.0 * PI * freq * t).sin())
                .sum::<f64>()
        })
        .collect()
}

fn write_wav(samples: &[f64], sample_rate: u32, channels: u16) -> Vec<u8> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut bytes = Vec::new();
    {
        let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
        for &s in samples {
            let q = (s * 32768.0).round().clamp(-32768.0, 32767.0) as i16;
            for _ in 0..channels {
                writer.write_sample(q).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    bytes
}

/// Decode WAV bytes into (spec, per-channel samples)
fn read_wav(bytes: &[u8]) -> (WavSpec, Vec<Vec<f64>>) {
    let mut reader = WavReader::new(Cursor::new(bytes)).unwrap();
    let spec = reader.spec();
    let channels = spec.channels as usize;
    let mut out = vec![Vec::new(); channels];
    for (i, s) in reader.samples::<i16>().enumerate() {
        out[i % channels].push(s.unwrap() as f64 / 32768.0);
    }
    (spec, out)
}

fn peak(channels: &[Vec<f64>]) -> f64 {
    channels
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, &s| acc.max(s.abs()))
}

fn low_band_energy(bytes: &[u8]) -> f64 {
    let (spec, channels) = read_wav(bytes);
    band_energy(&channels[0], spec.sample_rate, 0.0, 250.0).unwrap()
}

// ===== Concrete scenarios =====

#[test]
fn identity_parameters_round_trip_exactly() {
    let input = write_wav(&tones(&[(440.0, 0.4), (90.0, 0.3)], 0.5, 22050), 22050, 2);
    let output = process(&input, 1.0, 0.0, Quality::Standard).unwrap();
    assert_eq!(output, input);
}

#[test]
fn slowed_tone_lasts_longer() {
    let input = write_wav(&tones(&[(100.0, 0.5)], 2.0, 44100), 44100, 1);
    let output = process(&input, 0.75, 0.0, Quality::Standard).unwrap();

    let (spec, channels) = read_wav(&output);
    assert_eq!(spec.sample_rate, 44100);
    assert_eq!(spec.channels, 1);
    assert_eq!(channels[0].len(), 117_600);
    let duration = channels[0].len() as f64 / spec.sample_rate as f64;
    assert!((duration - 2.0 / 0.75).abs() < 1e-3, "duration {}", duration);
}

#[test]
fn boosted_tone_gains_low_band_energy_without_clipping() {
    let input = write_wav(&tones(&[(100.0, 0.5)], 2.0, 44100), 44100, 1);
    let output = process(&input, 1.0, 10.0, Quality::Standard).unwrap();

    let (_, channels) = read_wav(&output);
    assert!(peak(&channels) <= PEAK_LIMIT);
    assert!(low_band_energy(&output) > low_band_energy(&input));
}

#[test]
fn stretched_transients_are_peak_limited_without_boost() {
    let sample_rate = 44100;
    let mut samples = tones(&[(220.0, 0.6)], 1.0, sample_rate);
    for (n, s) in samples.iter_mut().enumerate().skip(2205).step_by(2205) {
        *s = if (n / 2205) % 2 == 0 { 0.99 } else { -0.99 };
    }
    let input = write_wav(&samples, sample_rate, 1);

    let output = process(&input, 0.75, 0.0, Quality::Standard).unwrap();

    let (_, channels) = read_wav(&output);
    assert_eq!(channels[0].len(), 58_800);
    assert!(peak(&channels) <= PEAK_LIMIT, "peak {}", peak(&channels));
    assert!(channels[0].iter().all(|&s| s > -1.0 && s < 32767.0 / 32768.0));
}

#[test]
fn quiet_stretch_keeps_its_level() {
    let input = write_wav(&tones(&[(440.0, 0.3)], 1.0, 16000), 16000, 1);
    let output = process(&input, 1.25, 0.0, Quality::Standard).unwrap();

    let (_, channels) = read_wav(&output);
    let level = peak(&channels);
    assert!(level > 0.25 && level < 0.35, "peak {}", level);
}

#[test]
fn tempo_monotonically_shortens_output() {
    let input = write_wav(&tones(&[(220.0, 0.5)], 1.0, 8000), 8000, 1);
    let tempos = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

    let durations: Vec<f64> = tempos
        .iter()
        .map(|&tempo| {
            let output = process(&input, tempo, 0.0, Quality::Standard).unwrap();
            let (spec, channels) = read_wav(&output);
            channels[0].len() as f64 / spec.sample_rate as f64
        })
        .collect();

    for pair in durations.windows(2) {
        assert!(pair[1] < pair[0], "durations not decreasing: {:?}", durations);
    }
    for (&tempo, &duration) in tempos.iter().zip(&durations) {
        let expected = 1.0 / tempo;
        assert!(
            (duration - expected).abs() / expected < 0.02,
            "tempo {} gave {} s",
            tempo,
            duration
        );
    }
}

#[test]
fn bass_boost_never_lowers_low_band_energy() {
    let input = write_wav(&tones(&[(80.0, 0.4)], 1.0, 22050), 22050, 1);

    for quality in [Quality::Standard, Quality::High] {
        let energies: Vec<f64> = [0.0, 3.0, 6.0, 12.0]
            .iter()
            .map(|&boost| low_band_energy(&process(&input, 1.0, boost, quality).unwrap()))
            .collect();

        assert!(energies[1] > energies[0], "{:?}: {:?}", quality, energies);
        for pair in energies[1..].windows(2) {
            assert!(pair[1] >= pair[0] * 0.98, "{:?}: {:?}", quality, energies);
        }
    }
}

#[test]
fn high_quality_boost_favours_bass_over_treble() {
    let input = write_wav(&tones(&[(60.0, 0.3), (3000.0, 0.3)], 1.0, 44100), 44100, 1);
    let output = process(&input, 1.0, 12.0, Quality::High).unwrap();

    let (spec, channels) = read_wav(&output);
    let (_, original) = read_wav(&input);
    let ratio = |samples: &[f64]| {
        band_energy(samples, spec.sample_rate, 0.0, 250.0).unwrap()
            / band_energy(samples, spec.sample_rate, 2000.0, 4000.0).unwrap()
    };
    assert!(ratio(&channels[0]) > 2.0 * ratio(&original[0]));
}

#[test]
fn stereo_layout_is_preserved() {
    let input = write_wav(&tones(&[(330.0, 0.4)], 0.5, 16000), 16000, 2);
    let output = process(&input, 1.25, 4.0, Quality::High).unwrap();

    let (spec, channels) = read_wav(&output);
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 16000);
    assert_eq!(channels[0].len(), 6400);
    assert_eq!(channels[0], channels[1]);
}

#[test]
fn silence_stays_silent() {
    let input = write_wav(&vec![0.0; 8000], 8000, 1);
    let output = process(&input, 0.8, 6.0, Quality::Standard).unwrap();

    let (_, channels) = read_wav(&output);
    assert_eq!(channels[0].len(), 10_000);
    assert!(channels[0].iter().all(|&s| s == 0.0));
}

#[test]
fn out_of_range_parameters_are_rejected_by_stage() {
    let input = write_wav(&tones(&[(440.0, 0.5)], 0.1, 8000), 8000, 1);

    for tempo in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let err = process(&input, tempo, 0.0, Quality::Standard).unwrap_err();
        assert_eq!(err.stage, Stage::Stretch);
        assert_eq!(err.kind(), ErrorKind::Transform);
    }

    let err = process(&input, 1.0, -3.0, Quality::Standard).unwrap_err();
    assert_eq!(err.stage, Stage::BassBoost);
    assert_eq!(err.kind(), ErrorKind::Transform);
}

#[test]
fn undecodable_input_fails_in_decode_stage() {
    let err = process(b"definitely not audio", 0.8, 3.0, Quality::Standard).unwrap_err();
    assert_eq!(err.stage, Stage::Decode);
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(!err.to_string().is_empty());
}

// ===== Property Tests =====

fn arbitrary_partials() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((40.0f64..3500.0, 0.05f64..0.3), 1..4)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// Property: any boosted output stays under the normalization target
    #[test]
    fn boosted_output_never_clips(
        partials in arbitrary_partials(),
        tempo in 0.5f64..2.0,
        boost in 0.5f64..20.0,
        high in any::<bool>(),
    ) {
        let quality = if high { Quality::High } else { Quality::Standard };
        let input = write_wav(&tones(&partials, 0.5, 8000), 8000, 1);
        let output = process(&input, tempo, boost, quality).unwrap();

        let (_, channels) = read_wav(&output);
        prop_assert!(peak(&channels) <= PEAK_LIMIT, "peak {}", peak(&channels));
    }

    /// Property: channel count and rate survive, length follows the tempo
    #[test]
    fn layout_and_length_follow_parameters(
        partials in arbitrary_partials(),
        channels in 1u16..=2,
        tempo in 0.5f64..2.0,
        boost in 0.0f64..10.0,
    ) {
        let input = write_wav(&tones(&partials, 0.25, 8000), 8000, channels);
        let output = process(&input, tempo, boost, Quality::Standard).unwrap();

        let (spec, decoded) = read_wav(&output);
        prop_assert_eq!(spec.channels, channels);
        prop_assert_eq!(spec.sample_rate, 8000);
        let expected = (2000.0 / tempo).round() as usize;
        prop_assert_eq!(decoded[0].len(), expected);
        prop_assert!(decoded.iter().flatten().all(|s| s.is_finite()));
    }
}
