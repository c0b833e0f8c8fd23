//! Performance benchmarks for the processing stages
//!
//! Run with: cargo bench -p slowboost-core --bench pipeline_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use slowboost::audio::encoder::encode_wav;
use slowboost::config::{EncoderConfig, PipelineConfig, StretchConfig};
use slowboost::{process, BassEnhancer, Pipeline, Quality, SampleBuffer, TimeStretcher};
use std::f64::consts::PI;

/// Generate a test signal (bass line plus a 1kHz partial)
fn generate_test_signal(sample_rate: u32, duration_secs: f64) -> Vec<f64> {
    let num_samples = (sample_rate as f64 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            0.4 * (2.0 * PI * 80.0 * t).sin() + 0.2 * (2.0 * PI * 1000.0 * t).sin()
        })
        .collect()
}

fn bench_time_stretch(c: &mut Criterion) {
    let mut group = c.benchmark_group("time_stretch");
    let sample_rate = 44100;
    let input = generate_test_signal(sample_rate, 2.0);
    group.throughput(Throughput::Elements(input.len() as u64));

    for quality in [Quality::Standard, Quality::High] {
        let stretcher = TimeStretcher::for_quality(&StretchConfig::default(), quality).unwrap();
        for tempo in [0.75, 1.25] {
            group.bench_with_input(
                BenchmarkId::new(format!("{}", quality), tempo),
                &input,
                |b, input| {
                    b.iter(|| black_box(stretcher.stretch(black_box(input), tempo).unwrap()))
                },
            );
        }
    }

    group.finish();
}

fn bench_bass_boost(c: &mut Criterion) {
    let mut group = c.benchmark_group("bass_boost");
    let sample_rate = 44100;
    let samples = generate_test_signal(sample_rate, 2.0);
    let buffer = SampleBuffer::new(vec![samples.clone(), samples], sample_rate).unwrap();
    group.throughput(Throughput::Elements(buffer.frames() as u64));

    let pipeline = Pipeline::default();
    let enhancer = BassEnhancer::new(PipelineConfig::default().bass);

    for quality in [Quality::Standard, Quality::High] {
        let strategy = pipeline.bass_strategy(quality);
        for parallel in [false, true] {
            let mode = if parallel { "parallel" } else { "serial" };
            group.bench_with_input(
                BenchmarkId::new(format!("{}", quality), mode),
                &buffer,
                |b, buffer| {
                    b.iter(|| {
                        black_box(
                            enhancer
                                .enhance(black_box(buffer), 10.0, strategy, parallel)
                                .unwrap(),
                        )
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pipeline");
    group.sample_size(10);

    let sample_rate = 44100;
    let samples = generate_test_signal(sample_rate, 5.0);
    let buffer = SampleBuffer::new(vec![samples.clone(), samples], sample_rate).unwrap();
    let wav = encode_wav(&buffer, &EncoderConfig::default()).unwrap();
    group.throughput(Throughput::Bytes(wav.len() as u64));

    for quality in [Quality::Standard, Quality::High] {
        group.bench_with_input(
            BenchmarkId::new("slowed_boosted", format!("{}", quality)),
            &wav,
            |b, wav| b.iter(|| black_box(process(black_box(wav), 0.8, 6.0, quality).unwrap())),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_time_stretch, bench_bass_boost, bench_full_pipeline);
criterion_main!(benches);
