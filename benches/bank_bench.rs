//! Benchmarks for the oscillator bank and the engine tick.
//!
//! Run with: cargo bench
//!
//! Reference timing at 48kHz sample rate:
//!   - 64 samples  = 1.33ms deadline
//!   - 128 samples = 2.67ms deadline
//!   - 256 samples = 5.33ms deadline
//!   - 512 samples = 10.67ms deadline

use std::{hint::black_box, time::Duration};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use shepard_tone::{
    backend::offline::OfflineBackend,
    synth::{BankMessage, GainId, OscillatorBank, OscillatorId},
    ToneConfig, ToneEngine,
};

/// Common buffer sizes used in audio applications.
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];
const SAMPLE_RATE: f32 = 48_000.0;

fn full_bank(voices: usize) -> OscillatorBank {
    let mut bank = OscillatorBank::new(SAMPLE_RATE, voices);
    bank.apply(BankMessage::SetGain {
        gain: GainId(0),
        value: 1.0 / 12.0,
    });
    bank.apply(BankMessage::RouteGain {
        gain: GainId(0),
        routed: true,
    });
    for i in 0..voices {
        bank.apply(BankMessage::Start {
            id: OscillatorId(i as u32),
            // Keep every rung below Nyquist so all voices do real work
            frequency: 20.0 * 1.4_f32.powi(i as i32),
            gain: Some(GainId(0)),
            delay_frames: 0,
        });
    }
    bank
}

fn bench_bank(c: &mut Criterion) {
    let mut group = c.benchmark_group("bank/render");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Default Shepard bank: 12 sines
        let mut bank = full_bank(12);
        group.bench_with_input(BenchmarkId::new("12_voices", size), &size, |b, _| {
            b.iter(|| bank.render_block(black_box(&mut buffer)))
        });

        let mut bank = full_bank(16);
        group.bench_with_input(BenchmarkId::new("16_voices", size), &size, |b, _| {
            b.iter(|| bank.render_block(black_box(&mut buffer)))
        });
    }

    group.finish();
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/tick");

    for steps in [4usize, 12, 24] {
        let config = ToneConfig::new()
            .step_count(steps)
            .minimum_frequency(1.0)
            .loop_duration(Duration::from_millis(10 * steps as u64));
        let mut engine =
            ToneEngine::new(OfflineBackend::offline(SAMPLE_RATE, steps), config).unwrap();
        engine.play().unwrap();

        // One tick per iteration: advance the virtual clock by one interval
        let interval = engine.tick_interval();
        group.bench_with_input(BenchmarkId::new("retune", steps), &steps, |b, _| {
            b.iter(|| {
                engine.backend_mut().scheduler_mut().advance(interval);
                black_box(engine.dispatch_due().unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_bank, bench_tick);
criterion_main!(benches);
