use std::time::Duration;

use rustfft::{num_complex::Complex, FftPlanner};
use shepard_tone::{backend::offline::OfflineBackend, ToneConfig, ToneEngine};

const SAMPLE_RATE: f32 = 16_000.0;
const FFT_LEN: usize = 16_000; // 1 Hz bins

fn magnitude_spectrum(samples: &[f32]) -> Vec<f32> {
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(samples.len());

    // Hann window
    let denom = (samples.len() - 1) as f32;
    let mut buffer: Vec<Complex<f32>> = samples
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let w = 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos());
            Complex::new(s * w, 0.0)
        })
        .collect();
    fft.process(&mut buffer);

    buffer[..samples.len() / 2].iter().map(|c| c.norm()).collect()
}

/// Indices of the `count` strongest local maxima, ascending.
fn peaks(spectrum: &[f32], count: usize) -> Vec<usize> {
    let mut maxima: Vec<usize> = (1..spectrum.len() - 1)
        .filter(|&i| spectrum[i] > spectrum[i - 1] && spectrum[i] >= spectrum[i + 1])
        .collect();
    maxima.sort_by(|&a, &b| spectrum[b].total_cmp(&spectrum[a]));
    maxima.truncate(count);
    maxima.sort_unstable();
    maxima
}

fn engine(step_count: usize) -> ToneEngine<OfflineBackend> {
    let config = ToneConfig::new()
        .minimum_frequency(100.0)
        .step_count(step_count)
        // Long enough that one FFT window sees a single ladder
        .loop_duration(Duration::from_secs(2 * step_count as u64));
    ToneEngine::new(OfflineBackend::offline(SAMPLE_RATE, step_count), config).unwrap()
}

#[test]
fn rendered_ladder_has_octave_peaks() {
    let mut engine = engine(4);
    engine.play().unwrap();

    let mut out = vec![0.0; FFT_LEN];
    engine.render(&mut out).unwrap();

    let spectrum = magnitude_spectrum(&out);
    // 100, 200, 400, 800 Hz at step 0
    assert_eq!(peaks(&spectrum, 4), vec![100, 200, 400, 800]);
}

#[test]
fn rendered_ladder_shifts_after_a_tick() {
    let mut engine = engine(2);
    engine.play().unwrap();

    // Skip to just past the first tick at 2 s
    let mut skip = vec![0.0; 2 * SAMPLE_RATE as usize];
    engine.render(&mut skip).unwrap();
    assert_eq!(engine.current_step(), 0);

    let mut out = vec![0.0; FFT_LEN];
    engine.render(&mut out).unwrap();

    // Step 1 of a 2-step ladder: 100·√2 and 200·√2
    let spectrum = magnitude_spectrum(&out);
    assert_eq!(peaks(&spectrum, 2), vec![141, 283]);
}

#[test]
fn volume_scales_rendered_level() {
    let mut engine = engine(2);
    engine.play().unwrap();

    let mut loud = vec![0.0; 4_000];
    engine.render(&mut loud).unwrap();

    engine.set_volume(0.25).unwrap();
    let mut quiet = vec![0.0; 4_000];
    engine.render(&mut quiet).unwrap();

    let peak = |buf: &[f32]| buf.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
    // Two full-scale sines at 1/12 gain never exceed 2/12
    assert!(peak(&loud) <= 2.0 / 12.0 + 1e-4);
    let ratio = peak(&quiet) / peak(&loud);
    assert!((ratio - 0.25).abs() < 0.02, "ratio {ratio}");
}

#[test]
fn paused_engine_renders_silence() {
    let mut engine = engine(3);
    engine.play().unwrap();
    let mut out = vec![0.0; 1_000];
    engine.render(&mut out).unwrap();
    assert!(out.iter().any(|&s| s != 0.0));

    engine.pause().unwrap();
    engine.render(&mut out).unwrap();
    assert!(out.iter().all(|&s| s == 0.0));
}
