use std::path::Path;

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use shepard_tone::{backend::offline::OfflineBackend, ToneEngine, MAX_BLOCK_SIZE};
use tracing::info;

use crate::cli::Args;

const DEFAULT_BOUNCE_SECONDS: f64 = 10.0;

pub fn run(args: &Args, path: &Path) -> EyreResult<()> {
    let config = args.tone_config();
    let sample_rate = args.sample_rate;
    let seconds = args.seconds.unwrap_or(DEFAULT_BOUNCE_SECONDS);
    let total_frames = (seconds * sample_rate as f64).round() as usize;

    let backend = OfflineBackend::offline(sample_rate as f32, config.step_count);
    let mut engine = ToneEngine::new(backend, config).wrap_err("failed to set up tone engine")?;
    engine.set_volume(args.volume)?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .wrap_err_with(|| format!("failed to create {}", path.display()))?;

    engine.play()?;
    let mut block = vec![0.0f32; MAX_BLOCK_SIZE];
    let mut frames_written = 0;
    while frames_written < total_frames {
        let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
        let block = &mut block[..frames];
        engine.render(block)?;
        for &sample in block.iter() {
            writer.write_sample(sample)?;
        }
        frames_written += frames;
    }
    engine.pause()?;
    writer.finalize().wrap_err("failed to finalize wav file")?;

    info!(
        path = %path.display(),
        frames = total_frames,
        sample_rate,
        "bounced shepard tone"
    );
    Ok(())
}
