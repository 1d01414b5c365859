use std::{
    thread,
    time::{Duration, Instant},
};

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use shepard_tone::{backend::realtime, dsp::gain::gain_to_db, engine::volume, ToneEngine};
use tracing::info;

use crate::cli::Args;

// Upper bound on one sleep so a long tick interval still notices the deadline
const MAX_SLEEP: Duration = Duration::from_millis(50);

pub fn run(args: &Args) -> EyreResult<()> {
    let config = args.tone_config();
    config.validate().wrap_err("invalid tone parameters")?;

    let (backend, stream) =
        realtime::open_default_output(config.step_count).wrap_err("failed to open audio output")?;
    let mut engine = ToneEngine::new(backend, config).wrap_err("failed to set up tone engine")?;
    engine.set_volume(args.volume)?;

    info!(
        sample_rate = stream.sample_rate,
        channels = stream.channels,
        steps = config.step_count,
        tick_ms = engine.tick_interval().as_millis() as u64,
        gain_db = gain_to_db(volume::volume_to_gain(engine.volume())),
        "playing shepard tone"
    );

    let deadline = args
        .seconds
        .map(Duration::try_from_secs_f64)
        .transpose()
        .wrap_err("invalid --seconds")?
        .map(|run_for| Instant::now() + run_for);

    engine.play().wrap_err("failed to start playback")?;
    loop {
        let now = Instant::now();
        if deadline.is_some_and(|d| now >= d) {
            break;
        }

        let mut wait = engine.time_until_next_tick().unwrap_or(MAX_SLEEP).min(MAX_SLEEP);
        if let Some(d) = deadline {
            wait = wait.min(d - now);
        }
        thread::sleep(wait);
        engine.dispatch_due().wrap_err("tick failed")?;
    }

    engine.pause().wrap_err("failed to pause playback")?;
    // Give the callback a moment to apply the stop messages before the stream drops
    thread::sleep(Duration::from_millis(50));
    info!(step = engine.current_step(), "stopped");
    Ok(())
}
