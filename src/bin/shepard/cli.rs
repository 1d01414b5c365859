use std::{path::PathBuf, time::Duration};

use clap::Parser;
use shepard_tone::{Direction, ToneConfig};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Play an endlessly rising Shepard tone")]
pub struct Args {
    /// Lowest ladder frequency in Hz
    #[arg(long, default_value_t = ToneConfig::DEFAULT_MINIMUM_FREQUENCY)]
    pub min_frequency: f32,

    /// Upper end of the design range in Hz (informational)
    #[arg(long, default_value_t = ToneConfig::DEFAULT_MAXIMUM_FREQUENCY)]
    pub max_frequency: f32,

    /// Oscillator slots, also the pitch positions per loop
    #[arg(long, default_value_t = ToneConfig::DEFAULT_STEP_COUNT)]
    pub steps: usize,

    /// Duration of one full loop in milliseconds
    #[arg(long, default_value_t = 5_000)]
    pub loop_ms: u64,

    /// Volume between 0 (muted) and 1 (loudest)
    #[arg(long, default_value_t = 1.0)]
    pub volume: f32,

    /// Fall instead of rise
    #[arg(long, default_value_t = false)]
    pub descending: bool,

    /// Stop after this many seconds (realtime default: run until killed)
    #[arg(long, value_parser = parse_seconds)]
    pub seconds: Option<f64>,

    /// Render offline to a WAV file instead of playing
    #[arg(long, value_name = "PATH")]
    pub wav: Option<PathBuf>,

    /// Sample rate for offline rendering
    #[arg(long, default_value_t = 48_000)]
    pub sample_rate: u32,
}

fn parse_seconds(value: &str) -> Result<f64, String> {
    let seconds: f64 = value.parse().map_err(|err| format!("{err}"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("expected a non-negative number of seconds, got {value}"));
    }
    Ok(seconds)
}

impl Args {
    pub fn tone_config(&self) -> ToneConfig {
        ToneConfig::new()
            .minimum_frequency(self.min_frequency)
            .maximum_frequency(self.max_frequency)
            .step_count(self.steps)
            .loop_duration(Duration::from_millis(self.loop_ms))
            .direction(if self.descending {
                Direction::Descending
            } else {
                Direction::Ascending
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("shepard").chain(args.iter().copied()))
    }

    #[test]
    fn seconds_must_be_finite_and_non_negative() {
        for bad in ["--seconds=-1", "--seconds=NaN", "--seconds=inf", "--seconds=abc"] {
            assert!(parse(&[bad]).is_err(), "{bad} was accepted");
        }

        assert_eq!(parse(&["--seconds", "2.5"]).unwrap().seconds, Some(2.5));
        assert_eq!(parse(&["--seconds", "0"]).unwrap().seconds, Some(0.0));
        assert_eq!(parse(&[]).unwrap().seconds, None);
    }

    #[test]
    fn flags_map_onto_tone_config() {
        let args = parse(&["--steps", "6", "--loop-ms", "600", "--descending"]).unwrap();
        let config = args.tone_config();
        assert_eq!(config.step_count, 6);
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.direction, Direction::Descending);
    }
}
