//! shepard - play or bounce a Shepard tone
//!
//! Run with: cargo run -- --seconds 20
//! Bounce:   cargo run -- --wav shepard.wav --seconds 10

mod bounce;
mod cli;
mod playback;

use clap::Parser;
use cli::Args;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match &args.wav {
        Some(path) => bounce::run(&args, path),
        None => playback::run(&args),
    }
}
