use std::time::Duration;

use crate::{
    backend::{Scheduler, SoftwareBackend},
    engine::{scheduler::ManualScheduler, ToneEngine},
    error::ToneError,
    synth::OscillatorBank,
    MAX_BLOCK_SIZE,
};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

// Whole nanoseconds, so block boundaries land exactly on tick deadlines
fn frames_to_duration(frames: usize, sample_rate: f64) -> Duration {
    Duration::from_nanos((frames as f64 * NANOS_PER_SEC / sample_rate).round() as u64)
}

/// Software backend on a virtual clock, rendering straight from its bank.
pub type OfflineBackend = SoftwareBackend<ManualScheduler, OscillatorBank>;

impl OfflineBackend {
    pub fn offline(sample_rate: f32, voice_capacity: usize) -> Self {
        SoftwareBackend::new(
            ManualScheduler::new(),
            OscillatorBank::new(sample_rate, voice_capacity),
            sample_rate,
        )
    }
}

impl ToneEngine<OfflineBackend> {
    /// Render the next `out.len()` mono samples.
    ///
    /// Audio and the virtual clock advance together. Blocks are cut at tick
    /// deadlines so every tick lands on the first sample at or after its
    /// deadline.
    pub fn render(&mut self, out: &mut [f32]) -> Result<(), ToneError> {
        let sample_rate = self.backend().sample_rate() as f64;
        let mut written = 0;

        while written < out.len() {
            self.dispatch_due()?;

            let remaining = (out.len() - written).min(MAX_BLOCK_SIZE);
            let frames = match self.backend().time_until_next() {
                Some(wait) => (wait.as_nanos() as f64 * sample_rate / NANOS_PER_SEC)
                    .ceil()
                    .clamp(1.0, remaining as f64) as usize,
                None => remaining,
            };

            let block = &mut out[written..written + frames];
            let backend = self.backend_mut();
            backend.sender_mut().render_block(block);
            backend
                .scheduler_mut()
                .advance(frames_to_duration(frames, sample_rate));

            written += frames;
        }

        // Ticks that fall exactly on the end of the buffer belong to this render
        self.dispatch_due()?;
        Ok(())
    }
}
