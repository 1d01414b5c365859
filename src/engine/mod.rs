//! The Shepard tone engine.
//!
//! `ToneEngine` owns a fixed bank of oscillator slots, one shared gain stage
//! and the loop phase. Every tick retunes *every* slot to the ladder for the
//! current phase, advances the phase by one and re-arms itself. Playback is a
//! two-state machine (idle / playing); the phase survives pausing.

pub mod ladder;
pub mod scheduler;
pub mod slots;
pub mod volume;

use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::{
    backend::AudioBackend,
    config::{Direction, ToneConfig},
    error::{BackendError, ToneError},
};

use self::{
    ladder::StepLadder,
    scheduler::RepeatingTask,
    slots::SlotTable,
    volume::{gain_to_volume, volume_to_gain},
};

/// Tune, route and start a freshly created oscillator.
fn launch<B: AudioBackend>(
    backend: &mut B,
    oscillator: &B::Oscillator,
    frequency: f32,
    gain: &B::Gain,
) -> Result<(), BackendError> {
    backend.set_frequency(oscillator, frequency)?;
    backend.connect_oscillator(oscillator, gain)?;
    backend.start(oscillator, Duration::ZERO)
}

pub struct ToneEngine<B: AudioBackend> {
    backend: B,
    config: ToneConfig,
    ladder: StepLadder,
    // Kept for the engine's lifetime: the gain stage routes into it
    #[allow(dead_code)]
    sink: B::Sink,
    gain: B::Gain,
    slots: SlotTable<B::Oscillator>,
    current_step: usize,
    task: RepeatingTask<B::Timer>,
    playing: bool,
}

impl<B: AudioBackend> ToneEngine<B> {
    /// Bind an engine to `backend`.
    ///
    /// Claims the output sink, creates the shared gain stage, routes it to
    /// the sink and sets full volume. No oscillator exists until the first
    /// tick.
    pub fn new(mut backend: B, config: ToneConfig) -> Result<Self, ToneError> {
        config.validate()?;
        let ladder = StepLadder::new(config.minimum_frequency, config.step_count)?;

        let sink = backend.output_sink()?;
        let gain = backend.create_gain()?;
        backend.connect_gain(&gain, &sink)?;
        backend.set_gain(&gain, volume_to_gain(1.0))?;

        debug!(
            steps = config.step_count,
            min_hz = config.minimum_frequency,
            max_hz = config.maximum_frequency,
            loop_ms = config.loop_duration.as_millis() as u64,
            "tone engine ready"
        );

        Ok(Self {
            backend,
            ladder,
            sink,
            gain,
            slots: SlotTable::new(config.step_count),
            current_step: 0,
            task: RepeatingTask::new(config.tick_interval()),
            playing: false,
            config,
        })
    }

    /// Engine with the default parameters (10 Hz, 12 steps, 5 s loop).
    pub fn with_defaults(backend: B) -> Result<Self, ToneError> {
        Self::new(backend, ToneConfig::default())
    }

    /// Start playback. Does nothing if already playing.
    ///
    /// The first tick runs synchronously; later ticks are driven through
    /// [`ToneEngine::dispatch_due`] or [`ToneEngine::on_timer`]. If the first
    /// tick fails the engine is silenced and returned to idle before the
    /// error propagates.
    pub fn play(&mut self) -> Result<(), ToneError> {
        if self.playing {
            return Ok(());
        }
        self.playing = true;
        debug!(step = self.current_step, "play");
        self.tick_or_halt()
    }

    /// Stop playback: cancel the pending tick, then stop every held
    /// oscillator. Safe to call when already idle.
    ///
    /// The slot table and the loop phase are left as they are.
    pub fn pause(&mut self) -> Result<(), ToneError> {
        self.task.cancel(&mut self.backend);
        self.playing = false;

        let backend = &mut self.backend;
        let result = self
            .slots
            .for_each_held(|oscillator| backend.stop(oscillator, Duration::ZERO));
        debug!(step = self.current_step, "pause");
        result.map_err(ToneError::from)
    }

    /// Rewind the loop phase to 0. The sounding ladder is untouched until the
    /// next tick.
    pub fn reset(&mut self) {
        debug!(from = self.current_step, "reset");
        self.current_step = 0;
    }

    /// Volume in `[0, 1]` (not clamped).
    pub fn volume(&self) -> f32 {
        gain_to_volume(self.backend.gain(&self.gain))
    }

    pub fn set_volume(&mut self, volume: f32) -> Result<(), ToneError> {
        debug!(volume, "set volume");
        self.backend.set_gain(&self.gain, volume_to_gain(volume))?;
        Ok(())
    }

    /// Deliver a fired timer. Returns whether it ran a tick; timers that are
    /// not the pending tick (cancelled, stale, foreign) are ignored.
    ///
    /// A failing tick pauses the engine before the error propagates, so a
    /// later [`ToneEngine::play`] starts cleanly.
    pub fn on_timer(&mut self, timer: B::Timer) -> Result<bool, ToneError> {
        if !self.task.claim(timer) || !self.playing {
            return Ok(false);
        }
        self.tick_or_halt()?;
        Ok(true)
    }

    /// Drain every due timer from the backend, running ticks as they come.
    /// Returns the number of ticks run.
    pub fn dispatch_due(&mut self) -> Result<usize, ToneError> {
        let mut ticks = 0;
        while let Some(timer) = self.backend.pop_due() {
            if self.on_timer(timer)? {
                ticks += 1;
            }
        }
        Ok(ticks)
    }

    /// Time until the next tick is due, `None` when idle.
    pub fn time_until_next_tick(&self) -> Option<Duration> {
        if !self.task.is_armed() {
            return None;
        }
        self.backend.time_until_next()
    }

    fn tick_or_halt(&mut self) -> Result<(), ToneError> {
        if let Err(err) = self.tick() {
            // Best effort: the tick error is the one worth reporting
            let _ = self.pause();
            warn!(step = self.current_step, "tick failed, playback halted: {err}");
            return Err(err);
        }
        Ok(())
    }

    fn tick(&mut self) -> Result<(), ToneError> {
        let step = self.current_step;

        for (slot, frequency) in self.ladder.frequencies(step).enumerate() {
            let backend = &mut self.backend;
            self.slots
                .retire(slot, |old| backend.stop(old, Duration::ZERO))?;

            let oscillator = backend.create_oscillator()?;
            if let Err(err) = launch(&mut *backend, &oscillator, frequency, &self.gain) {
                // Never installed, so pause would not reach it
                let _ = backend.stop(&oscillator, Duration::ZERO);
                return Err(err.into());
            }
            self.slots.install(slot, oscillator, frequency);
        }

        self.current_step = self
            .config
            .direction
            .advance(self.current_step, self.config.step_count);
        self.task.arm(&mut self.backend)?;

        trace!(
            step,
            next = self.current_step,
            lowest_hz = self.ladder.frequency(0, step),
            "tick"
        );
        Ok(())
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Loop phase the next tick will use.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn step_count(&self) -> usize {
        self.config.step_count
    }

    pub fn tick_interval(&self) -> Duration {
        self.task.interval()
    }

    pub fn direction(&self) -> Direction {
        self.config.direction
    }

    pub fn config(&self) -> &ToneConfig {
        &self.config
    }

    pub fn ladder(&self) -> &StepLadder {
        &self.ladder
    }

    /// Frequency last assigned to each slot (`None` before the first tick).
    pub fn slot_frequencies(&self) -> Vec<Option<f32>> {
        self.slots
            .iter()
            .map(|slot| slot.map(|s| s.frequency))
            .collect()
    }

    /// Oscillator handles currently held, one per slot.
    pub fn slot_oscillators(&self) -> impl Iterator<Item = Option<&B::Oscillator>> + '_ {
        self.slots.iter().map(|slot| slot.map(|s| &s.oscillator))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
