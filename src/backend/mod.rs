//! Audio backend capabilities consumed by the tone engine.
//!
//! The engine never synthesizes audio itself. It drives three kinds of
//! backend objects: oscillators, gain stages (plus the output sink they feed)
//! and a cancellable timer. Each kind is a separate trait so a backend can be
//! assembled from independent pieces; [`AudioBackend`] is the bundle the
//! engine asks for.
//!
//! Handles are plain values owned by the caller. All operations go through the
//! backend so handles never need a back-reference to it.

use std::{fmt, time::Duration};

use crate::error::BackendError;

/// Offline rendering backend (software synth + virtual clock).
pub mod offline;
/// Realtime output through the default `cpal` device.
#[cfg(feature = "rtrb")]
pub mod realtime;
/// Control-side node arena that feeds an oscillator bank.
pub mod software;

pub use software::{GainId, OscillatorId, OscillatorInfo, OscillatorState, SinkId, SoftwareBackend};

/// Gain stages and the output sink they route into.
pub trait GainStages {
    type Sink;
    type Gain;

    /// Claim the destination all audio ends up in.
    fn output_sink(&mut self) -> Result<Self::Sink, BackendError>;

    /// New gain stage at unity gain.
    fn create_gain(&mut self) -> Result<Self::Gain, BackendError>;

    fn connect_gain(&mut self, gain: &Self::Gain, sink: &Self::Sink) -> Result<(), BackendError>;

    /// Write the raw (backend scale) gain value.
    fn set_gain(&mut self, gain: &Self::Gain, value: f32) -> Result<(), BackendError>;

    /// Read back the raw gain value.
    fn gain(&self, gain: &Self::Gain) -> f32;
}

/// One-shot periodic sources.
///
/// An oscillator is created silent, tuned and connected, started once and
/// stopped once. Stopping is idempotent: stopping an oscillator that is
/// already stopped (or was never started) succeeds without effect.
pub trait Oscillators {
    type Oscillator;
    /// What an oscillator can be connected to
    type Target;

    fn create_oscillator(&mut self) -> Result<Self::Oscillator, BackendError>;

    fn set_frequency(&mut self, oscillator: &Self::Oscillator, hz: f32) -> Result<(), BackendError>;

    fn connect_oscillator(
        &mut self,
        oscillator: &Self::Oscillator,
        target: &Self::Target,
    ) -> Result<(), BackendError>;

    /// Start producing sound `offset` from now.
    fn start(&mut self, oscillator: &Self::Oscillator, offset: Duration) -> Result<(), BackendError>;

    /// Stop producing sound `offset` from now.
    fn stop(&mut self, oscillator: &Self::Oscillator, offset: Duration) -> Result<(), BackendError>;
}

/// Cancellable delayed wake-ups.
///
/// Firing is pull-based: whoever drives the backend calls [`Scheduler::pop_due`]
/// and hands each fired timer to its owner.
pub trait Scheduler {
    type Timer: Copy + Eq + fmt::Debug;

    fn schedule_after(&mut self, delay: Duration) -> Result<Self::Timer, BackendError>;

    /// Cancelling an unknown or already fired timer does nothing.
    fn cancel(&mut self, timer: Self::Timer);

    /// Next timer whose deadline has passed, earliest first.
    fn pop_due(&mut self) -> Option<Self::Timer>;

    /// Time left until the earliest pending timer, `None` when nothing is scheduled.
    fn time_until_next(&self) -> Option<Duration>;
}

/// Everything the tone engine needs from a backend: oscillators that connect
/// into gain stages, plus a scheduler.
pub trait AudioBackend:
    GainStages + Oscillators<Target = <Self as GainStages>::Gain> + Scheduler
{
}

impl<B> AudioBackend for B where
    B: GainStages + Oscillators<Target = <B as GainStages>::Gain> + Scheduler
{
}
