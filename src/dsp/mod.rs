//! Low-level DSP primitives used by the oscillator bank.
//!
//! These components are allocation-free and realtime-safe, so the bank can
//! own them directly and render from inside the audio callback.

/// Constant gain and level conversions.
pub mod gain;
/// Sine phase-accumulator oscillator.
pub mod oscillator;

pub use oscillator::SineOscillator;
