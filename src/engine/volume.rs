//! Public volume scale ↔ backend gain scale.
//!
//! Volume is exposed in `[0, 1]`. The raw gain written to the backend is
//! `volume / GAIN_VOLUME_FACTOR`, which leaves headroom for a dozen full-scale
//! sines summed into one stage. Values outside `[0, 1]` are passed through
//! unclamped; keeping them in range is the caller's job.

pub const GAIN_VOLUME_FACTOR: f32 = 12.0;

#[inline]
pub fn volume_to_gain(volume: f32) -> f32 {
    volume / GAIN_VOLUME_FACTOR
}

#[inline]
pub fn gain_to_volume(gain: f32) -> f32 {
    gain * GAIN_VOLUME_FACTOR
}
