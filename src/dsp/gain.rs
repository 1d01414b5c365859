//! Constant gain primitive.

/*
Gain
====

A gain stage multiplies every sample by one scalar:

    out[i] = in[i] × gain

    gain > 1.0  →  amplification
    gain = 1.0  →  unity, unchanged
    gain < 1.0  →  attenuation
    gain = 0.0  →  silence

Decibels relate to the scalar as dB = 20 × log₁₀(gain); halving the gain is
roughly -6 dB.

A Shepard bank sums a dozen full-scale sines into one gain stage, so the raw
sum peaks well above 1.0. The engine compensates by writing volume / 12 into
the stage (about -21.6 dB at full volume).
*/

/// Multiply a signal by a constant gain factor (in-place).
#[inline]
pub fn apply_gain(signal: &mut [f32], gain: f32) {
    for sample in signal.iter_mut() {
        *sample *= gain;
    }
}

/// Convert a linear gain to decibels.
#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.abs().max(1e-12).log10()
}
