use std::f32::consts::TAU;

/*
Sine Oscillator
===============

Every rung of a Shepard ladder is a pure tone. A sine carries no overtones,
so an octave-spaced stack of sines stays octave-spaced: nothing in the
spectrum gives away which rung is "the bottom", which is what lets the ladder
wrap around without the ear noticing.

Phase Accumulator
-----------------

Rather than computing sin(2π f t) from an absolute time, the oscillator keeps
a running phase in [0, 1) and advances it by f / sample_rate each sample:

    phase[n+1] = fract(phase[n] + f / sr)
    out[n]     = sin(2π · phase[n])

Retuning only changes the increment, so the waveform stays continuous across
frequency changes (no phase jump, no click).

Nyquist
-------

A sine above sample_rate / 2 cannot be represented and folds back down as an
alias. Upper rungs of a 12-octave ladder routinely land there, so the block
renderer emits silence for them instead.
*/

#[derive(Debug, Clone, Copy)]
pub struct SineOscillator {
    frequency: f32,
    phase: f32,     // normalized, 0.0..1.0
    increment: f32, // phase advance per sample
    sample_rate: f32,
}

impl SineOscillator {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            frequency: 0.0,
            phase: 0.0,
            increment: 0.0,
            sample_rate,
        }
    }

    pub fn set_frequency(&mut self, hz: f32) {
        self.frequency = hz;
        self.increment = hz / self.sample_rate;
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Restart the waveform from zero phase.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Whether the current frequency can be rendered without aliasing.
    #[inline]
    pub fn is_audible(&self) -> bool {
        self.frequency > 0.0 && self.frequency < self.sample_rate * 0.5
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let sample = (TAU * self.phase).sin();
        self.phase += self.increment;
        self.phase -= self.phase.floor();
        sample
    }

    /// Add `gain`-scaled output into `out` (mixing, not overwriting).
    pub fn render_add(&mut self, out: &mut [f32], gain: f32) {
        if !self.is_audible() {
            // Keep phase moving so a later retune stays continuous
            self.phase += self.increment * out.len() as f32;
            self.phase -= self.phase.floor();
            return;
        }

        for sample in out.iter_mut() {
            *sample += self.next_sample() * gain;
        }
    }
}
