use crate::error::ToneError;

/*
The Frequency Ladder
====================

With n slots and the loop phase at step k, slot i sounds at

    f(i, k) = f_min · 2^i · m^k        where m = 2^(1/n)

Across slots (fixed k) every rung is exactly one octave above the previous.
Across steps (fixed i) every tick multiplies the whole ladder by m, so n ticks
shift it by a full octave:

    f(i, n) = f_min · 2^i · 2 = f(i + 1, 0)

which is the unshifted ladder with every rung renamed to its upper
neighbour. Wrapping k back to 0 at that point is inaudible as a jump; the ear
only hears the steady climb.

Example, n = 2, f_min = 10 Hz, m ≈ 1.41421:
    k = 0  →  [10.000, 20.000]
    k = 1  →  [14.142, 28.284]
    (k = 2 would be [20, 40]: same rungs as k = 0, shifted up one)
*/

/// Octave-spaced frequency ladder for a bank of `step_count` slots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepLadder {
    minimum_frequency: f32,
    step_count: usize,
    multiplier: f32,
}

impl StepLadder {
    pub fn new(minimum_frequency: f32, step_count: usize) -> Result<Self, ToneError> {
        if step_count <= 1 {
            return Err(ToneError::InvalidStepCount(step_count));
        }
        if !minimum_frequency.is_finite() || minimum_frequency <= 0.0 {
            return Err(ToneError::InvalidMinimumFrequency(minimum_frequency));
        }

        let ladder = Self {
            minimum_frequency,
            step_count,
            multiplier: 2.0_f32.powf(1.0 / step_count as f32),
        };

        // Highest frequency the loop ever reaches: top slot, last step
        if !ladder.frequency(step_count - 1, step_count - 1).is_finite() {
            return Err(ToneError::LadderOverflow {
                minimum: minimum_frequency,
                step_count,
            });
        }

        Ok(ladder)
    }

    /// Per-step ratio; `step_count` steps make one octave.
    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn minimum_frequency(&self) -> f32 {
        self.minimum_frequency
    }

    /// Frequency of `slot` while the loop phase is `step`.
    pub fn frequency(&self, slot: usize, step: usize) -> f32 {
        self.minimum_frequency * 2.0_f32.powi(slot as i32) * self.multiplier.powi(step as i32)
    }

    /// All slot frequencies at `step`, lowest slot first.
    pub fn frequencies(&self, step: usize) -> Rungs {
        Rungs {
            base: self.minimum_frequency,
            offset: self.multiplier.powi(step as i32),
            remaining: self.step_count,
        }
    }
}

/// Iterator over one ladder, doubling the base frequency per slot.
#[derive(Debug, Clone)]
pub struct Rungs {
    base: f32,
    offset: f32,
    remaining: usize,
}

impl Iterator for Rungs {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let frequency = self.base * self.offset;
        self.base *= 2.0;
        Some(frequency)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Rungs {}
