//! Construction parameters for a [`ToneEngine`](crate::engine::ToneEngine).

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ToneError;

/// Which way the illusion appears to move.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Step phase advances 0, 1, 2, ... (endless rise)
    #[default]
    Ascending,
    /// Step phase walks backwards n-1, n-2, ... (endless fall)
    Descending,
}

impl Direction {
    /// Next phase after `step` in a loop of `step_count` positions.
    #[inline]
    pub fn advance(self, step: usize, step_count: usize) -> usize {
        match self {
            Direction::Ascending => (step + 1) % step_count,
            Direction::Descending => (step + step_count - 1) % step_count,
        }
    }
}

/// Tone parameters. Defaults describe a 12-step, 5 second loop starting at 10 Hz.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneConfig {
    /// Lowest rung of the ladder (Hz)
    pub minimum_frequency: f32,
    /// Upper end of the audible design range (Hz). Informational only.
    pub maximum_frequency: f32,
    /// Oscillator slots in the bank, also the pitch positions per loop
    pub step_count: usize,
    /// Wall-clock time for one full octave sweep
    pub loop_duration: Duration,
    pub direction: Direction,
}

impl ToneConfig {
    pub const DEFAULT_MINIMUM_FREQUENCY: f32 = 10.0;
    pub const DEFAULT_MAXIMUM_FREQUENCY: f32 = 22_050.0;
    pub const DEFAULT_STEP_COUNT: usize = 12;
    pub const DEFAULT_LOOP_DURATION: Duration = Duration::from_millis(5_000);

    pub fn new() -> Self {
        Self {
            minimum_frequency: Self::DEFAULT_MINIMUM_FREQUENCY,
            maximum_frequency: Self::DEFAULT_MAXIMUM_FREQUENCY,
            step_count: Self::DEFAULT_STEP_COUNT,
            loop_duration: Self::DEFAULT_LOOP_DURATION,
            direction: Direction::Ascending,
        }
    }

    pub fn minimum_frequency(mut self, hz: f32) -> Self {
        self.minimum_frequency = hz;
        self
    }

    pub fn maximum_frequency(mut self, hz: f32) -> Self {
        self.maximum_frequency = hz;
        self
    }

    pub fn step_count(mut self, steps: usize) -> Self {
        self.step_count = steps;
        self
    }

    pub fn loop_duration(mut self, duration: Duration) -> Self {
        self.loop_duration = duration;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Time between two ticks: `loop_duration / step_count`.
    pub fn tick_interval(&self) -> Duration {
        let steps = u32::try_from(self.step_count.max(1)).unwrap_or(u32::MAX);
        self.loop_duration / steps
    }

    /// Reject parameters that would produce undefined tick behaviour.
    pub fn validate(&self) -> Result<(), ToneError> {
        if self.step_count <= 1 {
            return Err(ToneError::InvalidStepCount(self.step_count));
        }

        if !self.minimum_frequency.is_finite() || self.minimum_frequency <= 0.0 {
            return Err(ToneError::InvalidMinimumFrequency(self.minimum_frequency));
        }

        if !self.maximum_frequency.is_finite() || self.maximum_frequency < self.minimum_frequency {
            return Err(ToneError::InvalidFrequencyRange {
                minimum: self.minimum_frequency,
                maximum: self.maximum_frequency,
            });
        }

        if self.tick_interval().is_zero() {
            return Err(ToneError::InvalidLoopDuration {
                duration: self.loop_duration,
                step_count: self.step_count,
            });
        }

        Ok(())
    }
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self::new()
    }
}
