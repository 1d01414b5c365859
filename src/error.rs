use std::time::Duration;

/// Failures reported by an audio backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// The node id was never handed out by this backend
    #[error("unknown audio node #{0}")]
    UnknownNode(u32),

    /// Oscillators are one-shot: once started they can only be stopped
    #[error("oscillator #{0} was already started")]
    AlreadyStarted(u32),

    /// The output sink can only be claimed once per backend
    #[error("output sink was already claimed")]
    SinkClaimed,

    /// The control queue to the audio thread has no room left
    #[error("control queue to the audio thread is full")]
    QueueFull,

    /// The oscillator bank only mixes a fixed number of gain stages
    #[error("gain stage limit of {0} reached")]
    TooManyGainStages(usize),

    /// Host audio device failure (device lookup, stream build, playback)
    #[error("audio device error: {0}")]
    Device(String),
}

/// Errors surfaced by [`ToneEngine`](crate::engine::ToneEngine).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToneError {
    #[error("step count must be an integer greater than one, got {0}")]
    InvalidStepCount(usize),

    #[error("minimum frequency must be a positive, finite number of hertz, got {0}")]
    InvalidMinimumFrequency(f32),

    #[error("maximum frequency {maximum} Hz must be finite and not below the minimum of {minimum} Hz")]
    InvalidFrequencyRange { minimum: f32, maximum: f32 },

    #[error("loop duration {duration:?} is too short to split into {step_count} steps")]
    InvalidLoopDuration {
        duration: Duration,
        step_count: usize,
    },

    #[error("{step_count} octaves above {minimum} Hz overflow the frequency range")]
    LadderOverflow { minimum: f32, step_count: usize },

    #[error(transparent)]
    Backend(#[from] BackendError),
}
