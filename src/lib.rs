pub mod backend; // Audio backend capabilities and implementations
pub mod config;
pub mod dsp;
pub mod engine; // Shepard tone engine: ladder, slots, scheduling
pub mod error;
pub mod synth; // Audio-thread oscillator bank

pub use config::{Direction, ToneConfig};
pub use engine::ToneEngine;
pub use error::{BackendError, ToneError};

pub const MAX_BLOCK_SIZE: usize = 2048;
