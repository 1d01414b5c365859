// Purpose: audio-thread side of the software backend
// The bank owns the voices; the control side only ever talks to it through messages

pub mod bank;
pub mod message;

pub use bank::OscillatorBank;
pub use message::{BankMessage, GainId, MessageReceiver, MessageSender, OscillatorId};
