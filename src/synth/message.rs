#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer};

use crate::error::BackendError;

/// Identifies one oscillator for its whole (one-shot) life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OscillatorId(pub u32);

/// Identifies one gain stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GainId(pub u32);

/// Control messages from the control side to the oscillator bank.
///
/// Delays are in frames, counted from the start of the next rendered block.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum BankMessage {
    Start {
        id: OscillatorId,
        frequency: f32,
        gain: Option<GainId>,
        delay_frames: u32,
    },
    SetFrequency { id: OscillatorId, frequency: f32 },
    Route { id: OscillatorId, gain: GainId },
    Stop { id: OscillatorId, delay_frames: u32 },
    SetGain { gain: GainId, value: f32 },
    RouteGain { gain: GainId, routed: bool },
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<BankMessage>;
}

pub trait MessageSender {
    fn send(&mut self, message: BankMessage) -> Result<(), BackendError>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<BankMessage> {
    fn pop(&mut self) -> Option<BankMessage> {
        Consumer::pop(self).ok()
    }
}

#[cfg(feature = "rtrb")]
impl MessageSender for Producer<BankMessage> {
    fn send(&mut self, message: BankMessage) -> Result<(), BackendError> {
        self.push(message).map_err(|_| BackendError::QueueFull)
    }
}

#[cfg(all(test, feature = "rtrb"))]
mod tests {
    use super::*;
    use rtrb::RingBuffer;

    #[test]
    fn ring_reports_full_queue() {
        let (mut tx, mut rx) = RingBuffer::<BankMessage>::new(1);
        let msg = BankMessage::SetGain {
            gain: GainId(0),
            value: 0.5,
        };
        assert!(tx.send(msg).is_ok());
        assert_eq!(tx.send(msg), Err(BackendError::QueueFull));
        assert_eq!(MessageReceiver::pop(&mut rx), Some(msg));
        assert_eq!(MessageReceiver::pop(&mut rx), None);
    }
}
