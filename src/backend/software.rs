use std::{collections::HashMap, time::Duration};

use tracing::warn;

use crate::{
    backend::{GainStages, Oscillators, Scheduler},
    error::BackendError,
    synth::{
        bank::MAX_GAIN_STAGES,
        message::{BankMessage, MessageSender},
    },
};

pub use crate::synth::message::{GainId, OscillatorId};

/// The single output sink of a software backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorState {
    Created, // Tuned/connected, not yet started
    Started, // Sounding (or scheduled to)
}

/// Control-side view of one oscillator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorInfo {
    pub frequency: f32,
    pub target: Option<GainId>,
    pub state: OscillatorState,
}

#[derive(Debug, Clone, Copy)]
struct GainEntry {
    id: GainId,
    value: f32,
}

fn forward<Tx: MessageSender>(tx: &mut Tx, message: BankMessage) -> Result<(), BackendError> {
    tx.send(message).inspect_err(|err| warn!(?message, "bank message dropped: {err}"))
}

/// Software implementation of the backend capabilities.
///
/// Keeps the authoritative node state on the control side and forwards every
/// audible change to an oscillator bank through `Tx`: directly when `Tx` is
/// the bank itself (offline), or through a lock-free ring when the bank lives
/// in an audio callback. Stopped oscillators are retired from the arena, so
/// its size tracks the live set rather than the total ever created.
pub struct SoftwareBackend<S, Tx> {
    scheduler: S,
    tx: Tx,
    sample_rate: f32,
    next_node: u32,
    sink_claimed: bool,
    gains: Vec<GainEntry>,
    oscillators: HashMap<OscillatorId, OscillatorInfo>,
    peak_live: usize,
}

impl<S: Scheduler, Tx: MessageSender> SoftwareBackend<S, Tx> {
    pub fn new(scheduler: S, tx: Tx, sample_rate: f32) -> Self {
        Self {
            scheduler,
            tx,
            sample_rate,
            next_node: 0,
            sink_claimed: false,
            gains: Vec::new(),
            oscillators: HashMap::new(),
            peak_live: 0,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn sender(&self) -> &Tx {
        &self.tx
    }

    pub fn sender_mut(&mut self) -> &mut Tx {
        &mut self.tx
    }

    pub fn oscillator(&self, id: OscillatorId) -> Option<&OscillatorInfo> {
        self.oscillators.get(&id)
    }

    /// Oscillators started and not yet stopped.
    pub fn live_oscillators(&self) -> usize {
        self.oscillators
            .values()
            .filter(|info| info.state == OscillatorState::Started)
            .count()
    }

    /// Highest number of simultaneously live oscillators seen so far.
    pub fn peak_live_oscillators(&self) -> usize {
        self.peak_live
    }

    /// Gain stages and oscillators ever created by this backend.
    pub fn nodes_created(&self) -> u32 {
        self.next_node
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_node;
        self.next_node += 1;
        id
    }

    fn frames(&self, offset: Duration) -> u32 {
        (offset.as_secs_f64() * self.sample_rate as f64).round() as u32
    }

    fn entry(&mut self, id: OscillatorId) -> Result<&mut OscillatorInfo, BackendError> {
        self.oscillators
            .get_mut(&id)
            .ok_or(BackendError::UnknownNode(id.0))
    }

    fn gain_entry(&self, gain: GainId) -> Option<&GainEntry> {
        self.gains.iter().find(|g| g.id == gain)
    }
}

impl<S: Scheduler, Tx: MessageSender> GainStages for SoftwareBackend<S, Tx> {
    type Sink = SinkId;
    type Gain = GainId;

    fn output_sink(&mut self) -> Result<SinkId, BackendError> {
        if self.sink_claimed {
            return Err(BackendError::SinkClaimed);
        }
        self.sink_claimed = true;
        Ok(SinkId)
    }

    fn create_gain(&mut self) -> Result<GainId, BackendError> {
        if self.gains.len() >= MAX_GAIN_STAGES {
            return Err(BackendError::TooManyGainStages(MAX_GAIN_STAGES));
        }
        let id = GainId(self.allocate());
        forward(&mut self.tx, BankMessage::SetGain {
            gain: id,
            value: 1.0,
        })?;
        self.gains.push(GainEntry { id, value: 1.0 });
        Ok(id)
    }

    fn connect_gain(&mut self, gain: &GainId, _sink: &SinkId) -> Result<(), BackendError> {
        if self.gain_entry(*gain).is_none() {
            return Err(BackendError::UnknownNode(gain.0));
        }
        forward(&mut self.tx, BankMessage::RouteGain {
            gain: *gain,
            routed: true,
        })
    }

    fn set_gain(&mut self, gain: &GainId, value: f32) -> Result<(), BackendError> {
        let entry = self
            .gains
            .iter_mut()
            .find(|g| g.id == *gain)
            .ok_or(BackendError::UnknownNode(gain.0))?;
        entry.value = value;
        forward(&mut self.tx, BankMessage::SetGain { gain: *gain, value })
    }

    fn gain(&self, gain: &GainId) -> f32 {
        self.gain_entry(*gain).map_or(0.0, |g| g.value)
    }
}

impl<S: Scheduler, Tx: MessageSender> Oscillators for SoftwareBackend<S, Tx> {
    type Oscillator = OscillatorId;
    type Target = GainId;

    fn create_oscillator(&mut self) -> Result<OscillatorId, BackendError> {
        let id = OscillatorId(self.allocate());
        self.oscillators.insert(
            id,
            OscillatorInfo {
                frequency: 440.0,
                target: None,
                state: OscillatorState::Created,
            },
        );
        Ok(id)
    }

    fn set_frequency(&mut self, oscillator: &OscillatorId, hz: f32) -> Result<(), BackendError> {
        let info = self
            .oscillators
            .get_mut(oscillator)
            .ok_or(BackendError::UnknownNode(oscillator.0))?;
        info.frequency = hz;
        if info.state == OscillatorState::Started {
            forward(&mut self.tx, BankMessage::SetFrequency {
                id: *oscillator,
                frequency: hz,
            })?;
        }
        Ok(())
    }

    fn connect_oscillator(
        &mut self,
        oscillator: &OscillatorId,
        target: &GainId,
    ) -> Result<(), BackendError> {
        if self.gain_entry(*target).is_none() {
            return Err(BackendError::UnknownNode(target.0));
        }
        let info = self
            .oscillators
            .get_mut(oscillator)
            .ok_or(BackendError::UnknownNode(oscillator.0))?;
        info.target = Some(*target);
        if info.state == OscillatorState::Started {
            forward(&mut self.tx, BankMessage::Route {
                id: *oscillator,
                gain: *target,
            })?;
        }
        Ok(())
    }

    fn start(&mut self, oscillator: &OscillatorId, offset: Duration) -> Result<(), BackendError> {
        let delay_frames = self.frames(offset);
        let info = *self.entry(*oscillator)?;
        if info.state == OscillatorState::Started {
            return Err(BackendError::AlreadyStarted(oscillator.0));
        }

        forward(&mut self.tx, BankMessage::Start {
            id: *oscillator,
            frequency: info.frequency,
            gain: info.target,
            delay_frames,
        })?;
        self.entry(*oscillator)?.state = OscillatorState::Started;
        self.peak_live = self.peak_live.max(self.live_oscillators());
        Ok(())
    }

    fn stop(&mut self, oscillator: &OscillatorId, offset: Duration) -> Result<(), BackendError> {
        let Some(info) = self.oscillators.get(oscillator).copied() else {
            // Retired earlier: stopping again is a no-op
            return if oscillator.0 < self.next_node {
                Ok(())
            } else {
                Err(BackendError::UnknownNode(oscillator.0))
            };
        };

        if info.state == OscillatorState::Started {
            let delay_frames = self.frames(offset);
            forward(&mut self.tx, BankMessage::Stop {
                id: *oscillator,
                delay_frames,
            })?;
        }
        self.oscillators.remove(oscillator);
        Ok(())
    }
}

impl<S: Scheduler, Tx> Scheduler for SoftwareBackend<S, Tx> {
    type Timer = S::Timer;

    fn schedule_after(&mut self, delay: Duration) -> Result<S::Timer, BackendError> {
        self.scheduler.schedule_after(delay)
    }

    fn cancel(&mut self, timer: S::Timer) {
        self.scheduler.cancel(timer)
    }

    fn pop_due(&mut self) -> Option<S::Timer> {
        self.scheduler.pop_due()
    }

    fn time_until_next(&self) -> Option<Duration> {
        self.scheduler.time_until_next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{engine::scheduler::ManualScheduler, synth::OscillatorBank};

    fn backend() -> SoftwareBackend<ManualScheduler, OscillatorBank> {
        SoftwareBackend::new(ManualScheduler::new(), OscillatorBank::new(48_000.0, 8), 48_000.0)
    }

    #[test]
    fn sink_can_only_be_claimed_once() {
        let mut backend = backend();
        assert!(backend.output_sink().is_ok());
        assert_eq!(backend.output_sink(), Err(BackendError::SinkClaimed));
    }

    #[test]
    fn gain_defaults_to_unity_and_reads_back() {
        let mut backend = backend();
        let gain = backend.create_gain().unwrap();
        assert_eq!(backend.gain(&gain), 1.0);

        backend.set_gain(&gain, 0.25).unwrap();
        assert_eq!(backend.gain(&gain), 0.25);
        assert_eq!(backend.sender().gain(gain), Some(0.25));
    }

    #[test]
    fn start_forwards_tuning_and_routing_to_bank() {
        let mut backend = backend();
        let gain = backend.create_gain().unwrap();
        let osc = backend.create_oscillator().unwrap();
        backend.set_frequency(&osc, 220.0).unwrap();
        backend.connect_oscillator(&osc, &gain).unwrap();

        // Nothing reaches the bank before start
        assert_eq!(backend.sender().active_voices(), 0);

        backend.start(&osc, Duration::ZERO).unwrap();
        assert_eq!(backend.live_oscillators(), 1);
        assert_eq!(backend.sender().sounding_frequencies().collect::<Vec<_>>(), vec![220.0]);
        assert_eq!(
            backend.oscillator(osc).map(|info| info.target),
            Some(Some(gain))
        );
    }

    #[test]
    fn oscillators_start_only_once() {
        let mut backend = backend();
        let osc = backend.create_oscillator().unwrap();
        backend.start(&osc, Duration::ZERO).unwrap();
        assert_eq!(
            backend.start(&osc, Duration::ZERO),
            Err(BackendError::AlreadyStarted(osc.0))
        );
    }

    #[test]
    fn stop_is_idempotent() {
        let mut backend = backend();
        let osc = backend.create_oscillator().unwrap();
        backend.start(&osc, Duration::ZERO).unwrap();

        backend.stop(&osc, Duration::ZERO).unwrap();
        backend.stop(&osc, Duration::ZERO).unwrap();
        assert_eq!(backend.live_oscillators(), 0);
        assert_eq!(backend.sender().active_voices(), 0);
        assert!(backend.oscillator(osc).is_none());
    }

    #[test]
    fn stopping_unknown_ids_fails() {
        let mut backend = backend();
        assert_eq!(
            backend.stop(&OscillatorId(42), Duration::ZERO),
            Err(BackendError::UnknownNode(42))
        );
    }

    #[test]
    fn offsets_become_frame_delays() {
        let mut backend = backend();
        let gain = backend.create_gain().unwrap();
        let osc = backend.create_oscillator().unwrap();
        backend.connect_oscillator(&osc, &gain).unwrap();
        backend.start(&osc, Duration::from_millis(10)).unwrap();

        // 10 ms at 48 kHz: pending, not yet sounding
        assert_eq!(backend.sender().active_voices(), 1);
        assert_eq!(backend.sender().sounding_frequencies().count(), 0);
    }
}
