use crate::{
    dsp::{gain::apply_gain, SineOscillator},
    error::BackendError,
    synth::message::{BankMessage, GainId, MessageReceiver, MessageSender, OscillatorId},
    MAX_BLOCK_SIZE,
};

/// Maximum number of gain stages the bank mixes.
pub const MAX_GAIN_STAGES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,     // Available for allocation
    Pending,  // Started with a delay, not yet sounding
    Sounding, // Producing output (if routed and audible)
}

#[derive(Debug, Clone, Copy)]
struct Voice {
    id: Option<OscillatorId>,
    state: VoiceState,
    osc: SineOscillator,
    gain: Option<GainId>,
    start_in: u32,         // frames until Pending -> Sounding
    stop_in: Option<u32>,  // frames until Sounding -> Free
}

impl Voice {
    fn new(sample_rate: f32) -> Self {
        Self {
            id: None,
            state: VoiceState::Free,
            osc: SineOscillator::new(sample_rate),
            gain: None,
            start_in: 0,
            stop_in: None,
        }
    }

    fn free(&mut self) {
        self.id = None;
        self.state = VoiceState::Free;
        self.gain = None;
        self.stop_in = None;
    }

    /// Frames of `len` this voice should render, after consuming its
    /// start/stop countdowns. Returns `(skip, frames)`.
    fn advance(&mut self, len: usize) -> (usize, usize) {
        let mut skip = 0;
        if self.state == VoiceState::Pending {
            let wait = (self.start_in as usize).min(len);
            self.start_in -= wait as u32;
            if self.start_in > 0 {
                return (len, 0);
            }
            self.state = VoiceState::Sounding;
            skip = wait;
        }

        let mut frames = len - skip;
        if let Some(stop_in) = self.stop_in {
            let remaining = (stop_in as usize).min(frames);
            self.stop_in = Some(stop_in - remaining as u32);
            frames = remaining;
        }
        (skip, frames)
    }
}

#[derive(Debug, Clone, Copy)]
struct GainSlot {
    id: GainId,
    value: f32,
    routed: bool,
}

/// Audio-thread side of the software backend.
///
/// Owns a fixed pool of sine voices allocated up front; handling messages and
/// rendering never allocate. Each block is mixed per gain stage: voices routed
/// to the same stage are summed into a scratch buffer, scaled by the stage
/// gain, then added to the output. Only stages routed to the sink are heard.
pub struct OscillatorBank {
    sample_rate: f32,
    voices: Vec<Voice>,
    gains: Vec<GainSlot>,
    scratch: Vec<f32>,
    dropped: u32,
}

impl OscillatorBank {
    pub fn new(sample_rate: f32, voice_capacity: usize) -> Self {
        Self {
            sample_rate,
            voices: vec![Voice::new(sample_rate); voice_capacity],
            gains: Vec::with_capacity(MAX_GAIN_STAGES),
            scratch: vec![0.0; MAX_BLOCK_SIZE],
            dropped: 0,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn voice_capacity(&self) -> usize {
        self.voices.len()
    }

    /// Voices that are pending or sounding.
    pub fn active_voices(&self) -> usize {
        self.voices
            .iter()
            .filter(|v| v.state != VoiceState::Free)
            .count()
    }

    /// Frequencies of sounding voices, in voice order.
    pub fn sounding_frequencies(&self) -> impl Iterator<Item = f32> + '_ {
        self.voices
            .iter()
            .filter(|v| v.state == VoiceState::Sounding)
            .map(|v| v.osc.frequency())
    }

    /// Start messages rejected because every voice was busy.
    pub fn dropped_starts(&self) -> u32 {
        self.dropped
    }

    pub fn gain(&self, gain: GainId) -> Option<f32> {
        self.gains.iter().find(|g| g.id == gain).map(|g| g.value)
    }

    /// Apply every queued control message.
    pub fn drain<R: MessageReceiver>(&mut self, rx: &mut R) {
        while let Some(message) = rx.pop() {
            self.apply(message);
        }
    }

    pub fn apply(&mut self, message: BankMessage) {
        match message {
            BankMessage::Start {
                id,
                frequency,
                gain,
                delay_frames,
            } => {
                let Some(voice) = self.voices.iter_mut().find(|v| v.state == VoiceState::Free)
                else {
                    self.dropped = self.dropped.saturating_add(1);
                    return;
                };
                voice.id = Some(id);
                voice.gain = gain;
                voice.osc.reset();
                voice.osc.set_frequency(frequency);
                voice.start_in = delay_frames;
                voice.stop_in = None;
                voice.state = if delay_frames == 0 {
                    VoiceState::Sounding
                } else {
                    VoiceState::Pending
                };
            }
            BankMessage::SetFrequency { id, frequency } => {
                if let Some(voice) = self.find_voice(id) {
                    voice.osc.set_frequency(frequency);
                }
            }
            BankMessage::Route { id, gain } => {
                if let Some(voice) = self.find_voice(id) {
                    voice.gain = Some(gain);
                }
            }
            BankMessage::Stop { id, delay_frames } => {
                if let Some(voice) = self.find_voice(id) {
                    let pending = if voice.state == VoiceState::Pending {
                        voice.start_in
                    } else {
                        0
                    };
                    if delay_frames <= pending {
                        // Stop lands before the start point: never sounds
                        voice.free();
                    } else {
                        // Countdown runs from the moment the voice starts sounding
                        voice.stop_in = Some(delay_frames - pending);
                    }
                }
            }
            BankMessage::SetGain { gain, value } => {
                if let Some(slot) = self.gains.iter_mut().find(|g| g.id == gain) {
                    slot.value = value;
                } else if self.gains.len() < MAX_GAIN_STAGES {
                    self.gains.push(GainSlot {
                        id: gain,
                        value,
                        routed: false,
                    });
                }
            }
            BankMessage::RouteGain { gain, routed } => {
                if let Some(slot) = self.gains.iter_mut().find(|g| g.id == gain) {
                    slot.routed = routed;
                }
            }
        }
    }

    fn find_voice(&mut self, id: OscillatorId) -> Option<&mut Voice> {
        self.voices
            .iter_mut()
            .find(|v| v.id == Some(id) && v.state != VoiceState::Free)
    }

    /// Render one mono block. `out` is overwritten.
    pub fn render_block(&mut self, out: &mut [f32]) {
        debug_assert!(out.len() <= MAX_BLOCK_SIZE);
        out.fill(0.0);

        let len = out.len();
        for g in 0..self.gains.len() {
            let GainSlot { id, value, routed } = self.gains[g];
            let scratch = &mut self.scratch[..len];
            scratch.fill(0.0);

            for voice in self
                .voices
                .iter_mut()
                .filter(|v| v.state != VoiceState::Free && v.gain == Some(id))
            {
                let (skip, frames) = voice.advance(len);
                if frames > 0 {
                    voice.osc.render_add(&mut scratch[skip..skip + frames], 1.0);
                }
                if voice.stop_in == Some(0) {
                    voice.free();
                }
            }

            if routed {
                apply_gain(scratch, value);
                for (o, s) in out.iter_mut().zip(scratch.iter()) {
                    *o += s;
                }
            }
        }

        // Voices with no (known) gain stage are silent but still keep time
        let known = &self.gains;
        for voice in self.voices.iter_mut().filter(|v| {
            v.state != VoiceState::Free && !v.gain.is_some_and(|id| known.iter().any(|g| g.id == id))
        }) {
            voice.advance(len);
            if voice.stop_in == Some(0) {
                voice.free();
            }
        }
    }
}

impl MessageSender for OscillatorBank {
    fn send(&mut self, message: BankMessage) -> Result<(), BackendError> {
        self.apply(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    fn bank_with_gain(value: f32) -> OscillatorBank {
        let mut bank = OscillatorBank::new(SR, 4);
        bank.apply(BankMessage::SetGain {
            gain: GainId(0),
            value,
        });
        bank.apply(BankMessage::RouteGain {
            gain: GainId(0),
            routed: true,
        });
        bank
    }

    fn start(bank: &mut OscillatorBank, id: u32, frequency: f32, delay_frames: u32) {
        bank.apply(BankMessage::Start {
            id: OscillatorId(id),
            frequency,
            gain: Some(GainId(0)),
            delay_frames,
        });
    }

    fn peak(buffer: &[f32]) -> f32 {
        buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    #[test]
    fn renders_routed_voice_scaled_by_gain() {
        let mut bank = bank_with_gain(0.5);
        start(&mut bank, 1, 1_000.0, 0);

        let mut out = vec![0.0; 256];
        bank.render_block(&mut out);
        let level = peak(&out);
        assert!(level > 0.45 && level <= 0.5 + 1e-6, "peak {level}");
    }

    #[test]
    fn unrouted_gain_is_silent() {
        let mut bank = bank_with_gain(1.0);
        bank.apply(BankMessage::RouteGain {
            gain: GainId(0),
            routed: false,
        });
        start(&mut bank, 1, 1_000.0, 0);

        let mut out = vec![0.0; 128];
        bank.render_block(&mut out);
        assert_eq!(peak(&out), 0.0);
        assert_eq!(bank.active_voices(), 1);
    }

    #[test]
    fn stop_frees_voice_immediately() {
        let mut bank = bank_with_gain(1.0);
        start(&mut bank, 1, 1_000.0, 0);
        bank.apply(BankMessage::Stop {
            id: OscillatorId(1),
            delay_frames: 0,
        });
        assert_eq!(bank.active_voices(), 0);

        let mut out = vec![0.0; 128];
        bank.render_block(&mut out);
        assert_eq!(peak(&out), 0.0);
    }

    #[test]
    fn delayed_start_and_stop_are_sample_accurate() {
        let mut bank = bank_with_gain(1.0);
        start(&mut bank, 1, 1_000.0, 32);

        let mut out = vec![0.0; 64];
        bank.render_block(&mut out);
        assert!(out[..32].iter().all(|&s| s == 0.0));
        assert!(peak(&out[32..]) > 0.0);

        bank.apply(BankMessage::Stop {
            id: OscillatorId(1),
            delay_frames: 16,
        });
        bank.render_block(&mut out);
        assert!(peak(&out[..16]) > 0.0);
        assert!(out[16..].iter().all(|&s| s == 0.0));
        assert_eq!(bank.active_voices(), 0);
    }

    #[test]
    fn full_bank_drops_starts() {
        let mut bank = bank_with_gain(1.0);
        for id in 0..5 {
            start(&mut bank, id, 100.0 * (id + 1) as f32, 0);
        }
        assert_eq!(bank.active_voices(), 4);
        assert_eq!(bank.dropped_starts(), 1);
    }

    #[test]
    fn retune_applies_to_sounding_voice() {
        let mut bank = bank_with_gain(1.0);
        start(&mut bank, 7, 220.0, 0);
        bank.apply(BankMessage::SetFrequency {
            id: OscillatorId(7),
            frequency: 440.0,
        });
        assert_eq!(bank.sounding_frequencies().collect::<Vec<_>>(), vec![440.0]);
    }
}
