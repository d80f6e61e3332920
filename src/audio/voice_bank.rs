// Voice bank - Polyphonic sine voices and metronome clicks for the audio callback
// Pre-allocated; nothing here allocates once the bank is built

use std::f32::consts::PI;

use crate::audio::voice_port::ClickType;
use crate::messaging::command::{VoiceCommand, VoiceId};

const MAX_VOICES: usize = 16;

/// Attack ramp, long enough to avoid a click at note start
const ATTACK_MS: f32 = 5.0;
/// Fade-out after note off
const RELEASE_MS: f32 = 60.0;
const VOICE_GAIN: f32 = 0.2;

/// Pre-generated metronome clicks
#[derive(Debug, Clone)]
pub struct ClickSound {
    accent_samples: Vec<f32>,
    regular_samples: Vec<f32>,
}

impl ClickSound {
    const CLICK_DURATION_MS: f32 = 10.0;

    pub fn new(sample_rate: f32) -> Self {
        let click_samples = ((Self::CLICK_DURATION_MS / 1000.0) * sample_rate) as usize;

        Self {
            accent_samples: Self::generate_click(sample_rate, click_samples, 1200.0, 0.6),
            regular_samples: Self::generate_click(sample_rate, click_samples, 800.0, 0.4),
        }
    }

    /// Sine burst with a fast exponential decay
    fn generate_click(
        sample_rate: f32,
        num_samples: usize,
        frequency: f32,
        amplitude: f32,
    ) -> Vec<f32> {
        let phase_increment = 2.0 * PI * frequency / sample_rate;

        (0..num_samples)
            .map(|i| {
                let t = i as f32 / num_samples as f32;
                let envelope = (-t * 8.0).exp();
                (i as f32 * phase_increment).sin() * envelope * amplitude
            })
            .collect()
    }

    pub fn get_click(&self, click_type: ClickType) -> &[f32] {
        match click_type {
            ClickType::Accent => &self.accent_samples,
            ClickType::Regular => &self.regular_samples,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Idle,
    Attack,
    Sustain,
    Release,
}

#[derive(Debug, Clone, Copy)]
struct SineVoice {
    id: VoiceId,
    phase: f32,
    phase_increment: f32,
    level: f32,
    stage: Stage,
    age: u64,
}

impl SineVoice {
    const IDLE: SineVoice = SineVoice {
        id: 0,
        phase: 0.0,
        phase_increment: 0.0,
        level: 0.0,
        stage: Stage::Idle,
        age: 0,
    };

    fn is_active(&self) -> bool {
        self.stage != Stage::Idle
    }

    fn is_releasing(&self) -> bool {
        self.stage == Stage::Release
    }

    fn next_sample(&mut self, attack_step: f32, release_step: f32) -> f32 {
        match self.stage {
            Stage::Idle => return 0.0,
            Stage::Attack => {
                self.level += attack_step;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = Stage::Sustain;
                }
            }
            Stage::Sustain => {}
            Stage::Release => {
                self.level -= release_step;
                if self.level <= 0.0 {
                    *self = Self::IDLE;
                    return 0.0;
                }
            }
        }

        let sample = self.phase.sin() * self.level;
        self.phase = (self.phase + self.phase_increment) % (2.0 * PI);
        sample
    }
}

/// Everything the audio callback renders
pub struct VoiceBank {
    voices: [SineVoice; MAX_VOICES],
    sample_rate: f32,
    attack_step: f32,
    release_step: f32,
    age_counter: u64,
    clicks: ClickSound,
    /// Click being played and the read position in it
    click: Option<(ClickType, usize)>,
}

impl VoiceBank {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: [SineVoice::IDLE; MAX_VOICES],
            sample_rate,
            attack_step: 1.0 / (ATTACK_MS * 0.001 * sample_rate).max(1.0),
            release_step: 1.0 / (RELEASE_MS * 0.001 * sample_rate).max(1.0),
            age_counter: 0,
            clicks: ClickSound::new(sample_rate),
            click: None,
        }
    }

    pub fn handle(&mut self, command: VoiceCommand) {
        match command {
            VoiceCommand::NoteOn { id, frequency } => self.note_on(id, frequency),
            VoiceCommand::NoteOff { id } => self.note_off(id),
            VoiceCommand::Click(click_type) => self.click = Some((click_type, 0)),
            VoiceCommand::AllNotesOff => {
                for voice in self.voices.iter_mut().filter(|v| v.is_active()) {
                    voice.stage = Stage::Release;
                }
            }
        }
    }

    pub fn note_on(&mut self, id: VoiceId, frequency: f32) {
        self.age_counter = self.age_counter.wrapping_add(1);

        let index = self
            .voices
            .iter()
            .position(|v| !v.is_active())
            .unwrap_or_else(|| self.find_voice_to_steal());

        self.voices[index] = SineVoice {
            id,
            phase: 0.0,
            phase_increment: 2.0 * PI * frequency / self.sample_rate,
            level: 0.0,
            stage: Stage::Attack,
            age: self.age_counter,
        };
    }

    /// Releasing voices go first, then the oldest one
    fn find_voice_to_steal(&self) -> usize {
        self.voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| (!v.is_releasing(), v.age))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    pub fn note_off(&mut self, id: VoiceId) {
        for voice in &mut self.voices {
            if voice.is_active() && voice.id == id {
                voice.stage = Stage::Release;
            }
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        let (attack, release) = (self.attack_step, self.release_step);
        let voices: f32 = self
            .voices
            .iter_mut()
            .map(|v| v.next_sample(attack, release))
            .sum();

        let click = match self.click {
            Some((click_type, position)) => {
                let samples = self.clicks.get_click(click_type);
                match samples.get(position) {
                    Some(&sample) => {
                        self.click = Some((click_type, position + 1));
                        sample
                    }
                    None => {
                        self.click = None;
                        0.0
                    }
                }
            }
            None => 0.0,
        };

        voices * VOICE_GAIN + click
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn is_sounding(&self, id: VoiceId) -> bool {
        self.voices.iter().any(|v| v.is_active() && v.id == id)
    }
}
