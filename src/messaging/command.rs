// Voice commands - Control loop → audio callback

use crate::audio::voice_port::ClickType;

/// Identifier of one sounding voice, assigned by the control side
pub type VoiceId = u64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceCommand {
    NoteOn { id: VoiceId, frequency: f32 },
    NoteOff { id: VoiceId },
    Click(ClickType),
    AllNotesOff,
}
