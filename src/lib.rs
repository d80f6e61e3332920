// Chordgrid - Loop recorder and chord strummer for an isomorphic note grid

pub mod audio;
pub mod chord;
pub mod config;
pub mod grid;
pub mod messaging;
pub mod project;
pub mod sequencer;

// Re-export commonly used types for convenience
pub use audio::clock::{AudioClock, ClockSource, ManualClock, SystemClock};
pub use audio::engine::{AudioOutput, AudioVoicePort};
pub use audio::voice_port::{ClickType, LogVoicePort, VoiceError, VoicePort};
pub use chord::{ChordBank, ChordSlot, StrumPace, TriggerId, TriggerMode};
pub use config::{ConfigError, EngineConfig};
pub use grid::GridLayout;
pub use messaging::channels::create_command_channel;
pub use project::{ChordBankRecord, ChordSlotRecord, ProjectError};
pub use sequencer::{
    EngineError, EngineResult, EngineSnapshot, GridKey, PlaybackEngine, RecordedNote,
    TempoConfig, TickOutcome, TransportState,
};
