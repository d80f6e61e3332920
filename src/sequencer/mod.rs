// Sequencer module
// Transport, note reconciliation, metronome, recording and the playback engine

pub mod engine;
pub mod metronome;
pub mod note;
pub mod player;
pub mod recorder;
pub mod scheduler;
pub mod timeline;
pub mod transport;

pub use engine::{EngineSnapshot, PlaybackEngine};
pub use note::{GridKey, RecordedNote, DEFAULT_NOTE_BEATS};
pub use player::{NoteReconciler, ReconcileReport};
pub use recorder::NoteRecorder;
pub use scheduler::{TaskId, TaskScheduler};
pub use timeline::TempoConfig;
pub use transport::{PlaybackState, TickOutcome, Transport, TransportState};

use crate::audio::voice_port::VoiceError;
use thiserror::Error;

/// Playback engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid tempo configuration: {0}")]
    InvalidTempo(String),

    #[error("Chord slot {index} out of range (palette has {count} slots)")]
    SlotOutOfRange { index: usize, count: usize },

    #[error("Chord slot {0} is empty")]
    EmptySlot(usize),

    #[error("Unknown chord trigger #{0}")]
    UnknownTrigger(u64),

    #[error("Voice error: {0}")]
    Voice(#[from] VoiceError),
}

pub type EngineResult<T> = Result<T, EngineError>;
