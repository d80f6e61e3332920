// Note representation for the sequencer
// A recorded note is a grid key with a start beat and a duration

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default length of a recorded note, in beats (one quarter-beat)
pub const DEFAULT_NOTE_BEATS: f64 = 0.25;

/// Playable position on the instrument grid
///
/// This is the pitch-key used throughout the engine: it identifies *where*
/// a note is played, not which musical note it currently resolves to
/// (see [`crate::grid::GridLayout`] for that mapping).
///
/// Ordering is by column first, then row, which is also the strum order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridKey {
    /// Column (left to right)
    pub x: u16,
    /// Row (bottom to top)
    pub y: u16,
}

impl GridKey {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for GridKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A note captured by the recorder
///
/// Notes are never mutated after creation; the recorder only appends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordedNote {
    pub key: GridKey,

    /// Start position in beats from the loop start
    pub start_beat: f64,

    /// Duration in beats
    pub duration: f64,
}

impl RecordedNote {
    pub fn new(key: GridKey, start_beat: f64, duration: f64) -> Self {
        Self {
            key,
            start_beat,
            duration,
        }
    }

    /// End of the note in beats (exclusive)
    pub fn end_beat(&self) -> f64 {
        self.start_beat + self.duration
    }

    /// Check if this note sounds at the given beat position
    ///
    /// The interval is half-open: `[start_beat, start_beat + duration)`.
    /// A zero-duration note therefore never sounds.
    pub fn contains_beat(&self, beat: f64) -> bool {
        beat >= self.start_beat && beat < self.end_beat()
    }
}
