// Chord palette - Slots and the strummer that plays them

pub mod slot;
pub mod strummer;

pub use slot::{ChordBank, ChordSlot, CHORD_SLOT_COUNT};
pub use strummer::{
    ChordStrummer, PaceUnit, StrumPace, StrumSchedule, StrumStep, TriggerId, TriggerMode,
    TAP_HOLD_SECONDS,
};
