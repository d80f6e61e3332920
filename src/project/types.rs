// Types for chord palette persistence
// Plain records handed to the storage layer; no I/O happens here

use serde::{Deserialize, Serialize};

/// Format version written with every saved chord bank
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormatVersion {
    pub major: u32,
    pub minor: u32,
}

impl FormatVersion {
    pub fn current() -> Self {
        Self { major: 1, minor: 0 }
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// One key of a saved chord
///
/// The note name and octave are stored next to the grid coordinate so that
/// a saved chord stays readable even if the grid layout changes later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordKeyRecord {
    pub x: u16,
    pub y: u16,
    pub note_name: String,
    pub octave: i8,
}

/// A saved chord slot: `{ name, keys: [{ x, y, noteName, octave }] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordSlotRecord {
    pub name: String,
    pub keys: Vec<ChordKeyRecord>,
}

/// The whole chord palette; empty slots are `None`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordBankRecord {
    #[serde(default)]
    pub version: FormatVersion,
    pub slots: Vec<Option<ChordSlotRecord>>,
}
