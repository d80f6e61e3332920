// Chord palette persistence records
// Serializable plain records; reading and writing storage is the caller's job

pub mod serialization;
pub mod types;

pub use serialization::{bank_from_json, bank_to_json, slot_from_json, slot_to_json};
pub use types::{ChordBankRecord, ChordKeyRecord, ChordSlotRecord, FormatVersion};

/// Persistence error types
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported chord bank format version {0}")]
    UnsupportedVersion(String),
}
