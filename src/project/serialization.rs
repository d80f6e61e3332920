// Serialization utilities for chord palette persistence

use crate::project::ProjectError;
use crate::project::types::{ChordBankRecord, ChordSlotRecord, FormatVersion};

/// Serialize a chord bank to pretty JSON
pub fn bank_to_json(record: &ChordBankRecord) -> Result<String, ProjectError> {
    Ok(serde_json::to_string_pretty(record)?)
}

/// Deserialize a chord bank from JSON, checking the format version
pub fn bank_from_json(json_data: &str) -> Result<ChordBankRecord, ProjectError> {
    let record: ChordBankRecord = serde_json::from_str(json_data)?;
    if record.version.major != FormatVersion::current().major {
        return Err(ProjectError::UnsupportedVersion(record.version.to_string()));
    }
    Ok(record)
}

/// Serialize a single chord slot to JSON
pub fn slot_to_json(record: &ChordSlotRecord) -> Result<String, ProjectError> {
    Ok(serde_json::to_string(record)?)
}

/// Deserialize a single chord slot from JSON
pub fn slot_from_json(json_data: &str) -> Result<ChordSlotRecord, ProjectError> {
    Ok(serde_json::from_str(json_data)?)
}
