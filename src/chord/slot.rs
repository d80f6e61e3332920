// Chord slots - The chord palette
// A fixed number of named slots, each an ordered set of grid keys

use crate::grid::GridLayout;
use crate::project::types::{ChordBankRecord, ChordKeyRecord, ChordSlotRecord, FormatVersion};
use crate::sequencer::note::GridKey;
use crate::sequencer::{EngineError, EngineResult};

/// Number of chord slots in the palette
pub const CHORD_SLOT_COUNT: usize = 8;

/// A named chord: grid keys in the order they were added
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordSlot {
    pub name: String,
    keys: Vec<GridKey>,
}

impl ChordSlot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: Vec::new(),
        }
    }

    /// Keys in insertion order
    pub fn keys(&self) -> &[GridKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: GridKey) -> bool {
        self.keys.contains(&key)
    }

    /// Add the key, or remove it if already present
    ///
    /// Returns `true` when the key was added.
    pub fn toggle_key(&mut self, key: GridKey) -> bool {
        if let Some(index) = self.keys.iter().position(|k| *k == key) {
            self.keys.remove(index);
            false
        } else {
            self.keys.push(key);
            true
        }
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Keys in left-to-right playing order (x, then y)
    pub fn strum_order(&self) -> Vec<GridKey> {
        let mut keys = self.keys.clone();
        keys.sort();
        keys
    }

    /// Build the persistence record, resolving note names with `layout`
    pub fn to_record(&self, layout: &GridLayout) -> ChordSlotRecord {
        ChordSlotRecord {
            name: self.name.clone(),
            keys: self
                .keys
                .iter()
                .map(|&key| ChordKeyRecord {
                    x: key.x,
                    y: key.y,
                    note_name: layout.note_name(key).to_string(),
                    octave: layout.octave(key),
                })
                .collect(),
        }
    }

    /// Rebuild a slot from its record (grid coordinates are authoritative)
    pub fn from_record(record: &ChordSlotRecord) -> Self {
        let mut slot = Self::new(record.name.clone());
        for key in &record.keys {
            let key = GridKey::new(key.x, key.y);
            if !slot.contains(key) {
                slot.keys.push(key);
            }
        }
        slot
    }
}

/// The chord palette
///
/// All operations take a slot index and fail with
/// [`EngineError::SlotOutOfRange`] for indices past [`CHORD_SLOT_COUNT`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordBank {
    slots: Vec<ChordSlot>,
}

impl ChordBank {
    pub fn new() -> Self {
        Self {
            slots: (0..CHORD_SLOT_COUNT)
                .map(|i| ChordSlot::new(default_slot_name(i)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(ChordSlot::is_empty)
    }

    pub fn slots(&self) -> &[ChordSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> EngineResult<&ChordSlot> {
        self.slots.get(index).ok_or(EngineError::SlotOutOfRange {
            index,
            count: CHORD_SLOT_COUNT,
        })
    }

    fn slot_mut(&mut self, index: usize) -> EngineResult<&mut ChordSlot> {
        self.slots.get_mut(index).ok_or(EngineError::SlotOutOfRange {
            index,
            count: CHORD_SLOT_COUNT,
        })
    }

    /// Add or remove a key in a slot; returns `true` when added
    pub fn toggle_key(&mut self, index: usize, key: GridKey) -> EngineResult<bool> {
        Ok(self.slot_mut(index)?.toggle_key(key))
    }

    /// Remove every key from a slot and restore its default name
    pub fn clear(&mut self, index: usize) -> EngineResult<()> {
        let slot = self.slot_mut(index)?;
        slot.clear();
        slot.name = default_slot_name(index);
        Ok(())
    }

    pub fn rename(&mut self, index: usize, name: impl Into<String>) -> EngineResult<()> {
        self.slot_mut(index)?.name = name.into();
        Ok(())
    }

    /// Record for saving one slot; empty slots cannot be saved
    pub fn save(&self, index: usize, layout: &GridLayout) -> EngineResult<ChordSlotRecord> {
        let slot = self.slot(index)?;
        if slot.is_empty() {
            return Err(EngineError::EmptySlot(index));
        }
        Ok(slot.to_record(layout))
    }

    /// Replace a slot with a saved record
    pub fn load(&mut self, index: usize, record: &ChordSlotRecord) -> EngineResult<()> {
        *self.slot_mut(index)? = ChordSlot::from_record(record);
        Ok(())
    }

    /// Record of the whole palette (empty slots become `None`)
    pub fn to_record(&self, layout: &GridLayout) -> ChordBankRecord {
        ChordBankRecord {
            version: FormatVersion::current(),
            slots: self
                .slots
                .iter()
                .map(|slot| (!slot.is_empty()).then(|| slot.to_record(layout)))
                .collect(),
        }
    }

    /// Rebuild a palette from a record
    ///
    /// Missing trailing slots are left empty; a record with more slots than
    /// the palette holds is rejected.
    pub fn from_record(record: &ChordBankRecord) -> EngineResult<Self> {
        if record.slots.len() > CHORD_SLOT_COUNT {
            return Err(EngineError::SlotOutOfRange {
                index: record.slots.len() - 1,
                count: CHORD_SLOT_COUNT,
            });
        }

        let mut bank = Self::new();
        for (index, slot) in record.slots.iter().enumerate() {
            if let Some(slot) = slot {
                bank.load(index, slot)?;
            }
        }
        Ok(bank)
    }
}

impl Default for ChordBank {
    fn default() -> Self {
        Self::new()
    }
}

fn default_slot_name(index: usize) -> String {
    format!("Chord {}", index + 1)
}
