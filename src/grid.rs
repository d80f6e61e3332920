// Grid layout - Maps grid keys to musical notes
// Pure functions only: note number, note name, octave and frequency

use serde::{Deserialize, Serialize};

use crate::sequencer::note::GridKey;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Isomorphic grid layout
///
/// Moving one column to the right raises the pitch by a semitone, moving one
/// row up raises it by `row_interval` semitones (a perfect fourth by default,
/// like a bass guitar neck).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    /// MIDI note of key (0, 0)
    pub base_midi_note: u8,
    /// Semitones between two adjacent rows
    pub row_interval: u8,
}

impl GridLayout {
    pub fn new(base_midi_note: u8, row_interval: u8) -> Self {
        Self {
            base_midi_note,
            row_interval,
        }
    }

    /// MIDI note number for a key, clamped to the MIDI range
    pub fn midi_note(&self, key: GridKey) -> u8 {
        let note = self.base_midi_note as u32
            + key.x as u32
            + key.y as u32 * self.row_interval as u32;
        note.min(127) as u8
    }

    /// Note name without octave (e.g. "C#")
    pub fn note_name(&self, key: GridKey) -> &'static str {
        NOTE_NAMES[(self.midi_note(key) % 12) as usize]
    }

    /// Octave number, with C4 = MIDI 60
    pub fn octave(&self, key: GridKey) -> i8 {
        (self.midi_note(key) / 12) as i8 - 1
    }

    /// Full note label (e.g. "A4")
    pub fn label(&self, key: GridKey) -> String {
        format!("{}{}", self.note_name(key), self.octave(key))
    }

    /// Frequency in Hz: 440 * 2^((note - 69) / 12)
    pub fn frequency(&self, key: GridKey) -> f32 {
        midi_to_frequency(self.midi_note(key))
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::new(48, 5)
    }
}

/// Convert a MIDI note number to Hz (A4 = 440 Hz)
pub fn midi_to_frequency(note: u8) -> f32 {
    440.0 * 2_f32.powf((note as f32 - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_origin_is_c3() {
        let layout = GridLayout::default();
        let origin = GridKey::new(0, 0);

        assert_eq!(layout.midi_note(origin), 48);
        assert_eq!(layout.note_name(origin), "C");
        assert_eq!(layout.octave(origin), 3);
        assert_eq!(layout.label(origin), "C3");
    }

    #[test]
    fn test_columns_and_rows() {
        let layout = GridLayout::default();

        // One column = one semitone
        assert_eq!(layout.label(GridKey::new(1, 0)), "C#3");
        // One row = a fourth
        assert_eq!(layout.label(GridKey::new(0, 1)), "F3");
        // 48 + 2 + 3 * 5 = 65
        assert_eq!(layout.midi_note(GridKey::new(2, 3)), 65);
    }

    #[test]
    fn test_midi_range_is_clamped() {
        let layout = GridLayout::new(120, 12);
        assert_eq!(layout.midi_note(GridKey::new(40, 40)), 127);
    }

    #[test]
    fn test_frequency() {
        assert!((midi_to_frequency(69) - 440.0).abs() < 1e-3);
        assert!((midi_to_frequency(57) - 220.0).abs() < 1e-3);

        // A4 sits 21 semitones above C3
        let layout = GridLayout::default();
        assert!((layout.frequency(GridKey::new(21, 0)) - 440.0).abs() < 1e-3);
    }
}
