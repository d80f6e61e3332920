// Recorder - Captures key presses as notes while the loop is playing
// Timing comes from the clock reading of the key event, not from the playhead

use crate::sequencer::note::{GridKey, RecordedNote, DEFAULT_NOTE_BEATS};
use crate::sequencer::transport::Transport;

/// Loop recorder
///
/// Notes are appended in the order they were played and never edited.
pub struct NoteRecorder {
    notes: Vec<RecordedNote>,
    note_duration: f64,
}

impl NoteRecorder {
    pub fn new() -> Self {
        Self::with_note_duration(DEFAULT_NOTE_BEATS)
    }

    /// Recorder whose notes last `note_duration` beats
    pub fn with_note_duration(note_duration: f64) -> Self {
        Self {
            notes: Vec::new(),
            note_duration,
        }
    }

    /// Record a key event at clock time `now`
    ///
    /// Does nothing unless the transport is both recording and playing.
    /// The start beat is measured from the transport's anchor and folded
    /// into the loop, so an event that lands between the loop end and the
    /// wrapping tick is stored at the loop start instead of past the end.
    pub fn record(
        &mut self,
        transport: &Transport,
        key: GridKey,
        now: f64,
    ) -> Option<RecordedNote> {
        let state = transport.state();
        if !(state.is_recording && state.is_playing) {
            return None;
        }

        let total_beats = transport.tempo().total_beats();
        let start_beat = transport.beat_at(now).rem_euclid(total_beats);
        let note = RecordedNote::new(key, start_beat, self.note_duration);
        self.notes.push(note);

        log::debug!("recorded {} at beat {:.3}", key, start_beat);
        Some(note)
    }

    pub fn notes(&self) -> &[RecordedNote] {
        &self.notes
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }
}

impl Default for NoteRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::timeline::TempoConfig;
    use approx::assert_relative_eq;

    fn recording_transport(anchor: f64) -> Transport {
        let mut transport = Transport::new(TempoConfig::default()).unwrap();
        transport.set_recording(true);
        transport.start(anchor);
        transport
    }

    #[test]
    fn test_basic_recording() {
        let transport = recording_transport(5.0);
        let mut recorder = NoteRecorder::new();

        // One second after the anchor at 120 BPM = beat 2
        let note = recorder
            .record(&transport, GridKey::new(4, 1), 6.0)
            .unwrap();

        assert_relative_eq!(note.start_beat, 2.0, epsilon = 1e-9);
        assert_eq!(note.duration, DEFAULT_NOTE_BEATS);
        assert_eq!(recorder.note_count(), 1);
    }

    #[test]
    fn test_requires_recording_and_playing() {
        let mut transport = Transport::new(TempoConfig::default()).unwrap();
        let mut recorder = NoteRecorder::new();

        // Playing but not armed
        transport.start(0.0);
        assert!(recorder.record(&transport, GridKey::new(0, 0), 1.0).is_none());

        // Armed but stopped
        transport.stop();
        transport.set_recording(true);
        assert!(recorder.record(&transport, GridKey::new(0, 0), 1.0).is_none());

        assert!(recorder.is_empty());
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let transport = recording_transport(0.0);
        let mut recorder = NoteRecorder::new();

        recorder.record(&transport, GridKey::new(1, 0), 2.0);
        recorder.record(&transport, GridKey::new(2, 0), 0.5);
        recorder.record(&transport, GridKey::new(1, 0), 2.0);

        let keys: Vec<u16> = recorder.notes().iter().map(|n| n.key.x).collect();
        assert_eq!(keys, vec![1, 2, 1]);
    }

    #[test]
    fn test_event_past_loop_end_folds_to_start() {
        let transport = recording_transport(0.0);
        let mut recorder = NoteRecorder::new();

        // Loop is 16 beats = 8 seconds; 8.25s is beat 16.5 -> 0.5
        let note = recorder
            .record(&transport, GridKey::new(0, 0), 8.25)
            .unwrap();
        assert_relative_eq!(note.start_beat, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_clear() {
        let transport = recording_transport(0.0);
        let mut recorder = NoteRecorder::with_note_duration(1.0);
        recorder.record(&transport, GridKey::new(0, 0), 0.1);
        assert_eq!(recorder.notes()[0].duration, 1.0);

        recorder.clear();
        assert!(recorder.is_empty());
    }
}
