// Sequencer Player - Reconciles recorded notes with sounding voices
// Each tick: derive which keys should sound at the playhead, start/stop the difference

use std::collections::{HashMap, HashSet};

use crate::audio::voice_port::{VoiceError, VoicePort};
use crate::sequencer::note::{GridKey, RecordedNote};

/// What one reconcile pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub started: usize,
    pub stopped: usize,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.started == 0 && self.stopped == 0
    }
}

/// Keys that should be sounding at a beat position
pub fn keys_sounding_at(notes: &[RecordedNote], beat: f64) -> HashSet<GridKey> {
    notes
        .iter()
        .filter(|note| note.contains_beat(beat))
        .map(|note| note.key)
        .collect()
}

/// Note reconciler - owns the voices started by playback
///
/// The active map is the set of keys currently sounding because of the
/// sequencer; it doubles as the renderer's "sequencer-playing" flag set.
/// Keys pressed live or triggered from the chord palette are tracked
/// elsewhere and never appear here.
pub struct NoteReconciler<H> {
    active: HashMap<GridKey, H>,
}

impl<H> NoteReconciler<H> {
    pub fn new() -> Self {
        Self {
            active: HashMap::new(),
        }
    }

    /// Bring the active voices in line with the notes at `current_beat`
    ///
    /// Each key gets at most one action per call: a stop if it is active and
    /// no longer covered by a note, a start if it is covered and not active.
    /// Anything else is left untouched, so calling this twice at the same
    /// beat is a no-op. A failed start leaves no entry behind.
    pub fn reconcile<V>(
        &mut self,
        notes: &[RecordedNote],
        current_beat: f64,
        voices: &mut V,
    ) -> Result<ReconcileReport, VoiceError>
    where
        V: VoicePort<Handle = H>,
    {
        let should_sound = keys_sounding_at(notes, current_beat);
        let mut report = ReconcileReport::default();

        let to_stop: Vec<GridKey> = self
            .active
            .keys()
            .filter(|key| !should_sound.contains(key))
            .copied()
            .collect();

        for key in to_stop {
            if let Some(handle) = self.active.remove(&key) {
                log::debug!("sequencer stop {} at beat {:.3}", key, current_beat);
                voices.stop(handle)?;
                report.stopped += 1;
            }
        }

        for key in should_sound {
            if self.active.contains_key(&key) {
                continue;
            }
            let handle = voices.start(key)?;
            log::debug!("sequencer start {} at beat {:.3}", key, current_beat);
            self.active.insert(key, handle);
            report.started += 1;
        }

        Ok(report)
    }

    /// Force-stop every active voice and clear the set
    ///
    /// Every voice gets its stop even if an earlier one failed; the first
    /// error is returned.
    pub fn stop_all<V>(&mut self, voices: &mut V) -> Result<usize, VoiceError>
    where
        V: VoicePort<Handle = H>,
    {
        let mut first_error = None;
        let mut stopped = 0;

        for (key, handle) in self.active.drain() {
            match voices.stop(handle) {
                Ok(()) => stopped += 1,
                Err(e) => {
                    log::warn!("failed to stop sequencer voice {}: {}", key, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(stopped),
        }
    }

    /// Check if a key is sounding because of playback
    pub fn is_active(&self, key: GridKey) -> bool {
        self.active.contains_key(&key)
    }

    /// Keys sounding because of playback, sorted left to right
    pub fn active_keys(&self) -> Vec<GridKey> {
        let mut keys: Vec<GridKey> = self.active.keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

impl<H> Default for NoteReconciler<H> {
    fn default() -> Self {
        Self::new()
    }
}
