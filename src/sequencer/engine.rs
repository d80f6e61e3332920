// Playback engine - The single owned instance driving transport, notes and chords
// One control loop calls `update` (or `tick` + `run_due`); everything else is UI-driven

use crate::audio::clock::ClockSource;
use crate::audio::voice_port::VoicePort;
use crate::chord::{
    ChordBank, ChordSlot, ChordStrummer, StrumPace, StrumSchedule, TriggerId, TriggerMode,
};
use crate::config::{EngineConfig, StrumDefaults};
use crate::grid::GridLayout;
use crate::project::types::{ChordBankRecord, ChordSlotRecord};

use super::metronome;
use super::note::{GridKey, RecordedNote};
use super::player::NoteReconciler;
use super::recorder::NoteRecorder;
use super::timeline::TempoConfig;
use super::transport::{TickOutcome, Transport, TransportState};
use super::EngineResult;

/// Read-only view of the engine for a renderer
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    pub transport: TransportState,
    pub playhead_position: f64,
    pub position_beats: f64,
    pub is_playing: bool,
    pub is_recording: bool,
    pub metronome_enabled: bool,
    /// Keys sounding because of recorded notes, sorted
    pub sounding: Vec<GridKey>,
    /// Keys sounding because of chord triggers, sorted
    pub chord_sounding: Vec<GridKey>,
}

/// Loop recorder and chord player bound to one clock and one voice backend
///
/// Sequencer voices and chord voices are tracked separately: stopping a
/// recorded note never cuts a chord and vice versa.
pub struct PlaybackEngine<C: ClockSource, V: VoicePort> {
    clock: C,
    voices: V,
    transport: Transport,
    reconciler: NoteReconciler<V::Handle>,
    recorder: NoteRecorder,
    chords: ChordBank,
    strummer: ChordStrummer<V::Handle>,
    layout: GridLayout,
    strum_defaults: StrumDefaults,
}

impl<C: ClockSource, V: VoicePort> PlaybackEngine<C, V> {
    /// Engine with default grid layout and chord settings
    pub fn new(tempo: TempoConfig, clock: C, voices: V) -> EngineResult<Self> {
        Ok(Self {
            clock,
            voices,
            transport: Transport::new(tempo)?,
            reconciler: NoteReconciler::new(),
            recorder: NoteRecorder::new(),
            chords: ChordBank::new(),
            strummer: ChordStrummer::new(),
            layout: GridLayout::default(),
            strum_defaults: StrumDefaults::default(),
        })
    }

    pub fn from_config(config: &EngineConfig, clock: C, voices: V) -> EngineResult<Self> {
        let mut engine = Self::new(config.tempo, clock, voices)?;
        engine.recorder = NoteRecorder::with_note_duration(config.note_beats);
        engine.strummer = ChordStrummer::with_hold(config.tap_hold_seconds());
        engine.layout = config.grid;
        engine.strum_defaults = config.strum;
        Ok(engine)
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Start playback at the current clock reading
    pub fn start(&mut self) -> bool {
        let now = self.clock.now();
        let started = self.transport.start(now);
        if started {
            let (bar, beat) = self.transport.bar_and_beat();
            log::info!("transport started at {}.{} (clock {:.3}s)", bar, beat, now);
        }
        started
    }

    /// Stop playback, silence sequencer voices and cancel every chord in flight
    ///
    /// The playhead stays where it is. Every voice gets its stop even when
    /// one fails; the first error is returned.
    pub fn stop(&mut self) -> EngineResult<bool> {
        let was_playing = self.transport.stop();
        if was_playing {
            log::info!(
                "transport stopped at {:.1}px",
                self.transport.playhead_position()
            );
        }

        let voices = self.reconciler.stop_all(&mut self.voices);
        let chords = self.strummer.cancel_all(&mut self.voices);

        voices?;
        chords?;
        Ok(was_playing)
    }

    /// Start if stopped, stop if playing; returns the new playing state
    pub fn toggle_play(&mut self) -> EngineResult<bool> {
        if self.transport.is_playing() {
            self.stop()?;
            Ok(false)
        } else {
            self.start();
            Ok(true)
        }
    }

    /// Advance the transport, then sync sequencer voices and the metronome
    ///
    /// Voice failures do not undo the playhead move. The metronome still
    /// gets its chance when reconciliation fails; the first error wins.
    pub fn tick(&mut self, now: f64) -> EngineResult<TickOutcome> {
        let outcome = self.transport.tick(now);
        if outcome == TickOutcome::Idle {
            return Ok(outcome);
        }
        if outcome == TickOutcome::Wrapped {
            log::debug!("loop wrapped at clock {:.3}s", now);
        }

        let beat = self.transport.position_beats();
        let reconciled = self
            .reconciler
            .reconcile(self.recorder.notes(), beat, &mut self.voices);

        let tempo = *self.transport.tempo();
        let clicked = match metronome::check_for_click(self.transport.state_mut(), &tempo) {
            Some(click_type) => self.voices.click(click_type),
            None => Ok(()),
        };
        if let Err(e) = &clicked {
            log::warn!("metronome click failed: {}", e);
        }

        reconciled?;
        clicked?;
        Ok(outcome)
    }

    /// Execute chord steps due at `now`
    pub fn run_due(&mut self, now: f64) -> EngineResult<usize> {
        self.strummer.run_due(now, &mut self.voices)
    }

    /// One control loop iteration: read the clock once, tick, run due steps
    pub fn update(&mut self) -> EngineResult<TickOutcome> {
        let now = self.clock.now();
        let ticked = self.tick(now);
        let ran = self.run_due(now);
        let outcome = ticked?;
        ran?;
        Ok(outcome)
    }

    /// Move the playhead to a 1-based bar and beat (clamped into the loop)
    pub fn jump_to(&mut self, bar: u32, beat: u32) {
        self.transport.jump_to(bar, beat);
        log::debug!("jumped to {:?}", self.transport.bar_and_beat());
    }

    pub fn set_metronome_enabled(&mut self, enabled: bool) {
        self.transport.set_metronome_enabled(enabled);
    }

    // ========================================================================
    // Recording
    // ========================================================================

    pub fn set_recording(&mut self, recording: bool) {
        self.transport.set_recording(recording);
        log::info!("recording {}", if recording { "armed" } else { "off" });
    }

    /// Record a key event at the current clock reading
    pub fn record_note(&mut self, key: GridKey) -> Option<RecordedNote> {
        let now = self.clock.now();
        self.record_note_at(key, now)
    }

    /// Record a key event at a given clock reading
    pub fn record_note_at(&mut self, key: GridKey, now: f64) -> Option<RecordedNote> {
        self.recorder.record(&self.transport, key, now)
    }

    /// Drop every recorded note and silence their voices
    pub fn clear_recording(&mut self) -> EngineResult<usize> {
        let count = self.recorder.note_count();
        self.recorder.clear();
        self.reconciler.stop_all(&mut self.voices)?;
        log::info!("cleared {} recorded notes", count);
        Ok(count)
    }

    pub fn recorded_notes(&self) -> &[RecordedNote] {
        self.recorder.notes()
    }

    // ========================================================================
    // Chords
    // ========================================================================

    pub fn chords(&self) -> &ChordBank {
        &self.chords
    }

    pub fn chord(&self, slot: usize) -> EngineResult<&ChordSlot> {
        self.chords.slot(slot)
    }

    pub fn toggle_chord_key(&mut self, slot: usize, key: GridKey) -> EngineResult<bool> {
        self.chords.toggle_key(slot, key)
    }

    pub fn rename_chord(&mut self, slot: usize, name: impl Into<String>) -> EngineResult<()> {
        self.chords.rename(slot, name)
    }

    pub fn clear_chord(&mut self, slot: usize) -> EngineResult<()> {
        self.chords.clear(slot)
    }

    pub fn save_chord(&self, slot: usize) -> EngineResult<ChordSlotRecord> {
        self.chords.save(slot, &self.layout)
    }

    pub fn load_chord(&mut self, slot: usize, record: &ChordSlotRecord) -> EngineResult<()> {
        self.chords.load(slot, record)
    }

    pub fn chord_bank_record(&self) -> ChordBankRecord {
        self.chords.to_record(&self.layout)
    }

    /// Replace the whole palette; chords in flight keep sounding
    pub fn load_chord_bank(&mut self, record: &ChordBankRecord) -> EngineResult<()> {
        self.chords = ChordBank::from_record(record)?;
        Ok(())
    }

    /// Fire times a trigger of `slot` would use, without playing it
    pub fn strum_schedule(
        &self,
        slot: usize,
        mode: TriggerMode,
        pace: StrumPace,
    ) -> EngineResult<StrumSchedule> {
        let chord = self.chords.slot(slot)?;
        Ok(StrumSchedule::build(chord, mode, pace, self.transport.tempo()))
    }

    /// Play a chord slot now; `None` when the slot is empty
    pub fn trigger_chord(
        &mut self,
        slot: usize,
        mode: TriggerMode,
        pace: StrumPace,
    ) -> EngineResult<Option<TriggerId>> {
        let now = self.clock.now();
        self.trigger_chord_at(slot, mode, pace, now)
    }

    /// Play a chord slot with the configured mode and pace
    pub fn play_chord(&mut self, slot: usize) -> EngineResult<Option<TriggerId>> {
        let StrumDefaults { mode, pace } = self.strum_defaults;
        self.trigger_chord(slot, mode, pace)
    }

    pub fn trigger_chord_at(
        &mut self,
        slot: usize,
        mode: TriggerMode,
        pace: StrumPace,
        now: f64,
    ) -> EngineResult<Option<TriggerId>> {
        let chord = self.chords.slot(slot)?;
        self.strummer.trigger(
            slot,
            chord,
            mode,
            pace,
            self.transport.tempo(),
            now,
            &mut self.voices,
        )
    }

    /// Release a held chord
    pub fn release_chord(&mut self, trigger: TriggerId) -> EngineResult<()> {
        self.strummer.release(trigger, &mut self.voices)
    }

    pub fn cancel_chord(&mut self, trigger: TriggerId) -> EngineResult<()> {
        self.strummer.cancel(trigger, &mut self.voices)
    }

    /// Cancel every trigger of a slot; returns how many were cancelled
    pub fn cancel_chord_slot(&mut self, slot: usize) -> EngineResult<usize> {
        self.chords.slot(slot)?;
        self.strummer.cancel_slot(slot, &mut self.voices)
    }

    pub fn is_chord_active(&self, trigger: TriggerId) -> bool {
        self.strummer.is_active(trigger)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn snapshot(&self) -> EngineSnapshot {
        let state = self.transport.state();
        EngineSnapshot {
            transport: state.transport_state(),
            playhead_position: state.playhead_position,
            position_beats: self.transport.position_beats(),
            is_playing: state.is_playing,
            is_recording: state.is_recording,
            metronome_enabled: state.metronome_enabled,
            sounding: self.reconciler.active_keys(),
            chord_sounding: self.strummer.sounding_keys(),
        }
    }

    /// Check if a key carries the sequencer-playing flag
    pub fn is_sequencer_playing(&self, key: GridKey) -> bool {
        self.reconciler.is_active(key)
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn tempo(&self) -> &TempoConfig {
        self.transport.tempo()
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn voices(&self) -> &V {
        &self.voices
    }

    pub fn voices_mut(&mut self) -> &mut V {
        &mut self.voices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::clock::ManualClock;
    use crate::audio::voice_port::mock::{MockVoicePort, VoiceEvent};
    use crate::audio::voice_port::ClickType;
    use crate::sequencer::EngineError;
    use approx::assert_relative_eq;

    fn key(x: u16, y: u16) -> GridKey {
        GridKey::new(x, y)
    }

    fn engine() -> (PlaybackEngine<ManualClock, MockVoicePort>, ManualClock) {
        let clock = ManualClock::new(0.0);
        let engine =
            PlaybackEngine::new(TempoConfig::default(), clock.clone(), MockVoicePort::new())
                .unwrap();
        (engine, clock)
    }

    #[test]
    fn test_start_and_tick_moves_playhead() {
        let (mut engine, clock) = engine();
        clock.set(10.0);
        assert!(engine.start());
        assert!(!engine.start());

        assert_eq!(engine.tick(10.5).unwrap(), TickOutcome::Advanced);
        assert_relative_eq!(engine.snapshot().playhead_position, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_idle_tick_does_nothing() {
        let (mut engine, _) = engine();
        assert_eq!(engine.tick(3.0).unwrap(), TickOutcome::Idle);
        assert!(engine.voices().events.is_empty());
    }

    #[test]
    fn test_recorded_note_plays_back() {
        let (mut engine, _) = engine();
        engine.set_recording(true);
        engine.start();

        let note = engine.record_note_at(key(3, 1), 1.0).unwrap();
        assert_relative_eq!(note.start_beat, 2.0);

        engine.tick(1.0).unwrap();
        assert!(engine.is_sequencer_playing(key(3, 1)));
        assert_eq!(engine.voices().started_keys(), vec![key(3, 1)]);

        // Same clock reading again: nothing new
        let events = engine.voices().events.len();
        engine.tick(1.0).unwrap();
        assert_eq!(engine.voices().events.len(), events);

        // Past the note's end
        engine.tick(1.2).unwrap();
        assert!(!engine.is_sequencer_playing(key(3, 1)));
        assert_eq!(engine.voices().stop_count(), 1);
    }

    #[test]
    fn test_recording_requires_playing() {
        let (mut engine, clock) = engine();
        engine.set_recording(true);
        clock.set(1.0);
        assert!(engine.record_note(key(0, 0)).is_none());

        engine.set_recording(false);
        engine.start();
        assert!(engine.record_note(key(0, 0)).is_none());
        assert!(engine.recorded_notes().is_empty());
    }

    #[test]
    fn test_note_at_loop_end_stops_on_wrap() {
        let (mut engine, _) = engine();
        engine.set_recording(true);
        engine.start();

        // 16 beats at 120 BPM = 8 s loop; last sixteenth starts at 7.875 s
        let note = engine.record_note_at(key(1, 0), 7.875).unwrap();
        assert_relative_eq!(note.start_beat, 15.75);

        engine.tick(7.9).unwrap();
        assert!(engine.is_sequencer_playing(key(1, 0)));

        assert_eq!(engine.tick(8.1).unwrap(), TickOutcome::Wrapped);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.playhead_position, 0.0);
        assert!(snapshot.sounding.is_empty());
        assert_eq!(engine.transport().state().audio_anchor_time, 8.1);
    }

    #[test]
    fn test_metronome_clicks_on_bars() {
        let (mut engine, _) = engine();
        engine.set_metronome_enabled(true);
        engine.start();

        for beat in 0..=8 {
            engine.tick(beat as f64 * 0.5 + 0.001).unwrap();
        }

        assert_eq!(
            engine.voices().clicks(),
            vec![ClickType::Accent, ClickType::Regular, ClickType::Regular]
        );
    }

    #[test]
    fn test_stop_silences_everything() {
        let (mut engine, _) = engine();
        engine.set_recording(true);
        engine.start();
        engine.record_note_at(key(0, 0), 0.0).unwrap();
        engine.tick(0.01).unwrap();

        engine.toggle_chord_key(0, key(4, 0)).unwrap();
        engine.toggle_chord_key(0, key(7, 0)).unwrap();
        let trigger = engine
            .trigger_chord_at(0, TriggerMode::Strum, StrumPace::beats(1.0), 0.01)
            .unwrap()
            .unwrap();

        assert!(engine.stop().unwrap());
        assert_eq!(engine.snapshot().transport, TransportState::Paused);
        assert!(!engine.is_chord_active(trigger));
        assert!(engine.snapshot().sounding.is_empty());
        assert!(engine.snapshot().chord_sounding.is_empty());
        // One sequencer voice and the first strummed key
        assert_eq!(engine.voices().stop_count(), 2);

        // Pending strum step is gone
        assert_eq!(engine.run_due(10.0).unwrap(), 0);
        assert_relative_eq!(engine.snapshot().playhead_position, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_strum_through_engine() {
        let (mut engine, _) = engine();
        for (x, y) in [(2, 0), (0, 1), (0, 0)] {
            engine.toggle_chord_key(0, key(x, y)).unwrap();
        }

        engine
            .trigger_chord_at(0, TriggerMode::Strum, StrumPace::beats(1.0), 0.0)
            .unwrap();
        engine.run_due(0.5).unwrap();
        engine.run_due(1.0).unwrap();

        assert_eq!(
            engine.voices().started_keys(),
            vec![key(0, 0), key(0, 1), key(2, 0)]
        );

        let schedule = engine
            .strum_schedule(0, TriggerMode::Strum, StrumPace::beats(1.0))
            .unwrap();
        assert_relative_eq!(schedule.steps[2].offset, 1.0);
    }

    #[test]
    fn test_chord_slot_errors() {
        let (mut engine, _) = engine();
        assert_eq!(
            engine
                .trigger_chord(0, TriggerMode::Press, StrumPace::default())
                .unwrap(),
            None
        );
        assert!(matches!(
            engine.trigger_chord(8, TriggerMode::Press, StrumPace::default()),
            Err(EngineError::SlotOutOfRange { index: 8, .. })
        ));
        assert!(matches!(
            engine.cancel_chord_slot(99),
            Err(EngineError::SlotOutOfRange { .. })
        ));
        assert!(matches!(
            engine.cancel_chord(12345),
            Err(EngineError::UnknownTrigger(12345))
        ));
        assert!(matches!(engine.save_chord(0), Err(EngineError::EmptySlot(0))));
    }

    #[test]
    fn test_press_is_held_until_release() {
        let (mut engine, _) = engine();
        engine.toggle_chord_key(2, key(0, 0)).unwrap();
        engine.toggle_chord_key(2, key(4, 0)).unwrap();

        let trigger = engine
            .trigger_chord_at(2, TriggerMode::Press, StrumPace::default(), 0.0)
            .unwrap()
            .unwrap();
        engine.run_due(60.0).unwrap();
        assert_eq!(engine.snapshot().chord_sounding, vec![key(0, 0), key(4, 0)]);

        engine.release_chord(trigger).unwrap();
        assert!(engine.snapshot().chord_sounding.is_empty());
        assert_eq!(engine.voices().stop_count(), 2);
    }

    #[test]
    fn test_clear_recording() {
        let (mut engine, _) = engine();
        engine.set_recording(true);
        engine.start();
        engine.record_note_at(key(0, 0), 0.0).unwrap();
        engine.record_note_at(key(1, 0), 0.0).unwrap();
        engine.tick(0.01).unwrap();
        assert_eq!(engine.snapshot().sounding.len(), 2);

        assert_eq!(engine.clear_recording().unwrap(), 2);
        assert!(engine.recorded_notes().is_empty());
        assert!(engine.snapshot().sounding.is_empty());
    }

    #[test]
    fn test_voice_failure_propagates() {
        let (mut engine, _) = engine();
        engine.set_recording(true);
        engine.start();
        engine.record_note_at(key(0, 0), 0.0).unwrap();
        engine.voices_mut().fail_starts = true;

        assert!(matches!(engine.tick(0.01), Err(EngineError::Voice(_))));
        assert!(!engine.is_sequencer_playing(key(0, 0)));
        // The playhead still moved
        assert!(engine.snapshot().playhead_position > 0.0);
    }

    #[test]
    fn test_update_reads_clock_once() {
        let (mut engine, clock) = engine();
        engine.toggle_chord_key(0, key(0, 0)).unwrap();
        engine.start();
        engine
            .trigger_chord(0, TriggerMode::Toggle, StrumPace::default())
            .unwrap();

        clock.set(0.5);
        assert_eq!(engine.update().unwrap(), TickOutcome::Advanced);
        assert_relative_eq!(engine.snapshot().position_beats, 1.0, epsilon = 1e-9);
        // Toggle hold elapsed
        assert_eq!(
            engine.voices().events.last(),
            Some(&VoiceEvent::Stop(1))
        );
    }

    #[test]
    fn test_from_config() {
        let mut config = EngineConfig::default();
        config.note_beats = 1.0;
        config.tap_hold_ms = 100.0;
        config.strum.mode = TriggerMode::Toggle;

        let mut engine =
            PlaybackEngine::from_config(&config, ManualClock::new(0.0), MockVoicePort::new())
                .unwrap();
        engine.set_recording(true);
        engine.start();
        let note = engine.record_note_at(key(0, 0), 0.0).unwrap();
        assert_eq!(note.duration, 1.0);

        engine.toggle_chord_key(0, key(0, 0)).unwrap();
        engine.play_chord(0).unwrap();
        engine.run_due(0.1).unwrap();
        assert!(engine.snapshot().chord_sounding.is_empty());
    }

    #[test]
    fn test_chord_bank_round_trip() {
        let (mut engine, _) = engine();
        engine.toggle_chord_key(5, key(0, 0)).unwrap();
        engine.rename_chord(5, "Root").unwrap();

        let record = engine.chord_bank_record();
        let saved = engine.save_chord(5).unwrap();
        engine.clear_chord(5).unwrap();
        assert!(engine.chord(5).unwrap().is_empty());

        engine.load_chord(5, &saved).unwrap();
        assert_eq!(engine.chord(5).unwrap().name, "Root");

        engine.clear_chord(5).unwrap();
        engine.load_chord_bank(&record).unwrap();
        assert_eq!(engine.chord(5).unwrap().keys(), &[key(0, 0)]);
    }
}
