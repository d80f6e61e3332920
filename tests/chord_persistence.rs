// Integration test for chord palette persistence
// Save/load of single slots and whole banks through JSON, plus RON engine config files

mod common;

use std::io::Write;

use chordgrid::project::{
    ChordBankRecord, FormatVersion, ProjectError, bank_from_json, bank_to_json, slot_from_json,
    slot_to_json,
};
use chordgrid::{EngineConfig, EngineError, GridLayout, ManualClock, PlaybackEngine, TempoConfig};
use common::{RecordingVoices, key};

fn engine() -> PlaybackEngine<ManualClock, RecordingVoices> {
    PlaybackEngine::new(
        TempoConfig::default(),
        ManualClock::new(0.0),
        RecordingVoices::new(),
    )
    .unwrap()
}

#[test]
fn test_bank_survives_json_round_trip() {
    let mut source = engine();
    for (x, y) in [(0, 0), (4, 0), (2, 1)] {
        source.toggle_chord_key(0, key(x, y)).unwrap();
    }
    source.rename_chord(0, "C major").unwrap();
    source.toggle_chord_key(6, key(9, 0)).unwrap();
    source.toggle_chord_key(6, key(0, 1)).unwrap();
    source.rename_chord(6, "A minor shell").unwrap();

    let json = bank_to_json(&source.chord_bank_record()).unwrap();
    assert!(json.contains("\"noteName\": \"E\""));
    assert!(json.contains("\"octave\": 3"));

    let mut target = engine();
    target.load_chord_bank(&bank_from_json(&json).unwrap()).unwrap();

    assert_eq!(target.chords(), source.chords());
    assert_eq!(target.chord(0).unwrap().name, "C major");
    assert!(target.chord(3).unwrap().is_empty());
}

#[test]
fn test_single_slot_moves_between_slots() {
    let mut engine = engine();
    engine.toggle_chord_key(2, key(5, 0)).unwrap();
    engine.toggle_chord_key(2, key(1, 1)).unwrap();
    engine.rename_chord(2, "F").unwrap();

    let json = slot_to_json(&engine.save_chord(2).unwrap()).unwrap();
    engine.load_chord(7, &slot_from_json(&json).unwrap()).unwrap();

    assert_eq!(engine.chord(7).unwrap(), engine.chord(2).unwrap());
    // Insertion order is kept, strum order is derived
    assert_eq!(engine.chord(7).unwrap().keys(), &[key(5, 0), key(1, 1)]);
    assert_eq!(
        engine.chord(7).unwrap().strum_order(),
        vec![key(1, 1), key(5, 0)]
    );
}

#[test]
fn test_note_names_follow_layout() {
    let config = EngineConfig {
        grid: GridLayout::new(60, 7),
        ..EngineConfig::default()
    };
    let mut engine =
        PlaybackEngine::from_config(&config, ManualClock::new(0.0), RecordingVoices::new())
            .unwrap();
    engine.toggle_chord_key(0, key(0, 1)).unwrap();

    let record = engine.save_chord(0).unwrap();
    assert_eq!(record.keys[0].note_name, "G");
    assert_eq!(record.keys[0].octave, 4);
}

#[test]
fn test_hand_written_json_is_accepted() {
    let json = r#"{
        "slots": [
            null,
            { "name": "Fifth", "keys": [
                { "x": 0, "y": 0, "noteName": "C", "octave": 3 },
                { "x": 7, "y": 0, "noteName": "G", "octave": 3 },
                { "x": 7, "y": 0, "noteName": "G", "octave": 3 }
            ] }
        ]
    }"#;

    let record = bank_from_json(json).unwrap();
    assert_eq!(record.version, FormatVersion::current());

    let mut engine = engine();
    engine.load_chord_bank(&record).unwrap();
    // Duplicate keys collapse
    assert_eq!(engine.chord(1).unwrap().keys(), &[key(0, 0), key(7, 0)]);
}

#[test]
fn test_rejected_records() {
    let future = r#"{ "version": { "major": 2, "minor": 0 }, "slots": [] }"#;
    assert!(matches!(
        bank_from_json(future),
        Err(ProjectError::UnsupportedVersion(v)) if v == "2.0"
    ));
    assert!(matches!(bank_from_json("{"), Err(ProjectError::Json(_))));

    let oversized = ChordBankRecord {
        version: FormatVersion::current(),
        slots: vec![None; 9],
    };
    let mut engine = engine();
    assert!(matches!(
        engine.load_chord_bank(&oversized),
        Err(EngineError::SlotOutOfRange { .. })
    ));
}

#[test]
fn test_engine_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "(grid: (base_midi_note: 40, row_interval: 5), control_rate_hz: 120.0, strum: (mode: press))"
    )
    .unwrap();

    let config = EngineConfig::load(file.path()).unwrap();
    assert_eq!(config.grid.base_midi_note, 40);
    assert_eq!(config.tick_interval_seconds(), 1.0 / 120.0);

    let engine =
        PlaybackEngine::from_config(&config, ManualClock::new(0.0), RecordingVoices::new())
            .unwrap();
    assert_eq!(engine.layout().label(key(0, 0)), "E2");
}
