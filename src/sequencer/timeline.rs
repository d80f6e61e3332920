// Timeline - Tempo model for the playhead
// Converts between playhead pixels, beats, bars and seconds

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{EngineError, EngineResult};

/// Fixed tempo and layout parameters for one playback session.
///
/// The playhead is measured in pixels of the piano roll, so the tempo model
/// carries the horizontal scale (`pixels_per_beat`) next to the musical
/// parameters. A `TempoConfig` never changes while a transport uses it;
/// a new tempo means a new transport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoConfig {
    pub pixels_per_beat: f64,
    pub beats_per_bar: u32,
    pub bpm: f64,
    pub total_bars: u32,
    /// Height of one grid row in the piano roll (renderer only)
    pub note_height: f64,
}

impl TempoConfig {
    /// Creates a validated tempo configuration
    pub fn new(
        pixels_per_beat: f64,
        beats_per_bar: u32,
        bpm: f64,
        total_bars: u32,
        note_height: f64,
    ) -> EngineResult<Self> {
        let config = Self {
            pixels_per_beat,
            beats_per_bar,
            bpm,
            total_bars,
            note_height,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that every field is strictly positive and finite
    pub fn validate(&self) -> EngineResult<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(EngineError::InvalidTempo(format!(
                    "{} must be > 0 (got {})",
                    name, value
                )))
            }
        };

        positive("pixels_per_beat", self.pixels_per_beat)?;
        positive("beats_per_bar", self.beats_per_bar as f64)?;
        positive("bpm", self.bpm)?;
        positive("total_bars", self.total_bars as f64)?;
        positive("note_height", self.note_height)?;
        Ok(())
    }

    /// Width of the whole loop in pixels
    pub fn total_width(&self) -> f64 {
        self.pixels_per_beat * self.beats_per_bar as f64 * self.total_bars as f64
    }

    /// Total number of beats in the loop
    pub fn total_beats(&self) -> f64 {
        (self.beats_per_bar * self.total_bars) as f64
    }

    /// Playhead speed: pixels_per_beat * bpm / 60000
    pub fn pixels_per_millisecond(&self) -> f64 {
        self.pixels_per_beat * self.bpm / 60_000.0
    }

    /// Duration of one beat in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Duration of the whole loop in seconds
    pub fn loop_duration_seconds(&self) -> f64 {
        self.beats_to_seconds(self.total_beats())
    }

    pub fn pixels_to_beats(&self, pixels: f64) -> f64 {
        pixels / self.pixels_per_beat
    }

    pub fn beats_to_pixels(&self, beats: f64) -> f64 {
        beats * self.pixels_per_beat
    }

    pub fn beats_to_seconds(&self, beats: f64) -> f64 {
        beats * 60.0 / self.bpm
    }

    pub fn seconds_to_beats(&self, seconds: f64) -> f64 {
        seconds * self.bpm / 60.0
    }

    /// Index of the beat containing the given playhead position
    pub fn beat_index(&self, pixels: f64) -> i64 {
        (pixels / self.pixels_per_beat).floor() as i64
    }

    /// Playhead position of a 1-based (bar, beat) pair, clamped into the loop
    ///
    /// `bar` is clamped to [1, total_bars] and `beat` to [1, beats_per_bar],
    /// so the result always satisfies `0 <= position < total_width`.
    pub fn bar_beat_to_pixels(&self, bar: u32, beat: u32) -> f64 {
        let bar = bar.clamp(1, self.total_bars);
        let beat = beat.clamp(1, self.beats_per_bar);
        let beats = (bar - 1) * self.beats_per_bar + (beat - 1);
        self.beats_to_pixels(beats as f64)
    }

    /// 1-based (bar, beat) display position for a playhead position
    pub fn pixels_to_bar_beat(&self, pixels: f64) -> (u32, u32) {
        let index = self.beat_index(pixels).max(0) as u32;
        (
            index / self.beats_per_bar + 1,
            index % self.beats_per_bar + 1,
        )
    }
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            pixels_per_beat: 100.0,
            beats_per_bar: 4,
            bpm: 120.0,
            total_bars: 4,
            note_height: 20.0,
        }
    }
}

impl fmt::Display for TempoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} BPM, {} beats/bar, {} bars",
            self.bpm, self.beats_per_bar, self.total_bars
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tempo_is_valid() {
        let tempo = TempoConfig::default();
        assert!(tempo.validate().is_ok());
        assert_eq!(tempo.to_string(), "120.0 BPM, 4 beats/bar, 4 bars");
    }

    #[test]
    fn test_rejects_non_positive_fields() {
        assert!(TempoConfig::new(0.0, 4, 120.0, 4, 20.0).is_err());
        assert!(TempoConfig::new(100.0, 0, 120.0, 4, 20.0).is_err());
        assert!(TempoConfig::new(100.0, 4, -1.0, 4, 20.0).is_err());
        assert!(TempoConfig::new(100.0, 4, 120.0, 0, 20.0).is_err());
        assert!(TempoConfig::new(100.0, 4, 120.0, 4, 0.0).is_err());
        assert!(TempoConfig::new(100.0, 4, f64::NAN, 4, 20.0).is_err());

        match TempoConfig::new(100.0, 4, 0.0, 4, 20.0) {
            Err(EngineError::InvalidTempo(msg)) => assert!(msg.contains("bpm")),
            other => panic!("Expected InvalidTempo, got {:?}", other),
        }
    }

    #[test]
    fn test_derived_quantities() {
        let tempo = TempoConfig::default();

        // 100 px/beat * 4 beats * 4 bars
        assert_eq!(tempo.total_width(), 1600.0);
        assert_eq!(tempo.total_beats(), 16.0);

        // At 120 BPM one beat = 0.5s = 500ms, so 100px / 500ms
        assert_eq!(tempo.pixels_per_millisecond(), 0.2);
        assert_eq!(tempo.beat_duration_seconds(), 0.5);
        assert_eq!(tempo.loop_duration_seconds(), 8.0);
    }

    #[test]
    fn test_conversions() {
        let tempo = TempoConfig::default();

        assert_eq!(tempo.pixels_to_beats(250.0), 2.5);
        assert_eq!(tempo.beats_to_pixels(2.5), 250.0);
        assert_eq!(tempo.beats_to_seconds(2.0), 1.0);
        assert_eq!(tempo.seconds_to_beats(1.0), 2.0);

        assert_eq!(tempo.beat_index(0.0), 0);
        assert_eq!(tempo.beat_index(99.9), 0);
        assert_eq!(tempo.beat_index(100.0), 1);
    }

    #[test]
    fn test_bar_beat_to_pixels_clamps() {
        let tempo = TempoConfig::default();

        assert_eq!(tempo.bar_beat_to_pixels(1, 1), 0.0);
        assert_eq!(tempo.bar_beat_to_pixels(2, 3), 600.0);

        // Out of range values are clamped, not rejected
        assert_eq!(tempo.bar_beat_to_pixels(0, 0), 0.0);
        assert_eq!(tempo.bar_beat_to_pixels(1, 9), 300.0);
        assert_eq!(tempo.bar_beat_to_pixels(99, 1), 1200.0);
        assert!(tempo.bar_beat_to_pixels(99, 99) < tempo.total_width());
    }

    #[test]
    fn test_pixels_to_bar_beat() {
        let tempo = TempoConfig::default();

        assert_eq!(tempo.pixels_to_bar_beat(0.0), (1, 1));
        assert_eq!(tempo.pixels_to_bar_beat(650.0), (2, 3));
        assert_eq!(tempo.pixels_to_bar_beat(1599.0), (4, 4));
    }
}
