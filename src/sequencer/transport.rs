// Transport - Playback control and playhead advancement
// Dead-reckons the playhead between ticks, resyncs to the audio clock on start and wrap

use std::fmt;

use super::timeline::TempoConfig;
use super::EngineResult;

/// Transport state as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Recording,
    /// Stopped away from the loop start; `start` resumes from the playhead
    Paused,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransportState::Stopped => "stopped",
            TransportState::Playing => "playing",
            TransportState::Recording => "recording",
            TransportState::Paused => "paused",
        };
        f.write_str(label)
    }
}

/// Playback state owned by the transport
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub is_playing: bool,
    /// Record arm; notes are only captured while also playing
    pub is_recording: bool,
    pub metronome_enabled: bool,
    /// Playhead in pixels, always in [0, total_width)
    pub playhead_position: f64,
    /// Clock reading that corresponds to playhead 0 in the current run
    pub audio_anchor_time: f64,
    /// Last beat seen by the metronome (-1 = none yet)
    pub last_beat_index: i64,
}

impl PlaybackState {
    /// User-facing transport state
    pub fn transport_state(&self) -> TransportState {
        match (self.is_playing, self.is_recording) {
            (true, true) => TransportState::Recording,
            (true, false) => TransportState::Playing,
            (false, _) if self.playhead_position > 0.0 => TransportState::Paused,
            (false, _) => TransportState::Stopped,
        }
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            is_playing: false,
            is_recording: false,
            metronome_enabled: false,
            playhead_position: 0.0,
            audio_anchor_time: 0.0,
            last_beat_index: -1,
        }
    }
}

/// Result of one transport tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Transport is not playing, nothing moved
    Idle,
    /// Playhead moved forward (possibly by zero)
    Advanced,
    /// Playhead reached the loop end and restarted at 0
    Wrapped,
}

/// Transport controller
///
/// The audio clock is the source of truth only at transitions: `start`
/// and loop wrap set the anchor. In between, the playhead advances by the
/// wall-time delta between ticks, which keeps motion smooth even when a
/// clock read is late.
pub struct Transport {
    tempo: TempoConfig,
    state: PlaybackState,
    /// Clock reading of the previous tick (delta timer)
    last_tick_time: f64,
}

impl Transport {
    /// Create a stopped transport at position 0
    pub fn new(tempo: TempoConfig) -> EngineResult<Self> {
        tempo.validate()?;
        Ok(Self {
            tempo,
            state: PlaybackState::default(),
            last_tick_time: 0.0,
        })
    }

    pub fn tempo(&self) -> &TempoConfig {
        &self.tempo
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut PlaybackState {
        &mut self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn playhead_position(&self) -> f64 {
        self.state.playhead_position
    }

    /// Playhead position in beats
    pub fn position_beats(&self) -> f64 {
        self.tempo.pixels_to_beats(self.state.playhead_position)
    }

    /// 1-based (bar, beat) of the playhead
    pub fn bar_and_beat(&self) -> (u32, u32) {
        self.tempo.pixels_to_bar_beat(self.state.playhead_position)
    }

    /// Start playback from the current playhead
    ///
    /// Returns `false` (and does nothing) if already playing.
    pub fn start(&mut self, clock_now: f64) -> bool {
        if self.state.is_playing {
            return false;
        }

        let elapsed = self
            .tempo
            .beats_to_seconds(self.tempo.pixels_to_beats(self.state.playhead_position));

        self.state.is_playing = true;
        self.state.audio_anchor_time = clock_now - elapsed;
        self.state.last_beat_index = -1;
        self.last_tick_time = clock_now;
        true
    }

    /// Stop playback, keeping the playhead where it is
    ///
    /// Returns `false` if the transport was not playing.
    pub fn stop(&mut self) -> bool {
        let was_playing = self.state.is_playing;
        self.state.is_playing = false;
        was_playing
    }

    /// Advance the playhead to the given clock reading
    pub fn tick(&mut self, now: f64) -> TickOutcome {
        if !self.state.is_playing {
            return TickOutcome::Idle;
        }

        let elapsed_ms = (now - self.last_tick_time).max(0.0) * 1000.0;
        self.last_tick_time = self.last_tick_time.max(now);

        self.state.playhead_position += elapsed_ms * self.tempo.pixels_per_millisecond();

        if self.state.playhead_position >= self.tempo.total_width() {
            // Wrap is the only resync point while playing
            self.state.playhead_position = 0.0;
            self.state.audio_anchor_time = now;
            return TickOutcome::Wrapped;
        }

        TickOutcome::Advanced
    }

    /// Move the playhead to a 1-based bar and beat
    ///
    /// Out-of-range values are clamped into the loop. Play state is left
    /// unchanged; while playing, the anchor follows the new position so that
    /// recording stays aligned.
    pub fn jump_to(&mut self, bar: u32, beat: u32) {
        let position = self.tempo.bar_beat_to_pixels(bar, beat);
        self.state.playhead_position = position;

        if self.state.is_playing {
            let elapsed = self
                .tempo
                .beats_to_seconds(self.tempo.pixels_to_beats(position));
            self.state.audio_anchor_time = self.last_tick_time - elapsed;
        }
    }

    /// Beat position of a clock reading, measured from the anchor
    pub fn beat_at(&self, now: f64) -> f64 {
        self.tempo
            .seconds_to_beats(now - self.state.audio_anchor_time)
    }

    pub fn set_recording(&mut self, recording: bool) {
        self.state.is_recording = recording;
    }

    pub fn set_metronome_enabled(&mut self, enabled: bool) {
        self.state.metronome_enabled = enabled;
    }
}
