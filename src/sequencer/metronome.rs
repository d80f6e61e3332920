// Metronome - Bar boundary detection for the click track
// One click per bar crossing, guarded against repeated ticks on the same beat

use crate::audio::voice_port::ClickType;
use crate::sequencer::timeline::TempoConfig;
use crate::sequencer::transport::PlaybackState;

/// Decide whether the current tick should fire a metronome click
///
/// Several ticks usually land on the same beat, so the beat index is only
/// acted upon when it differs from `last_beat_index`. Clicks fire on bar
/// boundaries only; the first bar of the loop is accented. When the
/// metronome is disabled the state is left untouched.
pub fn check_for_click(state: &mut PlaybackState, tempo: &TempoConfig) -> Option<ClickType> {
    if !state.metronome_enabled {
        return None;
    }

    let beat_index = tempo.beat_index(state.playhead_position);
    if beat_index == state.last_beat_index {
        return None;
    }
    state.last_beat_index = beat_index;

    if beat_index.rem_euclid(tempo.beats_per_bar as i64) != 0 {
        return None;
    }

    if beat_index == 0 {
        Some(ClickType::Accent)
    } else {
        Some(ClickType::Regular)
    }
}
