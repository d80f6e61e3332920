// Chord strummer - Timed triggering of chord slots
// Press, toggle and strum modes; every deferred step is a cancellable task

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::audio::voice_port::VoicePort;
use crate::chord::slot::ChordSlot;
use crate::sequencer::note::GridKey;
use crate::sequencer::scheduler::{GroupId, TaskScheduler};
use crate::sequencer::timeline::TempoConfig;
use crate::sequencer::{EngineError, EngineResult};

/// Identifier of one chord trigger (all its steps share it)
pub type TriggerId = GroupId;

/// How long a tapped note sounds before its automatic release
pub const TAP_HOLD_SECONDS: f64 = 0.3;

/// How a chord slot is played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// All keys at once, held until released
    Press,
    /// All keys at once, released automatically after the tap hold
    Toggle,
    /// Keys one after another, left to right
    Strum,
}

impl FromStr for TriggerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "press" => Ok(TriggerMode::Press),
            "toggle" => Ok(TriggerMode::Toggle),
            "strum" => Ok(TriggerMode::Strum),
            other => Err(format!("unknown trigger mode '{}'", other)),
        }
    }
}

/// Unit of the delay between two strummed keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaceUnit {
    #[serde(rename = "beats")]
    Beats,
    #[serde(rename = "ms")]
    Milliseconds,
}

impl FromStr for PaceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beats" => Ok(PaceUnit::Beats),
            "ms" => Ok(PaceUnit::Milliseconds),
            other => Err(format!("unknown pace unit '{}'", other)),
        }
    }
}

impl fmt::Display for PaceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaceUnit::Beats => write!(f, "beats"),
            PaceUnit::Milliseconds => write!(f, "ms"),
        }
    }
}

/// Delay between strummed keys
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrumPace {
    pub value: f64,
    pub unit: PaceUnit,
}

impl StrumPace {
    pub fn beats(value: f64) -> Self {
        Self {
            value,
            unit: PaceUnit::Beats,
        }
    }

    pub fn millis(value: f64) -> Self {
        Self {
            value,
            unit: PaceUnit::Milliseconds,
        }
    }

    /// Delay in seconds at the given tempo
    ///
    /// Negative and non-finite paces count as zero, so every key fires at once.
    pub fn delay_seconds(&self, tempo: &TempoConfig) -> f64 {
        let seconds = match self.unit {
            PaceUnit::Beats => self.value * 60.0 / tempo.bpm,
            PaceUnit::Milliseconds => self.value / 1000.0,
        };
        if seconds.is_finite() {
            seconds.max(0.0)
        } else {
            0.0
        }
    }
}

impl Default for StrumPace {
    fn default() -> Self {
        Self::millis(40.0)
    }
}

/// One key of a strum schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrumStep {
    pub key: GridKey,
    /// Seconds after the trigger
    pub offset: f64,
}

/// Fire times of every key of a trigger, derived when the trigger happens
#[derive(Debug, Clone, PartialEq)]
pub struct StrumSchedule {
    pub steps: Vec<StrumStep>,
}

impl StrumSchedule {
    /// Build the schedule for a slot
    ///
    /// Press and toggle fire every key at offset 0 in insertion order.
    /// Strum sorts keys left to right (x, then y) and spaces them by the
    /// pace delay.
    pub fn build(
        slot: &ChordSlot,
        mode: TriggerMode,
        pace: StrumPace,
        tempo: &TempoConfig,
    ) -> Self {
        let steps = match mode {
            TriggerMode::Press | TriggerMode::Toggle => slot
                .keys()
                .iter()
                .map(|&key| StrumStep { key, offset: 0.0 })
                .collect(),
            TriggerMode::Strum => {
                let delay = pace.delay_seconds(tempo);
                slot.strum_order()
                    .into_iter()
                    .enumerate()
                    .map(|(i, key)| StrumStep {
                        key,
                        offset: i as f64 * delay,
                    })
                    .collect()
            }
        };
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Deferred strum work
#[derive(Debug, Clone, Copy, PartialEq)]
enum StrumAction {
    Fire {
        trigger: TriggerId,
        index: usize,
        key: GridKey,
        at: f64,
    },
    Release {
        trigger: TriggerId,
        index: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct TriggerInfo {
    slot: usize,
    mode: TriggerMode,
}

/// Plays chord slots through a voice port
///
/// Chord voices are kept apart from the sequencer's voices. Overlapping
/// triggers, even of the same slot, are independent: each has its own id,
/// its own tasks and its own voices.
pub struct ChordStrummer<H> {
    scheduler: TaskScheduler<StrumAction>,
    triggers: HashMap<TriggerId, TriggerInfo>,
    /// Sounding chord voices by (trigger, step index)
    sounding: HashMap<(TriggerId, usize), (GridKey, H)>,
    next_trigger: TriggerId,
    hold_seconds: f64,
}

impl<H> ChordStrummer<H> {
    pub fn new() -> Self {
        Self::with_hold(TAP_HOLD_SECONDS)
    }

    /// Strummer with a custom automatic release time
    pub fn with_hold(hold_seconds: f64) -> Self {
        Self {
            scheduler: TaskScheduler::new(),
            triggers: HashMap::new(),
            sounding: HashMap::new(),
            next_trigger: 1,
            hold_seconds: hold_seconds.max(0.0),
        }
    }

    pub fn hold_seconds(&self) -> f64 {
        self.hold_seconds
    }

    /// Play a slot at clock time `now`
    ///
    /// Returns `None` for an empty slot. Keys at offset 0 start right away;
    /// later keys are scheduled and fire from [`ChordStrummer::run_due`].
    /// If an immediate start fails the whole trigger is cancelled before the
    /// error is returned, so nothing is left sounding without an id.
    #[allow(clippy::too_many_arguments)]
    pub fn trigger<V>(
        &mut self,
        slot_index: usize,
        slot: &ChordSlot,
        mode: TriggerMode,
        pace: StrumPace,
        tempo: &TempoConfig,
        now: f64,
        voices: &mut V,
    ) -> EngineResult<Option<TriggerId>>
    where
        V: VoicePort<Handle = H>,
    {
        let schedule = StrumSchedule::build(slot, mode, pace, tempo);
        if schedule.is_empty() {
            return Ok(None);
        }

        let trigger = self.next_trigger;
        self.next_trigger += 1;
        self.triggers.insert(trigger, TriggerInfo { slot: slot_index, mode });

        log::debug!(
            "chord trigger #{} slot {} ({:?}, {} keys)",
            trigger,
            slot_index,
            mode,
            schedule.len()
        );

        for (index, step) in schedule.steps.iter().enumerate() {
            let at = now + step.offset;
            if step.offset <= 0.0 {
                if let Err(e) = self.fire(trigger, index, step.key, at, voices) {
                    if let Err(cleanup) = self.cancel(trigger, voices) {
                        log::warn!("chord trigger #{} cleanup failed: {}", trigger, cleanup);
                    }
                    return Err(e);
                }
            } else {
                self.scheduler.schedule(
                    at,
                    trigger,
                    StrumAction::Fire {
                        trigger,
                        index,
                        key: step.key,
                        at,
                    },
                );
            }
        }

        Ok(Some(trigger))
    }

    fn fire<V>(
        &mut self,
        trigger: TriggerId,
        index: usize,
        key: GridKey,
        at: f64,
        voices: &mut V,
    ) -> EngineResult<()>
    where
        V: VoicePort<Handle = H>,
    {
        let Some(info) = self.triggers.get(&trigger).copied() else {
            return Ok(());
        };

        let handle = voices.start(key)?;
        self.sounding.insert((trigger, index), (key, handle));

        if info.mode != TriggerMode::Press {
            self.scheduler.schedule(
                at + self.hold_seconds,
                trigger,
                StrumAction::Release { trigger, index },
            );
        }
        Ok(())
    }

    /// Execute every step due at `now`
    ///
    /// All due steps run even if one fails; the first error is returned.
    pub fn run_due<V>(&mut self, now: f64, voices: &mut V) -> EngineResult<usize>
    where
        V: VoicePort<Handle = H>,
    {
        let due = self.scheduler.take_due(now);
        let count = due.len();
        let mut first_error = None;

        for (_, action) in due {
            let (trigger, result) = match action {
                StrumAction::Fire {
                    trigger,
                    index,
                    key,
                    at,
                } => (trigger, self.fire(trigger, index, key, at, voices)),
                StrumAction::Release { trigger, index } => {
                    (trigger, self.release_voice(trigger, index, voices))
                }
            };
            // A failed last fire also ends the trigger
            self.forget_if_finished(trigger);

            if let Err(e) = result {
                log::warn!("chord step failed: {}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(count),
        }
    }

    fn release_voice<V>(
        &mut self,
        trigger: TriggerId,
        index: usize,
        voices: &mut V,
    ) -> EngineResult<()>
    where
        V: VoicePort<Handle = H>,
    {
        if let Some((_, handle)) = self.sounding.remove(&(trigger, index)) {
            voices.stop(handle)?;
        }
        Ok(())
    }

    fn forget_if_finished(&mut self, trigger: TriggerId) {
        let has_voices = self.sounding.keys().any(|(t, _)| *t == trigger);
        if !has_voices && !self.scheduler.has_group(trigger) {
            self.triggers.remove(&trigger);
        }
    }

    /// Release a held (press mode) trigger
    ///
    /// For other modes this ends the trigger early, like [`ChordStrummer::cancel`].
    pub fn release<V>(&mut self, trigger: TriggerId, voices: &mut V) -> EngineResult<()>
    where
        V: VoicePort<Handle = H>,
    {
        self.cancel(trigger, voices)
    }

    /// Cancel a trigger: drop its pending steps and stop its sounding voices
    pub fn cancel<V>(&mut self, trigger: TriggerId, voices: &mut V) -> EngineResult<()>
    where
        V: VoicePort<Handle = H>,
    {
        if self.triggers.remove(&trigger).is_none() {
            return Err(EngineError::UnknownTrigger(trigger));
        }

        let dropped = self.scheduler.cancel_group(trigger);
        let indices: Vec<usize> = self
            .sounding
            .keys()
            .filter(|(t, _)| *t == trigger)
            .map(|(_, index)| *index)
            .collect();

        log::debug!(
            "chord trigger #{} cancelled ({} pending steps, {} voices)",
            trigger,
            dropped.len(),
            indices.len()
        );

        let mut first_error = None;
        for index in indices {
            if let Err(e) = self.release_voice(trigger, index, voices) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Cancel every trigger of one slot; returns how many were cancelled
    pub fn cancel_slot<V>(&mut self, slot_index: usize, voices: &mut V) -> EngineResult<usize>
    where
        V: VoicePort<Handle = H>,
    {
        let triggers: Vec<TriggerId> = self
            .triggers
            .iter()
            .filter(|(_, info)| info.slot == slot_index)
            .map(|(id, _)| *id)
            .collect();
        self.cancel_many(triggers, voices)
    }

    /// Cancel every trigger in flight; returns how many were cancelled
    pub fn cancel_all<V>(&mut self, voices: &mut V) -> EngineResult<usize>
    where
        V: VoicePort<Handle = H>,
    {
        let triggers: Vec<TriggerId> = self.triggers.keys().copied().collect();
        self.cancel_many(triggers, voices)
    }

    fn cancel_many<V>(&mut self, triggers: Vec<TriggerId>, voices: &mut V) -> EngineResult<usize>
    where
        V: VoicePort<Handle = H>,
    {
        let count = triggers.len();
        let mut first_error = None;
        for trigger in triggers {
            if let Err(e) = self.cancel(trigger, voices) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(count),
        }
    }

    /// Check if a trigger still has pending steps or sounding voices
    pub fn is_active(&self, trigger: TriggerId) -> bool {
        self.triggers.contains_key(&trigger)
    }

    pub fn active_trigger_count(&self) -> usize {
        self.triggers.len()
    }

    pub fn pending_steps(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// Keys currently sounding because of chord triggers, sorted
    pub fn sounding_keys(&self) -> Vec<GridKey> {
        let mut keys: Vec<GridKey> = self.sounding.values().map(|(key, _)| *key).collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

impl<H> Default for ChordStrummer<H> {
    fn default() -> Self {
        Self::new()
    }
}
