// Shared helpers for integration tests

#![allow(dead_code)]

use chordgrid::sequencer::GridKey;
use chordgrid::{ClickType, VoiceError, VoicePort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Start(GridKey, u64),
    Stop(u64),
    Click(ClickType),
}

/// Voice port that records every call
#[derive(Default)]
pub struct RecordingVoices {
    pub events: Vec<Event>,
    next_handle: u64,
    /// Start calls left before every start fails (`None` = never fail)
    pub starts_before_failure: Option<usize>,
}

impl RecordingVoices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started(&self) -> Vec<GridKey> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Start(key, _) => Some(*key),
                _ => None,
            })
            .collect()
    }

    pub fn stops(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Stop(_)))
            .count()
    }

    pub fn clicks(&self) -> Vec<ClickType> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Click(click) => Some(*click),
                _ => None,
            })
            .collect()
    }

    /// Keys started and not yet stopped
    pub fn sounding(&self) -> Vec<GridKey> {
        let mut keys: Vec<GridKey> = self
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Start(key, handle)
                    if !self.events.contains(&Event::Stop(*handle)) =>
                {
                    Some(*key)
                }
                _ => None,
            })
            .collect();
        keys.sort();
        keys
    }
}

impl VoicePort for RecordingVoices {
    type Handle = u64;

    fn start(&mut self, key: GridKey) -> Result<u64, VoiceError> {
        if let Some(left) = self.starts_before_failure.as_mut() {
            if *left == 0 {
                return Err(VoiceError::QueueFull);
            }
            *left -= 1;
        }
        self.next_handle += 1;
        self.events.push(Event::Start(key, self.next_handle));
        Ok(self.next_handle)
    }

    fn stop(&mut self, handle: u64) -> Result<(), VoiceError> {
        self.events.push(Event::Stop(handle));
        Ok(())
    }

    fn click(&mut self, click_type: ClickType) -> Result<(), VoiceError> {
        self.events.push(Event::Click(click_type));
        Ok(())
    }
}

pub fn key(x: u16, y: u16) -> GridKey {
    GridKey::new(x, y)
}
