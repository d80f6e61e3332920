// Voice port - Black-box interface to whatever produces sound
// The engine only starts voices, stops them by handle, and fires clicks

use std::collections::HashSet;

use thiserror::Error;

use crate::grid::GridLayout;
use crate::sequencer::note::GridKey;

/// Errors reported by a voice backend
#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Voice command queue is full")]
    QueueFull,

    #[error("Audio stream error: {0}")]
    Stream(String),
}

/// Metronome click type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickType {
    /// First bar of the loop
    Accent,
    /// Any other bar boundary
    Regular,
}

/// Something that can sound a pitch
///
/// Handles are opaque to the engine. `stop` consumes the handle, so a voice
/// cannot be stopped twice through the engine.
pub trait VoicePort {
    type Handle;

    /// Start a voice for the given key
    fn start(&mut self, key: GridKey) -> Result<Self::Handle, VoiceError>;

    /// Stop a voice previously returned by `start`
    fn stop(&mut self, handle: Self::Handle) -> Result<(), VoiceError>;

    /// Fire a short, self-terminating metronome click
    fn click(&mut self, click_type: ClickType) -> Result<(), VoiceError>;
}

/// Voice port without audio output
///
/// Used when no audio device is available: every voice event is logged,
/// which is enough to follow the engine from the console.
pub struct LogVoicePort {
    layout: GridLayout,
    next_handle: u64,
    sounding: HashSet<u64>,
}

impl LogVoicePort {
    pub fn new(layout: GridLayout) -> Self {
        Self {
            layout,
            next_handle: 1,
            sounding: HashSet::new(),
        }
    }

    /// Number of voices started and not yet stopped
    pub fn sounding_count(&self) -> usize {
        self.sounding.len()
    }
}

impl VoicePort for LogVoicePort {
    type Handle = u64;

    fn start(&mut self, key: GridKey) -> Result<u64, VoiceError> {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.sounding.insert(handle);
        log::info!(
            "voice #{} on  {} {} ({:.1} Hz)",
            handle,
            key,
            self.layout.label(key),
            self.layout.frequency(key)
        );
        Ok(handle)
    }

    fn stop(&mut self, handle: u64) -> Result<(), VoiceError> {
        self.sounding.remove(&handle);
        log::info!("voice #{} off", handle);
        Ok(())
    }

    fn click(&mut self, click_type: ClickType) -> Result<(), VoiceError> {
        log::info!("click {:?}", click_type);
        Ok(())
    }
}
