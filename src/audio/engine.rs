// Audio output - CPAL stream rendering the voice bank
//
// The control loop never touches the stream: it pushes `VoiceCommand`s into a
// lock-free ring buffer, and the callback drains it before rendering each
// buffer. The callback also counts rendered frames into the `AudioClock`,
// which is the time base of the playback engine.
//
// Supported device formats are F32, I16 and U16; rendering is done in f32 and
// converted per frame through cpal's `FromSample<f32>`.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer};

use crate::audio::clock::AudioClock;
use crate::audio::voice_bank::VoiceBank;
use crate::audio::voice_port::{ClickType, VoiceError, VoicePort};
use crate::grid::GridLayout;
use crate::messaging::channels::{CommandConsumer, CommandProducer, create_command_channel};
use crate::messaging::command::{VoiceCommand, VoiceId};
use crate::sequencer::note::GridKey;

/// Default capacity of the command ring buffer
pub const COMMAND_QUEUE_CAPACITY: usize = 1024;

/// A running output stream
///
/// Dropping it stops the sound. The stream is not `Send` on every platform,
/// so keep it on the thread that opened it.
pub struct AudioOutput {
    _stream: Stream,
    clock: AudioClock,
    sample_rate: f32,
    channels: usize,
}

impl AudioOutput {
    /// Open the default output device
    ///
    /// Returns the running output and the voice port feeding it.
    pub fn open(layout: GridLayout) -> Result<(Self, AudioVoicePort), VoiceError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| VoiceError::DeviceUnavailable("no output device".to_string()))?;

        log::info!(
            "audio device: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        );

        let supported_config = device
            .default_output_config()
            .map_err(|e| VoiceError::DeviceUnavailable(e.to_string()))?;
        let sample_format = supported_config.sample_format();
        log::debug!("audio config: {:?}", supported_config);

        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let config: StreamConfig = supported_config.into();

        let (producer, consumer) = create_command_channel(COMMAND_QUEUE_CAPACITY);
        let clock = AudioClock::new(sample_rate);
        let bank = VoiceBank::new(sample_rate);

        let stream = match sample_format {
            SampleFormat::F32 => {
                build_stream::<f32>(&device, &config, channels, consumer, bank, clock.clone())
            }
            SampleFormat::I16 => {
                build_stream::<i16>(&device, &config, channels, consumer, bank, clock.clone())
            }
            SampleFormat::U16 => {
                build_stream::<u16>(&device, &config, channels, consumer, bank, clock.clone())
            }
            other => {
                return Err(VoiceError::DeviceUnavailable(format!(
                    "unsupported sample format {:?}",
                    other
                )));
            }
        }?;

        stream
            .play()
            .map_err(|e| VoiceError::Stream(e.to_string()))?;

        let output = Self {
            _stream: stream,
            clock,
            sample_rate,
            channels,
        };
        Ok((output, AudioVoicePort::new(producer, layout)))
    }

    /// Clock driven by the stream's frame count
    pub fn clock(&self) -> AudioClock {
        self.clock.clone()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    channels: usize,
    mut commands: CommandConsumer,
    mut bank: VoiceBank,
    clock: AudioClock,
) -> Result<Stream, VoiceError>
where
    T: SizedSample + FromSample<f32> + Send + 'static,
{
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // No allocations, no I/O, no locks in here
                while let Some(command) = commands.try_pop() {
                    bank.handle(command);
                }

                for frame in data.chunks_mut(channels) {
                    let sample = bank.next_sample().tanh();
                    for channel_sample in frame.iter_mut() {
                        *channel_sample = Sample::from_sample::<f32>(sample);
                    }
                }

                clock.advance(data.len() / channels.max(1));
            },
            |err| log::error!("audio stream error: {}", err),
            None,
        )
        .map_err(|e| VoiceError::Stream(e.to_string()))
}

/// Voice port feeding an [`AudioOutput`]
pub struct AudioVoicePort {
    commands: CommandProducer,
    layout: GridLayout,
    next_id: VoiceId,
}

impl AudioVoicePort {
    pub fn new(commands: CommandProducer, layout: GridLayout) -> Self {
        Self {
            commands,
            layout,
            next_id: 1,
        }
    }

    fn send(&mut self, command: VoiceCommand) -> Result<(), VoiceError> {
        self.commands
            .try_push(command)
            .map_err(|_| VoiceError::QueueFull)
    }

    /// Ask the callback to fade out everything
    pub fn all_notes_off(&mut self) -> Result<(), VoiceError> {
        self.send(VoiceCommand::AllNotesOff)
    }
}

impl VoicePort for AudioVoicePort {
    type Handle = VoiceId;

    fn start(&mut self, key: GridKey) -> Result<VoiceId, VoiceError> {
        let id = self.next_id;
        self.send(VoiceCommand::NoteOn {
            id,
            frequency: self.layout.frequency(key),
        })?;
        self.next_id += 1;
        Ok(id)
    }

    fn stop(&mut self, handle: VoiceId) -> Result<(), VoiceError> {
        self.send(VoiceCommand::NoteOff { id: handle })
    }

    fn click(&mut self, click_type: ClickType) -> Result<(), VoiceError> {
        self.send(VoiceCommand::Click(click_type))
    }
}
