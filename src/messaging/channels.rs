// Lock-free command channel

use crate::messaging::command::VoiceCommand;
use ringbuf::{HeapRb, traits::Split};

pub type CommandProducer = ringbuf::HeapProd<VoiceCommand>;
pub type CommandConsumer = ringbuf::HeapCons<VoiceCommand>;

pub fn create_command_channel(capacity: usize) -> (CommandProducer, CommandConsumer) {
    let rb = HeapRb::<VoiceCommand>::new(capacity);
    rb.split()
}
