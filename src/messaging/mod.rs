// Messaging between the control loop and the audio thread

pub mod channels;
pub mod command;
