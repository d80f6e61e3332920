// Audio module - Clocks, the voice port and the CPAL backend

pub mod clock;
pub mod engine;
pub mod voice_bank;
pub mod voice_port;
