// Messaging - lock-free hand-off between the sequencer and its consumers

pub mod channels;

pub use channels::{DispatchError, EventConsumer, EventProducer, create_event_channel};
