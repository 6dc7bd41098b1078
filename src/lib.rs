// MyMusic Scheduler - Library exports for tests and benchmarks

pub mod arrange;
pub mod config;
pub mod messaging;
pub mod midi;
pub mod sequencer;

// Re-export commonly used types for convenience
pub use arrange::{Clip, Playlist, build_pattern_instances};
pub use config::{ConfigError, SchedulerConfig};
pub use messaging::channels::{DispatchError, create_event_channel};
pub use midi::event::{Ev, EvKind};
pub use sequencer::{
    ChannelPattern, GrooveSettings, Note, PPQ, Pattern, PatternHandle, PatternInstance,
    PatternRegistry, Scheduler, SequencerPlayer, SharedTimeBase, TempoSig, Tick, TimeBase,
};
