// Sequencer module
// Musical time, pattern data and the per-block event scheduler

pub mod groove;
pub mod instance;
pub mod lookahead;
pub mod note;
pub mod pattern;
pub mod player;
pub mod scheduler;
pub mod timeline;

pub use groove::{GrooveSettings, apply_humanize, apply_humanize_with, apply_swing, quantize_events};
pub use instance::PatternInstance;
pub use lookahead::{get_next_event_tick, has_events_in_range};
pub use note::Note;
pub use pattern::{ChannelPattern, GeneratorId, Pattern, PatternHandle, PatternRegistry};
pub use player::SequencerPlayer;
pub use scheduler::{BEND_STEP_TICKS, Scheduler, dedup_events};
pub use timeline::{PPQ, SharedTimeBase, TempoSig, Tick, TimeBase, TimingError};
