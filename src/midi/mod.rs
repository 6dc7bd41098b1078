// MIDI module - scheduled event types and their wire encoding

pub mod event;

pub use event::{Ev, EvKind, PITCH_BEND_MAX, PITCH_BEND_MIN, sort_events};
