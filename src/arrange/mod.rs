// Arrangement - timeline clips feeding the scheduler

pub mod playlist;

pub use playlist::{Clip, Playlist, build_pattern_instances};
