// Pattern instance - placement of a pattern on the master timeline
// Rebuilt whenever the active playback set changes, never persisted

use crate::sequencer::pattern::{PatternHandle, PatternRegistry, Pattern};
use crate::sequencer::timeline::Tick;

/// A pattern placed on the timeline with loop/mute/transpose overrides
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternInstance {
    /// Pattern to play. `None` is skipped.
    pub pattern: Option<PatternHandle>,

    /// Placement on the master timeline
    pub start_tick: Tick,

    /// Clip length in ticks; 0 = use the pattern's own length
    pub loop_length_ticks: Tick,

    pub enabled: bool,
    pub muted: bool,

    /// NoteOn velocity scale
    pub gain: f32,

    /// Semitones added to every pitch
    pub transpose: i32,
}

impl PatternInstance {
    /// Place `pattern` at `start_tick` with no overrides
    pub fn new(pattern: PatternHandle, start_tick: Tick) -> Self {
        Self {
            pattern: Some(pattern),
            start_tick,
            ..Self::default()
        }
    }

    pub fn with_loop_length(mut self, loop_length_ticks: Tick) -> Self {
        self.loop_length_ticks = loop_length_ticks;
        self
    }

    pub fn with_transpose(mut self, transpose: i32) -> Self {
        self.transpose = transpose;
        self
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    /// Whether this instance takes part in playback at all
    pub fn is_audible(&self) -> bool {
        self.enabled && !self.muted
    }

    /// Resolve the pattern if this instance is audible and its handle is live
    pub fn resolve<'a>(&self, registry: &'a PatternRegistry) -> Option<&'a Pattern> {
        if !self.is_audible() {
            return None;
        }
        registry.get(self.pattern?)
    }

    /// Loop length actually used for scheduling
    pub fn effective_loop_length(&self, pattern: &Pattern) -> Tick {
        if self.loop_length_ticks > 0 {
            self.loop_length_ticks
        } else {
            pattern.length
        }
    }
}

impl Default for PatternInstance {
    fn default() -> Self {
        Self {
            pattern: None,
            start_tick: 0,
            loop_length_ticks: 0,
            enabled: true,
            muted: false,
            gain: 1.0,
            transpose: 0,
        }
    }
}
