// Note representation for the sequencer
// A note is a pitch with a start and a length in ticks, relative to its pattern

use crate::sequencer::timeline::Tick;

/// A musical note in a pattern channel
///
/// Positions are stored in ticks so that tempo changes never move notes.
/// A note with `len == 0` is a trigger: it produces a NoteOn but never a NoteOff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    /// Start position in ticks from the pattern start
    pub start: Tick,

    /// Length in ticks
    pub len: Tick,

    /// MIDI note number (0-127, where 60 = C4)
    pub pitch: u8,

    /// NoteOn velocity
    pub velocity: u8,

    /// NoteOff (release) velocity
    pub release_velocity: u8,

    /// Glide the pitch from 0 to `fine_bend` over the note's length
    pub slide: bool,

    /// Bend target used by slides
    pub fine_bend: i32,
}

impl Note {
    /// Creates a new note with default release velocity and no slide
    pub fn new(start: Tick, len: Tick, pitch: u8, velocity: u8) -> Self {
        Self {
            start: start.max(0),
            len: len.max(0),
            pitch,
            velocity,
            release_velocity: 64,
            slide: false,
            fine_bend: 0,
        }
    }

    /// Turns this note into a slide towards `fine_bend`
    pub fn with_slide(mut self, fine_bend: i32) -> Self {
        self.slide = true;
        self.fine_bend = fine_bend;
        self
    }

    /// Sets the NoteOff velocity
    pub fn with_release_velocity(mut self, release_velocity: u8) -> Self {
        self.release_velocity = release_velocity;
        self
    }
}

impl Default for Note {
    fn default() -> Self {
        Self::new(0, 0, 60, 100)
    }
}
