// Pattern - Channels of notes forming a loopable sequence
// Patterns live in a registry and are referenced by handle from the timeline

use crate::sequencer::note::Note;
use crate::sequencer::timeline::{PPQ, Tick};
use std::collections::HashMap;

/// Identifier correlating a channel to a downstream voice or pad.
/// `0` means the channel is unassigned.
pub type GeneratorId = u32;

/// Notes played by one generator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelPattern {
    pub generator_id: GeneratorId,
    notes: Vec<Note>,
}

impl ChannelPattern {
    /// Create an empty channel for a generator
    pub fn new(generator_id: GeneratorId) -> Self {
        Self {
            generator_id,
            notes: Vec::new(),
        }
    }

    /// Create a channel from a list of notes
    pub fn with_notes(generator_id: GeneratorId, notes: impl IntoIterator<Item = Note>) -> Self {
        let mut channel = Self::new(generator_id);
        for note in notes {
            channel.add_note(note);
        }
        channel
    }

    /// Channels with generator id 0 are never scheduled
    pub fn is_active(&self) -> bool {
        self.generator_id != 0
    }

    /// Get all notes, ordered by start tick
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Add a note, keeping notes sorted by start position
    pub fn add_note(&mut self, note: Note) {
        let insert_pos = self
            .notes
            .partition_point(|n| n.start <= note.start);

        self.notes.insert(insert_pos, note);
    }

    /// Remove the note at `index`
    pub fn remove_note(&mut self, index: usize) -> Option<Note> {
        (index < self.notes.len()).then(|| self.notes.remove(index))
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// A pattern: musical content placed on the timeline by instances
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    /// Loop length in ticks. Patterns with `length <= 0` are never scheduled.
    pub length: Tick,
    pub channels: Vec<ChannelPattern>,
}

impl Pattern {
    /// Create a new empty pattern
    pub fn new(length: Tick) -> Self {
        Self {
            length,
            channels: Vec::new(),
        }
    }

    /// Create a one-bar (4/4) pattern
    pub fn new_default() -> Self {
        Self::new(PPQ * 4)
    }

    /// Add a channel, returning its index
    pub fn add_channel(&mut self, channel: ChannelPattern) -> usize {
        self.channels.push(channel);
        self.channels.len() - 1
    }

    /// Find the channel driving `generator_id`
    pub fn channel_mut(&mut self, generator_id: GeneratorId) -> Option<&mut ChannelPattern> {
        self.channels
            .iter_mut()
            .find(|c| c.generator_id == generator_id)
    }

    /// Whether this pattern can produce any events at all
    pub fn is_schedulable(&self) -> bool {
        self.length > 0
    }

    /// Total number of notes across channels
    pub fn note_count(&self) -> usize {
        self.channels.iter().map(|c| c.notes().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.note_count() == 0
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new_default()
    }
}

/// Stable handle to a pattern stored in a [`PatternRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternHandle(u32);

impl PatternHandle {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Owns every pattern of a project
///
/// Removed slots are tombstoned so outstanding handles keep pointing at
/// nothing instead of at a different pattern.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    slots: Vec<Option<Pattern>>,
    by_id: HashMap<u32, PatternHandle>,
}

impl PatternRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a pattern and return its handle
    pub fn insert(&mut self, pattern: Pattern) -> PatternHandle {
        let handle = PatternHandle(self.slots.len() as u32);
        self.slots.push(Some(pattern));
        handle
    }

    /// Resolve a handle. Removed or unknown handles give `None`.
    pub fn get(&self, handle: PatternHandle) -> Option<&Pattern> {
        self.slots.get(handle.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, handle: PatternHandle) -> Option<&mut Pattern> {
        self.slots.get_mut(handle.index()).and_then(Option::as_mut)
    }

    /// Replace the pattern behind `handle`, returning the old one
    pub fn replace(&mut self, handle: PatternHandle, pattern: Pattern) -> Option<Pattern> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.is_none() {
            return None;
        }
        slot.replace(pattern)
    }

    /// Remove a pattern. Its handle (and any id mapped to it) stops resolving.
    pub fn remove(&mut self, handle: PatternHandle) -> Option<Pattern> {
        let removed = self.slots.get_mut(handle.index())?.take();
        if removed.is_some() {
            self.by_id.retain(|_, h| *h != handle);
        }
        removed
    }

    /// Map a user-facing pattern id (as used by playlist clips) to a handle
    pub fn register_id(&mut self, id: u32, handle: PatternHandle) {
        self.by_id.insert(id, handle);
    }

    pub fn handle_for_id(&self, id: u32) -> Option<PatternHandle> {
        self.by_id.get(&id).copied()
    }

    /// Number of live patterns
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
