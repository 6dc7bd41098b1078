// Scheduled MIDI events
// Block-scoped, sample-accurate output of the scheduler

use crate::sequencer::pattern::GeneratorId;

pub const PITCH_BEND_MIN: i32 = -8192;
pub const PITCH_BEND_MAX: i32 = 8191;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvKind {
    NoteOn,
    NoteOff,
    PitchBend,
}

impl EvKind {
    /// Tie-break rank at equal sample offsets: NoteOff sorts first so a
    /// retrigger on the same sample is never cut by the previous note's end.
    #[inline]
    pub fn order(self) -> u8 {
        match self {
            EvKind::NoteOff => 0,
            EvKind::NoteOn | EvKind::PitchBend => 1,
        }
    }

    /// Rank among kinds sharing the same `order()`
    #[inline]
    fn rank(self) -> u8 {
        match self {
            EvKind::NoteOff => 0,
            EvKind::NoteOn => 1,
            EvKind::PitchBend => 2,
        }
    }
}

/// Event with sample-accurate timing inside the current block
/// `sample_offset` is relative to the block's first sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ev {
    pub generator_id: GeneratorId,
    pub kind: EvKind,
    pub sample_offset: u32,
    pub pitch: u8,
    pub velocity: u8,
    /// Signed 14-bit bend, only meaningful for `PitchBend`
    pub bend: i32,
}

impl Ev {
    pub fn note_on(generator_id: GeneratorId, sample_offset: u32, pitch: u8, velocity: u8) -> Self {
        Self {
            generator_id,
            kind: EvKind::NoteOn,
            sample_offset,
            pitch,
            velocity,
            bend: 0,
        }
    }

    pub fn note_off(generator_id: GeneratorId, sample_offset: u32, pitch: u8, velocity: u8) -> Self {
        Self {
            generator_id,
            kind: EvKind::NoteOff,
            sample_offset,
            pitch,
            velocity,
            bend: 0,
        }
    }

    pub fn pitch_bend(generator_id: GeneratorId, sample_offset: u32, pitch: u8, bend: i32) -> Self {
        Self {
            generator_id,
            kind: EvKind::PitchBend,
            sample_offset,
            pitch,
            velocity: 0,
            bend: bend.clamp(PITCH_BEND_MIN, PITCH_BEND_MAX),
        }
    }

    /// Same musical event: generator, kind, offset, pitch and velocity match
    #[inline]
    pub fn is_duplicate_of(&self, other: &Ev) -> bool {
        self.generator_id == other.generator_id
            && self.kind == other.kind
            && self.sample_offset == other.sample_offset
            && self.pitch == other.pitch
            && self.velocity == other.velocity
    }

    /// Encode as a raw 3-byte MIDI message on `channel` (0-15)
    pub fn to_midi_bytes(&self, channel: u8) -> [u8; 3] {
        let channel = channel & 0x0F;
        match self.kind {
            EvKind::NoteOn => [0x90 | channel, self.pitch & 0x7F, self.velocity & 0x7F],
            EvKind::NoteOff => [0x80 | channel, self.pitch & 0x7F, self.velocity & 0x7F],
            EvKind::PitchBend => {
                // Signed bend re-centred on 8192
                let value = (self.bend.clamp(PITCH_BEND_MIN, PITCH_BEND_MAX) + 8192) as u16;
                let lsb = (value & 0x7F) as u8;
                let msb = ((value >> 7) & 0x7F) as u8;
                [0xE0 | channel, lsb, msb]
            }
        }
    }
}

/// Sort events by sample offset, NoteOff first on ties.
///
/// In place and allocation-free: the key is total over every field, so the
/// unstable sort still gives one deterministic order.
pub fn sort_events(events: &mut [Ev]) {
    events.sort_unstable_by_key(|e| {
        (
            e.sample_offset,
            e.kind.order(),
            e.kind.rank(),
            e.generator_id,
            e.pitch,
            e.velocity,
            e.bend,
        )
    });
}
