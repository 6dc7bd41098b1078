// Scheduler - extracts sample-accurate events from looping patterns
// Runs once per audio block on the audio thread: no locks, no allocation
// beyond appends to the caller's reused buffer.

use crate::midi::event::{Ev, sort_events};
use crate::sequencer::instance::PatternInstance;
use crate::sequencer::note::Note;
use crate::sequencer::pattern::{GeneratorId, Pattern, PatternRegistry};
use crate::sequencer::timeline::{Tick, TimeBase};

/// Spacing of generated pitch-bend points along a sliding note
pub const BEND_STEP_TICKS: Tick = 64;

/// Scale applied to `fine_bend` before clamping to the 14-bit range
const BEND_SCALE: f64 = 64.0;

/// Where and how a pattern is played for one gather pass
#[derive(Debug, Clone, Copy)]
struct Placement {
    start: Tick,
    /// 0 = loop forever
    loop_len: Tick,
    transpose: i32,
    gain: f32,
}

impl Placement {
    fn raw(start: Tick, loop_len: Tick) -> Self {
        Self {
            start,
            loop_len,
            transpose: 0,
            gain: 1.0,
        }
    }

    fn from_instance(instance: &PatternInstance, pattern: &Pattern) -> Self {
        Self {
            start: instance.start_tick,
            loop_len: instance.effective_loop_length(pattern),
            transpose: instance.transpose,
            gain: instance.gain,
        }
    }

    #[inline]
    fn pitch(&self, pitch: u8) -> u8 {
        if self.transpose == 0 {
            pitch
        } else {
            (pitch as i32 + self.transpose).clamp(0, 127) as u8
        }
    }

    #[inline]
    fn velocity(&self, velocity: u8) -> u8 {
        if self.gain == 1.0 || !self.gain.is_finite() || self.gain <= 0.0 {
            velocity
        } else {
            ((velocity as f32 * self.gain).round() as i32).clamp(1, 127) as u8
        }
    }
}

/// Block being rendered, in samples and in ticks
#[derive(Debug, Clone, Copy)]
struct Block {
    start_sample: i64,
    frames: u32,
    /// [tick_begin, tick_end)
    tick_begin: Tick,
    tick_end: Tick,
}

impl Block {
    #[inline]
    fn contains(&self, tick: Tick) -> bool {
        tick >= self.tick_begin && tick < self.tick_end
    }
}

/// Per-block event scheduler
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler {
    time_base: TimeBase,
}

impl Scheduler {
    pub fn new(time_base: TimeBase) -> Self {
        Self { time_base }
    }

    pub fn set_time_base(&mut self, time_base: TimeBase) {
        self.time_base = time_base;
    }

    pub fn time_base(&self) -> &TimeBase {
        &self.time_base
    }

    /// Append the events of one pattern for the block
    /// `[block_sample, block_sample + frames)` to `out`, then sort `out`.
    ///
    /// `loop_len_tick` bounds how many repetitions of the pattern play after
    /// `clip_start_tick`; 0 loops forever.
    pub fn gather(
        &self,
        pattern: &Pattern,
        clip_start_tick: Tick,
        loop_len_tick: Tick,
        block_sample: i64,
        frames: u32,
        out: &mut Vec<Ev>,
    ) {
        let block = self.block(block_sample, frames);
        self.gather_placed(
            pattern,
            &Placement::raw(clip_start_tick, loop_len_tick),
            &block,
            out,
        );
        sort_events(out);
    }

    /// Real-time entry point: gather every enabled instance for one block.
    ///
    /// Clears `out`, then fills it with the sorted, de-duplicated events of the
    /// block. Disabled, muted or dangling instances are skipped.
    pub fn gather_realtime(
        &self,
        registry: &PatternRegistry,
        instances: &[PatternInstance],
        block_sample: i64,
        frames: u32,
        out: &mut Vec<Ev>,
    ) {
        out.clear();
        let block = self.block(block_sample, frames);

        for instance in instances {
            let Some(pattern) = instance.resolve(registry) else {
                continue;
            };
            let placement = Placement::from_instance(instance, pattern);
            self.gather_placed(pattern, &placement, &block, out);
        }

        // One sort over all instances; the key is total so the order is fixed
        sort_events(out);
        dedup_events(out);

        tracing::trace!(block_sample, frames, events = out.len(), "block gathered");
    }

    fn block(&self, start_sample: i64, frames: u32) -> Block {
        Block {
            start_sample,
            frames,
            tick_begin: self.time_base.samples_to_ticks(start_sample),
            tick_end: self.time_base.samples_to_ticks(start_sample + frames as i64),
        }
    }

    fn gather_placed(
        &self,
        pattern: &Pattern,
        placement: &Placement,
        block: &Block,
        out: &mut Vec<Ev>,
    ) {
        if !pattern.is_schedulable() || block.frames == 0 || block.tick_end <= block.tick_begin {
            return;
        }
        let length = pattern.length;

        // One pattern length of margin on both sides of the block
        let search_start = (block.tick_begin - length).max(0);
        let search_end = block.tick_end + length;

        // Repetitions allowed by the clip: offsets k * length < loop_len
        let last_repetition = if placement.loop_len > 0 {
            Some((placement.loop_len - 1) / length)
        } else {
            None
        };

        for channel in pattern.channels.iter().filter(|c| c.is_active()) {
            for note in channel.notes() {
                let first_start = placement.start + note.start;
                if first_start >= search_end {
                    // Notes are ordered by start
                    break;
                }
                let first_end = first_start + note.len.max(0);

                // Repetitions k whose note overlaps [search_start, search_end)
                let k_lo = if first_end > search_start {
                    0
                } else {
                    (search_start - first_end) / length + 1
                };
                let mut k_hi = (search_end - 1 - first_start) / length;
                if let Some(last) = last_repetition {
                    k_hi = k_hi.min(last);
                }

                for k in k_lo..=k_hi {
                    let absolute_start = first_start + k * length;
                    self.emit_note(channel.generator_id, note, absolute_start, placement, block, out);
                }
            }
        }
    }

    fn emit_note(
        &self,
        generator_id: GeneratorId,
        note: &Note,
        absolute_start: Tick,
        placement: &Placement,
        block: &Block,
        out: &mut Vec<Ev>,
    ) {
        let len = note.len.max(0);
        let absolute_end = absolute_start + len;
        let pitch = placement.pitch(note.pitch);

        if block.contains(absolute_start) {
            out.push(Ev::note_on(
                generator_id,
                self.offset_in_block(absolute_start, block),
                pitch,
                placement.velocity(note.velocity),
            ));
        }

        if len > 0 && block.contains(absolute_end) {
            out.push(Ev::note_off(
                generator_id,
                self.offset_in_block(absolute_end, block),
                pitch,
                note.release_velocity,
            ));
        }

        if note.slide && note.fine_bend != 0 && len > 0 {
            let visible_start = absolute_start.max(block.tick_begin);
            let visible_end = absolute_end.min(block.tick_end);
            if visible_start >= visible_end {
                return;
            }

            // Bend points sit on the note's own grid, independent of block size
            let steps = (visible_start - absolute_start + BEND_STEP_TICKS - 1) / BEND_STEP_TICKS;
            let mut tick = absolute_start + steps * BEND_STEP_TICKS;
            while tick < visible_end {
                let progress = (tick - absolute_start) as f64 / len as f64;
                let bend = (note.fine_bend as f64 * progress * BEND_SCALE)
                    .clamp(i32::MIN as f64, i32::MAX as f64) as i32;
                out.push(Ev::pitch_bend(
                    generator_id,
                    self.offset_in_block(tick, block),
                    pitch,
                    bend,
                ));
                tick += BEND_STEP_TICKS;
            }
        }
    }

    /// Sample offset of `tick` inside the block, clamped to `[0, frames)`
    #[inline]
    fn offset_in_block(&self, tick: Tick, block: &Block) -> u32 {
        let sample = self.time_base.ticks_to_samples(tick);
        (sample - block.start_sample).clamp(0, block.frames as i64 - 1) as u32
    }
}

/// Remove repeated events from a sorted list, keeping the first occurrence.
///
/// Events only compare against those already kept at the same sample offset,
/// so duplicates are caught even when other events sit between them.
pub fn dedup_events(events: &mut Vec<Ev>) {
    let mut kept = 0;
    let mut run_start = 0;

    for read in 0..events.len() {
        let ev = events[read];
        if kept > 0 && events[kept - 1].sample_offset != ev.sample_offset {
            run_start = kept;
        }
        if !events[run_start..kept].iter().any(|k| k.is_duplicate_of(&ev)) {
            events[kept] = ev;
            kept += 1;
        }
    }

    events.truncate(kept);
}
