// Lookahead - playhead prediction over raw pattern data
// Not for the audio thread: these scan every note and ignore loop repetitions.

use crate::sequencer::instance::PatternInstance;
use crate::sequencer::pattern::PatternRegistry;
use crate::sequencer::timeline::{PPQ, Tick};

/// Absolute (start, end) of every note in the first placement of each
/// enabled instance. Muted clips still occupy the timeline.
fn first_placement_notes<'a>(
    registry: &'a PatternRegistry,
    instances: &'a [PatternInstance],
) -> impl Iterator<Item = (Tick, Tick)> + 'a {
    instances
        .iter()
        .filter(|instance| instance.enabled)
        .filter_map(move |instance| {
            let pattern = registry.get(instance.pattern?)?;
            Some((instance, pattern))
        })
        .flat_map(|(instance, pattern)| {
            pattern.channels.iter().flat_map(move |channel| {
                channel.notes().iter().map(move |note| {
                    let start = instance.start_tick.saturating_add(note.start);
                    (start, start.saturating_add(note.len.max(0)))
                })
            })
        })
}

/// Earliest note start strictly after `current_tick`, or one quarter note
/// ahead when nothing follows.
pub fn get_next_event_tick(
    registry: &PatternRegistry,
    instances: &[PatternInstance],
    current_tick: Tick,
) -> Tick {
    first_placement_notes(registry, instances)
        .map(|(start, _)| start)
        .filter(|&start| start > current_tick)
        .min()
        .unwrap_or(current_tick.saturating_add(PPQ))
}

/// Whether any note interval intersects `[start_tick, end_tick)`
pub fn has_events_in_range(
    registry: &PatternRegistry,
    instances: &[PatternInstance],
    start_tick: Tick,
    end_tick: Tick,
) -> bool {
    first_placement_notes(registry, instances)
        .any(|(start, end)| start < end_tick && end > start_tick)
}
