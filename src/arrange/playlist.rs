// Playlist - clips on the arrangement timeline
// Bridges timeline clips to the pattern instances the scheduler consumes

use crate::sequencer::instance::PatternInstance;
use crate::sequencer::pattern::PatternRegistry;
use crate::sequencer::timeline::Tick;

/// A pattern clip on the playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clip {
    /// User-facing pattern id, resolved through the registry
    pub pattern_id: u32,
    /// Clip start in ticks
    pub start: Tick,
    /// Clip length in ticks; 0 = the pattern's own length
    pub len: Tick,
    pub muted: bool,
}

impl Clip {
    pub fn new(pattern_id: u32, start: Tick, len: Tick) -> Self {
        Self {
            pattern_id,
            start,
            len,
            muted: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Playlist {
    pub clips: Vec<Clip>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_clip(&mut self, clip: Clip) {
        self.clips.push(clip);
    }
}

/// Build the instance list for the current playback set.
/// Clips whose pattern id is unknown are skipped.
pub fn build_pattern_instances(
    playlist: &Playlist,
    registry: &PatternRegistry,
) -> Vec<PatternInstance> {
    playlist
        .clips
        .iter()
        .filter_map(|clip| {
            let Some(handle) = registry.handle_for_id(clip.pattern_id) else {
                tracing::debug!(pattern_id = clip.pattern_id, "clip references unknown pattern");
                return None;
            };
            Some(PatternInstance {
                muted: clip.muted,
                ..PatternInstance::new(handle, clip.start).with_loop_length(clip.len.max(0))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::pattern::Pattern;
    use crate::sequencer::timeline::PPQ;

    #[test]
    fn test_build_instances() {
        let mut registry = PatternRegistry::new();
        let handle = registry.insert(Pattern::new(PPQ));
        registry.register_id(1, handle);

        let mut playlist = Playlist::new();
        playlist.add_clip(Clip::new(1, 0, 4 * PPQ));
        playlist.add_clip(Clip::new(99, 0, 0)); // unknown
        playlist.add_clip(Clip {
            muted: true,
            ..Clip::new(1, 8 * PPQ, 0)
        });

        let instances = build_pattern_instances(&playlist, &registry);

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].pattern, Some(handle));
        assert_eq!(instances[0].start_tick, 0);
        assert_eq!(instances[0].loop_length_ticks, 4 * PPQ);
        assert!(!instances[0].muted);
        assert_eq!(instances[1].start_tick, 8 * PPQ);
        assert_eq!(instances[1].loop_length_ticks, 0);
        assert!(instances[1].muted);
    }

    #[test]
    fn test_removed_pattern_drops_clip() {
        let mut registry = PatternRegistry::new();
        let handle = registry.insert(Pattern::new(PPQ));
        registry.register_id(1, handle);
        registry.remove(handle);

        let mut playlist = Playlist::new();
        playlist.add_clip(Clip::new(1, 0, 0));

        assert!(build_pattern_instances(&playlist, &registry).is_empty());
    }
}
