//! Offline pattern render
//!
//! Builds a small drum/bass arrangement, runs the sequencer for two bars of
//! audio blocks and logs every scheduled event.
//!
//! Usage: render_pattern [config.ron]
//! Set RUST_LOG=debug for configuration details.

use mymusic_scheduler::sequencer::lookahead::get_next_event_tick;
use mymusic_scheduler::{
    ChannelPattern, Clip, Note, PPQ, Pattern, PatternRegistry, Playlist, SchedulerConfig,
    SequencerPlayer, build_pattern_instances, create_event_channel,
};
use ringbuf::traits::Consumer;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn demo_registry() -> PatternRegistry {
    let mut registry = PatternRegistry::new();

    // Four-on-the-floor kick with an off-beat hat
    let mut drums = Pattern::new(4 * PPQ);
    drums.add_channel(ChannelPattern::with_notes(
        1,
        (0..4).map(|beat| Note::new(beat * PPQ, PPQ / 4, 36, 110)),
    ));
    drums.add_channel(ChannelPattern::with_notes(
        2,
        (0..4).map(|beat| Note::new(beat * PPQ + PPQ / 2, PPQ / 8, 42, 80)),
    ));
    let drums = registry.insert(drums);
    registry.register_id(1, drums);

    // Bass with a slide into the last note
    let mut bass = Pattern::new(2 * PPQ);
    bass.add_channel(ChannelPattern::with_notes(
        3,
        [
            Note::new(0, PPQ / 2, 40, 100),
            Note::new(PPQ, PPQ / 2, 43, 100).with_slide(32),
        ],
    ));
    let bass = registry.insert(bass);
    registry.register_id(2, bass);

    registry
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SchedulerConfig::load(path)?,
        None => SchedulerConfig::default(),
    };

    let registry = demo_registry();
    let mut playlist = Playlist::new();
    playlist.add_clip(Clip::new(1, 0, 8 * PPQ));
    playlist.add_clip(Clip::new(2, 0, 8 * PPQ));
    let instances = build_pattern_instances(&playlist, &registry);

    let mut player = SequencerPlayer::from_config(&config)?;
    let (mut tx, mut rx) = create_event_channel(config.event_capacity);

    let time_base = config.time_base()?;
    let end_sample = time_base.ticks_to_samples(8 * PPQ);
    info!(
        tempo = %config.tempo,
        sample_rate = config.sample_rate,
        block_size = config.block_size,
        "rendering two bars"
    );

    let mut total = 0;
    while player.position() < end_sample {
        let block_start = player.position();
        player.process_block(&registry, &instances, config.block_size);
        player.dispatch(&mut tx)?;

        while let Some(ev) = rx.try_pop() {
            total += 1;
            info!(
                sample = block_start + ev.sample_offset as i64,
                generator = ev.generator_id,
                kind = ?ev.kind,
                pitch = ev.pitch,
                velocity = ev.velocity,
                bend = ev.bend,
                "event"
            );
        }
    }

    let next = get_next_event_tick(&registry, &instances, PPQ / 2);
    info!(total, next_after_eighth = next, "render complete");
    Ok(())
}
