//! Block-level properties of the scheduler
//!
//! Multi-block renders checking that no note is dropped, duplicated or left
//! hanging at block boundaries and loop seams.

use mymusic_scheduler::sequencer::groove::quantize_events;
use mymusic_scheduler::sequencer::lookahead::get_next_event_tick;
use mymusic_scheduler::{
    ChannelPattern, Ev, EvKind, Note, PPQ, Pattern, PatternInstance, PatternRegistry, Scheduler,
    TempoSig, Tick, TimeBase,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn scheduler_120_48k() -> Scheduler {
    Scheduler::new(TimeBase::new(48000.0, TempoSig::new(120.0)).unwrap())
}

fn single_note_pattern(length: Tick, note: Note) -> Pattern {
    let mut pattern = Pattern::new(length);
    pattern.add_channel(ChannelPattern::with_notes(1, [note]));
    pattern
}

/// Render `[0, end_sample)` in blocks, returning (absolute sample, event)
fn render(
    scheduler: &Scheduler,
    pattern: &Pattern,
    loop_len: Tick,
    block: u32,
    end_sample: i64,
) -> Vec<(i64, Ev)> {
    let mut all = Vec::new();
    let mut out = Vec::new();
    let mut pos = 0i64;
    while pos < end_sample {
        out.clear();
        scheduler.gather(pattern, 0, loop_len, pos, block, &mut out);
        for ev in &out {
            assert!(ev.sample_offset < block, "offset outside block");
            all.push((pos + ev.sample_offset as i64, *ev));
        }
        pos += block as i64;
    }
    all
}

#[test]
fn test_conversion_round_trip_bounds() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..500 {
        let sample_rate = [22050.0, 44100.0, 48000.0, 88200.0, 96000.0, 192000.0]
            [rng.gen_range(0..6)];
        let bpm = rng.gen_range(20.0..400.0);
        let tb = TimeBase::new(sample_rate, TempoSig::new(bpm)).unwrap();
        let samples_per_tick = tb.samples_per_tick();

        for _ in 0..50 {
            let s: i64 = rng.gen_range(0..100_000_000);
            let back = tb.ticks_to_samples(tb.samples_to_ticks(s));
            // Each conversion loses at most half a unit of its target grid
            assert!(
                ((back - s).abs() as f64) <= samples_per_tick / 2.0 + 1.0,
                "sr={sample_rate} bpm={bpm} s={s} back={back}"
            );

            let t: Tick = rng.gen_range(0..10_000_000);
            let back = tb.samples_to_ticks(tb.ticks_to_samples(t));
            if samples_per_tick >= 1.0 {
                assert!((back - t).abs() <= 1, "sr={sample_rate} bpm={bpm} t={t}");
            }
        }
    }
}

#[test]
fn test_conversion_within_one_sample_when_ticks_are_finer() {
    // 8 kHz at 600 BPM: a tick is 0.83 samples
    let tb = TimeBase::new(8000.0, TempoSig::new(600.0)).unwrap();
    assert!(tb.samples_per_tick() < 1.0);

    for s in 0..100_000 {
        assert!((tb.ticks_to_samples(tb.samples_to_ticks(s)) - s).abs() <= 1);
    }
}

#[test]
fn test_basic_emission() {
    let scheduler = scheduler_120_48k();
    let pattern = single_note_pattern(4 * PPQ, Note::new(0, PPQ, 60, 100));

    let mut out = Vec::new();
    scheduler.gather(&pattern, 0, 0, 0, 1024, &mut out);
    assert_eq!(out, vec![Ev::note_on(1, 0, 60, 100)]);

    // NoteOff at sample 24000 shows up in the block that covers it
    let events = render(&scheduler, &pattern, 4 * PPQ, 1024, 25 * 1024);
    let note_offs: Vec<i64> = events
        .iter()
        .filter(|(_, e)| e.kind == EvKind::NoteOff)
        .map(|(s, _)| *s)
        .collect();
    assert_eq!(note_offs, vec![24000]);
}

#[test]
fn test_loop_seam_multi_block() {
    let scheduler = scheduler_120_48k();
    // Sustains across the seam of every repetition
    let pattern = single_note_pattern(PPQ, Note::new(959, 2, 60, 100));
    let repetitions = 4;
    let end_sample = repetitions * 24000 + 24000;

    for block in [64u32, 256, 1000, 1024, 4096] {
        let events = render(&scheduler, &pattern, repetitions * PPQ, block, end_sample);
        let ons: Vec<i64> = events
            .iter()
            .filter(|(_, e)| e.kind == EvKind::NoteOn)
            .map(|(s, _)| *s)
            .collect();
        let offs: Vec<i64> = events
            .iter()
            .filter(|(_, e)| e.kind == EvKind::NoteOff)
            .map(|(s, _)| *s)
            .collect();

        assert_eq!(ons.len(), repetitions as usize, "block {block}");
        assert_eq!(offs.len(), repetitions as usize, "block {block}");

        for k in 0..repetitions {
            let on = (k * 960 + 959) * 25;
            let off = (k * 960 + 961) * 25;
            // Block-edge rounding moves an event by less than one tick
            assert!((ons[k as usize] - on).abs() < 25, "block {block} rep {k}");
            assert!((offs[k as usize] - off).abs() < 25, "block {block} rep {k}");
        }
    }
}

#[test]
fn test_every_note_on_has_note_off() {
    let scheduler = scheduler_120_48k();
    let mut pattern = Pattern::new(PPQ);
    pattern.add_channel(ChannelPattern::with_notes(
        1,
        (0..8).map(|i| Note::new(i * 120, 150, 60, 100)),
    ));

    // Unbounded loop, odd block size; count ten whole repetitions
    let end = 10 * 24000;
    let events: Vec<(i64, Ev)> = render(&scheduler, &pattern, 0, 333, end)
        .into_iter()
        .filter(|(s, _)| *s < end)
        .collect();
    let ons = events.iter().filter(|(_, e)| e.kind == EvKind::NoteOn).count();
    let offs = events.iter().filter(|(_, e)| e.kind == EvKind::NoteOff).count();

    assert_eq!(ons, 80);
    // The last note of the tenth repetition is still sounding at the end
    assert_eq!(offs, 79);

    assert!(events.windows(2).all(|w| w[0].0 <= w[1].0));
}

#[test]
fn test_tie_break_note_off_before_note_on() {
    let scheduler = scheduler_120_48k();
    let mut pattern = Pattern::new(PPQ);
    pattern.add_channel(ChannelPattern::with_notes(
        1,
        [Note::new(0, 480, 60, 100), Note::new(480, 480, 60, 100)],
    ));

    let mut out = Vec::new();
    scheduler.gather(&pattern, 0, 0, 480 * 25, 256, &mut out);

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].sample_offset, out[1].sample_offset);
    assert_eq!(out[0].kind, EvKind::NoteOff);
    assert_eq!(out[1].kind, EvKind::NoteOn);
}

#[test]
fn test_overlapping_instances_deduplicated() {
    let scheduler = scheduler_120_48k();
    let mut registry = PatternRegistry::new();
    let handle = registry.insert(single_note_pattern(PPQ, Note::new(100, 200, 60, 100)));
    let instances = [
        PatternInstance::new(handle, 0).with_loop_length(4 * PPQ),
        PatternInstance::new(handle, 0).with_loop_length(4 * PPQ),
    ];

    let mut ons = 0;
    let mut offs = 0;
    let mut out = Vec::new();
    let mut pos = 0i64;
    while pos < 4 * 24000 {
        scheduler.gather_realtime(&registry, &instances, pos, 512, &mut out);
        ons += out.iter().filter(|e| e.kind == EvKind::NoteOn).count();
        offs += out.iter().filter(|e| e.kind == EvKind::NoteOff).count();
        pos += 512;
    }

    assert_eq!(ons, 4);
    assert_eq!(offs, 4);
}

#[test]
fn test_quantize_twice_equals_once() {
    let tb = TimeBase::new(44100.0, TempoSig::new(133.0)).unwrap();
    let mut rng = StdRng::seed_from_u64(11);

    for grid in [30, 120, 240, 480, 960] {
        let block_sample = rng.gen_range(0..1_000_000);
        let mut events: Vec<Ev> = (0..32)
            .map(|_| Ev::note_on(1, rng.gen_range(0..2048), 60, 100))
            .collect();

        quantize_events(&tb, &mut events, block_sample, grid);
        let once = events.clone();
        quantize_events(&tb, &mut events, block_sample, grid);

        assert_eq!(events, once, "grid {grid}");
    }
}

#[test]
fn test_lookahead_default_horizon() {
    let mut registry = PatternRegistry::new();
    let handle = registry.insert(single_note_pattern(PPQ, Note::new(0, 10, 60, 100)));
    let instances = [PatternInstance::new(handle, 0)];

    assert_eq!(get_next_event_tick(&registry, &instances, 0), PPQ);
    assert_eq!(get_next_event_tick(&registry, &instances, 5000), 5000 + PPQ);
}
