// Groove - post-processing passes over a block's event list
// Swing, humanize and quantize all work on absolute tick positions,
// so they need the block's first sample.

use crate::midi::event::{Ev, EvKind, sort_events};
use crate::sequencer::timeline::{PPQ, Tick, TimeBase};
use rand::Rng;

/// Delay NoteOns that fall exactly on the off-beat of `swing_resolution`.
///
/// No-op when `swing_percent <= 50` or `swing_resolution <= 0`. Only notes whose
/// tick modulo the resolution is exactly half of it move; there is no
/// tolerance window.
pub fn apply_swing(
    time_base: &TimeBase,
    events: &mut [Ev],
    block_sample: i64,
    swing_percent: f32,
    swing_resolution: Tick,
) {
    if !swing_percent.is_finite() || swing_percent <= 50.0 || swing_resolution <= 0 {
        return;
    }

    // Past 100% the off-beat would cross the next down-beat
    let amount = (swing_percent.min(100.0) / 100.0 - 0.5) * 2.0;
    let half_resolution = swing_resolution / 2;
    let swing_ticks = (half_resolution as f32 * amount * 0.25) as Tick;

    for ev in events.iter_mut().filter(|e| e.kind == EvKind::NoteOn) {
        let tick = time_base.samples_to_ticks(block_sample + ev.sample_offset as i64);
        if tick.rem_euclid(swing_resolution) == half_resolution {
            let shifted = time_base
                .ticks_to_samples(tick.saturating_add(swing_ticks))
                .saturating_sub(block_sample);
            ev.sample_offset = shifted.clamp(0, u32::MAX as i64) as u32;
        }
    }

    sort_events(events);
}

/// Random timing and velocity jitter on NoteOns, drawn from `rng`.
///
/// Timing jitter is uniform in `±timing_variation` sixteenths of a quarter
/// note (PPQ/16 ticks); velocity jitter is uniform in `±velocity_variation * 127`.
/// Negative or non-finite variations count as 0.
pub fn apply_humanize_with<R: Rng + ?Sized>(
    time_base: &TimeBase,
    events: &mut [Ev],
    timing_variation: f32,
    velocity_variation: f32,
    rng: &mut R,
) {
    let unit_samples = time_base.ticks_to_samples(PPQ / 16) as f32;
    let max_timing = sanitize_variation(timing_variation) * unit_samples;
    let max_velocity = sanitize_variation(velocity_variation) * 127.0;

    for ev in events.iter_mut().filter(|e| e.kind == EvKind::NoteOn) {
        let dt = jitter(rng, max_timing);
        let offset = (ev.sample_offset as f32 + dt) as i64;
        ev.sample_offset = offset.clamp(0, u32::MAX as i64) as u32;

        let dv = jitter(rng, max_velocity) as i32;
        ev.velocity = (ev.velocity as i32 + dv).clamp(1, 127) as u8;
    }

    sort_events(events);
}

/// [`apply_humanize_with`] using this thread's random generator
pub fn apply_humanize(
    time_base: &TimeBase,
    events: &mut [Ev],
    timing_variation: f32,
    velocity_variation: f32,
) {
    apply_humanize_with(
        time_base,
        events,
        timing_variation,
        velocity_variation,
        &mut rand::thread_rng(),
    );
}

#[inline]
fn sanitize_variation(variation: f32) -> f32 {
    if variation.is_finite() {
        variation.max(0.0)
    } else {
        0.0
    }
}

/// Largest jitter drawn, in samples or velocity steps
const MAX_JITTER: f32 = u32::MAX as f32;

#[inline]
fn jitter<R: Rng + ?Sized>(rng: &mut R, max: f32) -> f32 {
    // A finite variation times the unit can still overflow to infinity
    let max = if max.is_finite() { max.min(MAX_JITTER) } else { 0.0 };
    if max > 0.0 {
        rng.gen_range(-max..=max)
    } else {
        0.0
    }
}

/// Snap every event to the nearest multiple of `quantize_grid` ticks
/// (half rounds up). No-op when `quantize_grid <= 0`. Idempotent.
pub fn quantize_events(
    time_base: &TimeBase,
    events: &mut [Ev],
    block_sample: i64,
    quantize_grid: Tick,
) {
    if quantize_grid <= 0 {
        return;
    }

    for ev in events.iter_mut() {
        let tick = time_base.samples_to_ticks(block_sample + ev.sample_offset as i64);
        let snapped = tick
            .saturating_add(quantize_grid / 2)
            .div_euclid(quantize_grid)
            .saturating_mul(quantize_grid);
        let offset = time_base.ticks_to_samples(snapped).saturating_sub(block_sample);
        ev.sample_offset = offset.clamp(0, u32::MAX as i64) as u32;
    }

    sort_events(events);
}

/// Groove passes applied to every block by the player
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GrooveSettings {
    /// 50 = straight
    pub swing_percent: f32,
    pub swing_resolution: Tick,
    /// In sixteenths of a quarter note
    pub humanize_timing: f32,
    /// Fraction of full velocity range
    pub humanize_velocity: f32,
    /// 0 = off
    pub quantize_grid: Tick,
}

impl GrooveSettings {
    pub fn is_active(&self) -> bool {
        self.quantize_grid > 0
            || (self.swing_percent > 50.0 && self.swing_resolution > 0)
            || self.humanize_timing > 0.0
            || self.humanize_velocity > 0.0
    }

    /// Quantize, then swing, then humanize
    pub fn apply<R: Rng + ?Sized>(
        &self,
        time_base: &TimeBase,
        events: &mut [Ev],
        block_sample: i64,
        rng: &mut R,
    ) {
        quantize_events(time_base, events, block_sample, self.quantize_grid);
        apply_swing(
            time_base,
            events,
            block_sample,
            self.swing_percent,
            self.swing_resolution,
        );
        if self.humanize_timing > 0.0 || self.humanize_velocity > 0.0 {
            apply_humanize_with(
                time_base,
                events,
                self.humanize_timing,
                self.humanize_velocity,
                rng,
            );
        }
    }
}

impl Default for GrooveSettings {
    fn default() -> Self {
        Self {
            swing_percent: 50.0,
            swing_resolution: PPQ / 2,
            humanize_timing: 0.0,
            humanize_velocity: 0.0,
            quantize_grid: 0,
        }
    }
}
