// Timeline - Musical time base
// Handles conversion between ticks (musical time) and samples (audio time)

use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;

/// Musical time in ticks. Always exact integer math.
pub type Tick = i64;

/// Ticks per quarter note (PPQ - Pulses Per Quarter note)
pub const PPQ: Tick = 960;

/// Timing errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimingError {
    #[error("Sample rate must be finite and > 0, got {0}")]
    InvalidSampleRate(f64),

    #[error("Tempo must be finite and > 0 BPM, got {0}")]
    InvalidTempo(f64),
}

/// Tempo and time signature
///
/// Only `bpm` takes part in tick/sample conversion. The time signature is
/// carried along as metadata for bar arithmetic and display.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TempoSig {
    pub bpm: f64,
    pub numerator: u8,   // Beats per bar
    pub denominator: u8, // Note value (4 = quarter note)
}

impl TempoSig {
    /// Creates a tempo with a 4/4 time signature
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm,
            numerator: 4,
            denominator: 4,
        }
    }

    /// Creates a tempo with an explicit time signature
    pub fn with_signature(bpm: f64, numerator: u8, denominator: u8) -> Self {
        Self {
            bpm,
            numerator,
            denominator,
        }
    }
}

impl Default for TempoSig {
    fn default() -> Self {
        Self::new(120.0)
    }
}

impl fmt::Display for TempoSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} BPM {}/{}",
            self.bpm, self.numerator, self.denominator
        )
    }
}

/// Round half up, also for negative values (-2.5 -> -2)
#[inline]
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Authoritative tempo and sample-rate state
///
/// Both fields are strictly positive. A `TimeBase` is a plain value: tempo or
/// sample-rate changes replace it as a whole (see [`SharedTimeBase`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeBase {
    sample_rate: f64,
    tempo: TempoSig,
}

impl TimeBase {
    /// Creates a new time base
    pub fn new(sample_rate: f64, tempo: TempoSig) -> Result<Self, TimingError> {
        Self::validate(sample_rate, &tempo)?;
        Ok(Self { sample_rate, tempo })
    }

    fn validate(sample_rate: f64, tempo: &TempoSig) -> Result<(), TimingError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(TimingError::InvalidSampleRate(sample_rate));
        }
        if !tempo.bpm.is_finite() || tempo.bpm <= 0.0 {
            return Err(TimingError::InvalidTempo(tempo.bpm));
        }
        Ok(())
    }

    /// Replaces sample rate and tempo together.
    /// On error the previous state is kept.
    pub fn set(&mut self, sample_rate: f64, tempo: TempoSig) -> Result<(), TimingError> {
        Self::validate(sample_rate, &tempo)?;
        self.sample_rate = sample_rate;
        self.tempo = tempo;
        tracing::debug!(sample_rate, %tempo, "time base updated");
        Ok(())
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn tempo(&self) -> TempoSig {
        self.tempo
    }

    /// Convert an absolute sample position to ticks
    #[inline]
    pub fn samples_to_ticks(&self, samples: i64) -> Tick {
        let ticks = samples as f64 * (self.tempo.bpm / 60.0) * PPQ as f64 / self.sample_rate;
        round_half_up(ticks)
    }

    /// Convert a tick position to an absolute sample position
    #[inline]
    pub fn ticks_to_samples(&self, ticks: Tick) -> i64 {
        let samples = ticks as f64 * (60.0 / self.tempo.bpm) * (self.sample_rate / PPQ as f64);
        round_half_up(samples)
    }

    /// Duration of one tick in samples (not rounded)
    pub fn samples_per_tick(&self) -> f64 {
        (60.0 / self.tempo.bpm) * self.sample_rate / PPQ as f64
    }

    /// Ticks in one bar of the current time signature
    pub fn ticks_per_bar(&self) -> Tick {
        let beat = PPQ * 4 / self.tempo.denominator.max(1) as Tick;
        beat * self.tempo.numerator as Tick
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            tempo: TempoSig::default(),
        }
    }
}

/// Time base shared between a control thread and the audio thread
///
/// Writers publish a whole new `TimeBase`; the audio thread takes one snapshot
/// per block, so a block never sees half of a tempo change.
#[derive(Debug, Clone)]
pub struct SharedTimeBase {
    inner: Arc<ArcSwap<TimeBase>>,
}

impl SharedTimeBase {
    pub fn new(time_base: TimeBase) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(time_base)),
        }
    }

    /// Publish a new time base (control thread)
    pub fn publish(&self, time_base: TimeBase) {
        self.inner.store(Arc::new(time_base));
    }

    /// Validate and publish new sample rate and tempo
    pub fn set(&self, sample_rate: f64, tempo: TempoSig) -> Result<(), TimingError> {
        let time_base = TimeBase::new(sample_rate, tempo)?;
        tracing::debug!(sample_rate, %tempo, "publishing time base");
        self.publish(time_base);
        Ok(())
    }

    /// Current time base (audio thread, once per block)
    pub fn snapshot(&self) -> TimeBase {
        **self.inner.load()
    }
}

impl Default for SharedTimeBase {
    fn default() -> Self {
        Self::new(TimeBase::default())
    }
}
