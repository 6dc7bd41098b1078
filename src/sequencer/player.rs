// Sequencer Player - drives the scheduler once per audio block
// Owns the reused event buffer and the running block position

use crate::config::{ConfigError, SchedulerConfig};
use crate::messaging::channels::{DispatchError, EventProducer};
use crate::midi::event::{Ev, sort_events};
use crate::sequencer::groove::GrooveSettings;
use crate::sequencer::instance::PatternInstance;
use crate::sequencer::pattern::PatternRegistry;
use crate::sequencer::scheduler::Scheduler;
use crate::sequencer::timeline::{SharedTimeBase, Tick};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ringbuf::traits::Producer;

/// Sequencer player - turns pattern instances into per-block events
pub struct SequencerPlayer {
    /// Published by the control thread, read once per block
    time_base: SharedTimeBase,

    scheduler: Scheduler,

    /// Reused across blocks
    events: Vec<Ev>,

    groove: GrooveSettings,
    rng: StdRng,

    /// First sample of the next block
    position_samples: i64,
}

impl SequencerPlayer {
    /// Create a new player reading tempo from `time_base`
    pub fn new(time_base: SharedTimeBase, event_capacity: usize) -> Self {
        let scheduler = Scheduler::new(time_base.snapshot());
        Self {
            time_base,
            scheduler,
            events: Vec::with_capacity(event_capacity),
            groove: GrooveSettings::default(),
            rng: StdRng::from_entropy(),
            position_samples: 0,
        }
    }

    /// Create a player from a validated configuration
    pub fn from_config(config: &SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let time_base = SharedTimeBase::new(config.time_base()?);
        let mut player = Self::new(time_base, config.event_capacity);
        player.groove = config.groove;
        if let Some(seed) = config.humanize_seed {
            player.reseed(seed);
        }
        tracing::debug!(
            sample_rate = config.sample_rate,
            bpm = config.tempo.bpm,
            groove = config.groove.is_active(),
            "sequencer player configured"
        );
        Ok(player)
    }

    /// Handle for the control thread to publish tempo changes
    pub fn time_base_handle(&self) -> SharedTimeBase {
        self.time_base.clone()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn groove(&self) -> GrooveSettings {
        self.groove
    }

    pub fn set_groove(&mut self, groove: GrooveSettings) {
        self.groove = groove;
    }

    /// Make humanize reproducible from here on
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// First sample of the next block
    pub fn position(&self) -> i64 {
        self.position_samples
    }

    /// Current position in ticks
    pub fn position_ticks(&self) -> Tick {
        self.scheduler.time_base().samples_to_ticks(self.position_samples)
    }

    /// Jump to an absolute sample position (transport locate / loop jump)
    pub fn locate(&mut self, sample: i64) {
        self.position_samples = sample.max(0);
    }

    /// Render the events of the next block and advance the position by `frames`.
    ///
    /// Returned events are sorted and every offset is inside `[0, frames)`.
    pub fn process_block(
        &mut self,
        registry: &PatternRegistry,
        instances: &[PatternInstance],
        frames: u32,
    ) -> &[Ev] {
        let time_base = self.time_base.snapshot();
        if time_base != *self.scheduler.time_base() {
            self.scheduler.set_time_base(time_base);
        }

        let block_sample = self.position_samples;
        self.scheduler
            .gather_realtime(registry, instances, block_sample, frames, &mut self.events);

        if self.groove.is_active() && !self.events.is_empty() {
            self.groove
                .apply(&time_base, &mut self.events, block_sample, &mut self.rng);

            // Grooves may push events past the block end
            let last = frames.saturating_sub(1);
            for ev in self.events.iter_mut() {
                ev.sample_offset = ev.sample_offset.min(last);
            }
            sort_events(&mut self.events);
        }

        self.position_samples += frames as i64;
        &self.events
    }

    /// Events of the last processed block
    pub fn events(&self) -> &[Ev] {
        &self.events
    }

    /// Push the last block's events to the voice dispatcher
    pub fn dispatch(&self, producer: &mut EventProducer) -> Result<usize, DispatchError> {
        let pushed = producer.push_slice(&self.events);
        if pushed < self.events.len() {
            let dropped = self.events.len() - pushed;
            tracing::warn!(dropped, "event buffer full");
            return Err(DispatchError::BufferFull { dropped });
        }
        Ok(pushed)
    }
}
