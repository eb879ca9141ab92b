//! Sensor node event dispatch
//!
//! The board turns every timer fire and advertising event into an [`Event`]
//! and hands it to [`SensorNode::dispatch`] from one execution context.
//! Each dispatch runs to completion, including the blocking sensor read,
//! before the next event is processed.

use hal_abstractions::{
    Advertiser, AdvertisingEvent, IdentitySource, Indication, Indicator, PowerControl, TimerId,
    TimerService,
};

use crate::advertising::AdvertisementController;
use crate::config::{NodeConfig, TickRate};
use crate::error::FatalError;
use crate::identity;
use crate::payload::AdvertisementPayload;
use crate::pipeline::{CycleOutcome, SamplingPipeline};
use crate::scheduler::{SamplingPhase, SamplingScheduler};
use crate::sensor::SensorReader;

/// Events dispatched into the node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// An application timer fired
    Timer(TimerId),
    /// The advertising stack reported a mode change
    Advertising(AdvertisingEvent),
}

/// Cycle counters for the diagnostic log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleStats {
    pub broadcasts: u32,
    pub skipped: u32,
    pub deferred: u32,
}

impl CycleStats {
    fn record(&mut self, outcome: &CycleOutcome) {
        match outcome {
            CycleOutcome::Broadcasting(_) => self.broadcasts = self.broadcasts.wrapping_add(1),
            CycleOutcome::Skipped(_) => self.skipped = self.skipped.wrapping_add(1),
            CycleOutcome::Deferred(_) => self.deferred = self.deferred.wrapping_add(1),
        }
    }
}

/// Board collaborators handed to the node
pub struct NodeParts<S, A, T, P, I> {
    pub sensor: S,
    pub advertiser: A,
    pub timers: T,
    pub power: P,
    pub indicator: I,
}

/// The complete sample-and-broadcast node
pub struct SensorNode<S, A, T: TimerService, P, I> {
    scheduler: SamplingScheduler<T>,
    pipeline: SamplingPipeline<S, A>,
    power: P,
    indicator: I,
    stats: CycleStats,
}

impl<S, A, T, P, I> SensorNode<S, A, T, P, I>
where
    S: SensorReader,
    A: Advertiser,
    T: TimerService,
    P: PowerControl,
    I: Indicator,
{
    /// Validate the configuration, load the device identity and create
    /// the timers
    pub fn new(
        config: &NodeConfig,
        tick_rate: TickRate,
        identity_source: &impl IdentitySource,
        parts: NodeParts<S, A, T, P, I>,
    ) -> Result<Self, FatalError> {
        config.validate(tick_rate)?;

        let payload = AdvertisementPayload::new(identity::load(identity_source));
        let controller = AdvertisementController::new(parts.advertiser, config.advertising.mode());
        let scheduler = SamplingScheduler::new(parts.timers, &config.sampling, tick_rate)?;

        Ok(Self {
            scheduler,
            pipeline: SamplingPipeline::new(
                parts.sensor,
                payload,
                controller,
                config.failure_action,
            ),
            power: parts.power,
            indicator: parts.indicator,
            stats: CycleStats::default(),
        })
    }

    pub fn scheduler(&self) -> &SamplingScheduler<T> {
        &self.scheduler
    }

    pub fn pipeline(&self) -> &SamplingPipeline<S, A> {
        &self.pipeline
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    /// Start the warmup phase
    pub fn boot(&mut self) -> Result<(), FatalError> {
        info!("Warmup ...");
        self.scheduler.start()
    }

    /// Handle one event to completion
    ///
    /// Returns the cycle outcome when the event ran a sampling cycle.
    pub fn dispatch(&mut self, event: Event) -> Result<Option<CycleOutcome>, FatalError> {
        match event {
            Event::Timer(id) => self.on_timer(id),
            Event::Advertising(event) => {
                self.on_advertising(event)?;
                Ok(None)
            }
        }
    }

    fn on_timer(&mut self, id: TimerId) -> Result<Option<CycleOutcome>, FatalError> {
        if !self.scheduler.accepts(id) {
            warn!(
                "Ignoring {} timer in phase {}",
                id,
                self.scheduler.phase()
            );
            return Ok(None);
        }

        let cycle = if self.scheduler.phase() == SamplingPhase::Warmup {
            info!("Warmup done, sampling starting");
            let cycle = self.pipeline.run_cycle();
            // The sampler is armed even when the first sample failed
            self.scheduler.enter_sampling()?;
            cycle?
        } else {
            self.pipeline.run_cycle()?
        };

        self.stats.record(&cycle);
        debug!("Cycle stats: {}", self.stats);
        Ok(Some(cycle))
    }

    fn on_advertising(&mut self, event: AdvertisingEvent) -> Result<(), FatalError> {
        if !self.pipeline.controller_mut().on_event(event) {
            debug!("Ignoring stale advertising event {}", event);
            return Ok(());
        }
        match event {
            AdvertisingEvent::Fast(_) => {
                self.indicator.indicate(Indication::Advertising);
            }
            AdvertisingEvent::Idle(_) => {
                info!("Advertising window ended, entering system-off");
                self.indicator.indicate(Indication::Idle);
                self.power.system_off()?;
            }
        }
        Ok(())
    }
}
