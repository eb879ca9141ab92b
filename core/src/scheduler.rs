//! Sampling scheduler
//!
//! Two-phase timer state machine:
//!
//! ```text
//! Boot --start()--> Warmup --enter_sampling()--> Sampling (repeats forever)
//!         arms one-shot       arms repeating
//! ```
//!
//! Exactly one timer is armed once started: the one-shot warmup timer until
//! it fires, then only the repeating sampler timer.

use hal_abstractions::{Ticks, TimerId, TimerMode, TimerService};

use crate::config::{SamplingConfig, TickRate};
use crate::error::FatalError;

/// Which timer is currently armed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SamplingPhase {
    /// Created, nothing armed yet
    Boot,
    /// Warmup one-shot armed
    Warmup,
    /// Repeating sampler armed (terminal)
    Sampling,
}

/// Owns the phase and both timer handles
pub struct SamplingScheduler<T: TimerService> {
    timers: T,
    warmup: T::Handle,
    sampler: T::Handle,
    warmup_ticks: Ticks,
    interval_ticks: Ticks,
    phase: SamplingPhase,
}

impl<T: TimerService> SamplingScheduler<T> {
    /// Create the warmup and sampler timers
    ///
    /// Timer creation failure is fatal.
    pub fn new(
        mut timers: T,
        config: &SamplingConfig,
        tick_rate: TickRate,
    ) -> Result<Self, FatalError> {
        let warmup = timers.create(TimerMode::OneShot, TimerId::Warmup)?;
        let sampler = timers.create(TimerMode::Repeating, TimerId::Sampler)?;

        Ok(Self {
            timers,
            warmup,
            sampler,
            warmup_ticks: tick_rate.ticks(config.warmup),
            interval_ticks: tick_rate.ticks(config.interval),
            phase: SamplingPhase::Boot,
        })
    }

    pub fn phase(&self) -> SamplingPhase {
        self.phase
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    /// Arm the warmup timer
    pub fn start(&mut self) -> Result<(), FatalError> {
        if self.phase != SamplingPhase::Boot {
            warn!("Scheduler already started ({})", self.phase);
            return Ok(());
        }
        self.timers.start(self.warmup, self.warmup_ticks)?;
        self.phase = SamplingPhase::Warmup;
        info!("Warmup timer armed: {} ticks", self.warmup_ticks);
        Ok(())
    }

    /// Arm the repeating sampler after the warmup fired
    ///
    /// Called regardless of the outcome of the warmup sample.
    pub fn enter_sampling(&mut self) -> Result<(), FatalError> {
        if self.phase != SamplingPhase::Warmup {
            warn!("Sampling requested in phase {}", self.phase);
            return Ok(());
        }
        self.timers.start(self.sampler, self.interval_ticks)?;
        self.phase = SamplingPhase::Sampling;
        info!("Sampler timer armed: every {} ticks", self.interval_ticks);
        Ok(())
    }

    /// Whether a fire of `id` belongs to the current phase
    pub fn accepts(&self, id: TimerId) -> bool {
        matches!(
            (self.phase, id),
            (SamplingPhase::Warmup, TimerId::Warmup) | (SamplingPhase::Sampling, TimerId::Sampler)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fugit::MillisDurationU32;
    use hal_abstractions::TimerError;
    use heapless::Vec;

    #[derive(Default)]
    struct Timers {
        created: Vec<(TimerMode, TimerId), 4>,
        started: Vec<(usize, Ticks), 4>,
        fail_create: bool,
    }

    impl TimerService for Timers {
        type Handle = usize;

        fn create(&mut self, mode: TimerMode, id: TimerId) -> Result<usize, TimerError> {
            if self.fail_create {
                return Err(TimerError::NoResources);
            }
            self.created
                .push((mode, id))
                .map_err(|_| TimerError::NoResources)?;
            Ok(self.created.len() - 1)
        }

        fn start(&mut self, handle: usize, ticks: Ticks) -> Result<(), TimerError> {
            self.started
                .push((handle, ticks))
                .map_err(|_| TimerError::NoResources)
        }
    }

    fn scheduler() -> SamplingScheduler<Timers> {
        let config = SamplingConfig {
            warmup: MillisDurationU32::from_ticks(100),
            interval: MillisDurationU32::from_ticks(10_000),
        };
        SamplingScheduler::new(Timers::default(), &config, TickRate::from_hz(32_768)).unwrap()
    }

    #[test]
    fn test_creates_one_shot_and_repeating() {
        let s = scheduler();
        assert_eq!(s.phase(), SamplingPhase::Boot);
        assert_eq!(
            s.timers().created.as_slice(),
            &[
                (TimerMode::OneShot, TimerId::Warmup),
                (TimerMode::Repeating, TimerId::Sampler)
            ]
        );
        assert!(s.timers().started.is_empty());
    }

    #[test]
    fn test_phase_transitions_arm_one_timer_each() {
        let mut s = scheduler();

        s.start().unwrap();
        assert_eq!(s.phase(), SamplingPhase::Warmup);
        assert_eq!(s.timers().started.as_slice(), &[(0, 3277)]);
        assert!(s.accepts(TimerId::Warmup));
        assert!(!s.accepts(TimerId::Sampler));

        s.enter_sampling().unwrap();
        assert_eq!(s.phase(), SamplingPhase::Sampling);
        assert_eq!(s.timers().started.as_slice(), &[(0, 3277), (1, 327_700)]);
        assert!(s.accepts(TimerId::Sampler));
        assert!(!s.accepts(TimerId::Warmup));
    }

    #[test]
    fn test_sampling_is_terminal() {
        let mut s = scheduler();
        s.start().unwrap();
        s.enter_sampling().unwrap();

        s.start().unwrap();
        s.enter_sampling().unwrap();

        assert_eq!(s.phase(), SamplingPhase::Sampling);
        assert_eq!(s.timers().started.len(), 2);
    }

    #[test]
    fn test_sampling_requires_warmup() {
        let mut s = scheduler();
        s.enter_sampling().unwrap();
        assert_eq!(s.phase(), SamplingPhase::Boot);
        assert!(s.timers().started.is_empty());
    }

    #[test]
    fn test_timer_creation_failure_is_fatal() {
        let timers = Timers {
            fail_create: true,
            ..Default::default()
        };
        let result =
            SamplingScheduler::new(timers, &SamplingConfig::default(), TickRate::from_hz(32_768));
        assert_eq!(
            result.err(),
            Some(FatalError::Timer(TimerError::NoResources))
        );
    }
}
