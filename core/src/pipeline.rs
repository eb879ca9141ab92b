//! One sample-and-broadcast cycle
//!
//! Sensor reader → payload encoder → advertisement controller. The payload
//! buffer lives here and is only touched inside [`SamplingPipeline::run_cycle`],
//! which runs to completion from a single context.

use hal_abstractions::{Advertiser, AdvertiserError};

use crate::advertising::{AdvertisementController, AdvertisingState};
use crate::config::FailureAction;
use crate::error::{AdvertisingError, FatalError, SampleError};
use crate::payload::{self, AdvertisementPayload};
use crate::sensor::{Measurement, SensorReader};

/// What a cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleOutcome {
    /// New measurement encoded and advertising restarted
    Broadcasting(Measurement),
    /// Sample failed; payload untouched, retried next tick
    Skipped(SampleError),
    /// Advertising stack busy; retried next tick
    Deferred(AdvertiserError),
}

/// Sensor, payload buffer and advertisement controller
pub struct SamplingPipeline<S, A> {
    sensor: S,
    payload: AdvertisementPayload,
    controller: AdvertisementController<A>,
    on_failure: FailureAction,
}

impl<S: SensorReader, A: Advertiser> SamplingPipeline<S, A> {
    pub fn new(
        sensor: S,
        payload: AdvertisementPayload,
        controller: AdvertisementController<A>,
        on_failure: FailureAction,
    ) -> Self {
        Self {
            sensor,
            payload,
            controller,
            on_failure,
        }
    }

    pub fn payload(&self) -> &AdvertisementPayload {
        &self.payload
    }

    pub fn controller(&self) -> &AdvertisementController<A> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut AdvertisementController<A> {
        &mut self.controller
    }

    /// Sample once and republish on success
    ///
    /// On a failed sample under [`FailureAction::KeepBroadcasting`] a running
    /// broadcast is restarted with the unchanged payload, so its advertising
    /// window never runs out while the sensor keeps failing. Only
    /// non-transient advertising failures are returned as errors.
    pub fn run_cycle(&mut self) -> Result<CycleOutcome, FatalError> {
        if self.on_failure == FailureAction::StopBroadcasting {
            if let Err(e) = self.controller.stop() {
                return Self::defer(e);
            }
        }

        let measurement = match self.sensor.read_sample() {
            Ok(m) => m,
            Err(e) => {
                warn!("Sample skipped: {}", e);
                if self.on_failure == FailureAction::KeepBroadcasting
                    && self.controller.state() == AdvertisingState::Started
                {
                    if let Err(adv) = self.refresh() {
                        Self::defer(adv)?;
                    }
                }
                return Ok(CycleOutcome::Skipped(e));
            }
        };

        match self.republish(&measurement) {
            Ok(()) => Ok(CycleOutcome::Broadcasting(measurement)),
            Err(e) => Self::defer(e),
        }
    }

    fn republish(&mut self, measurement: &Measurement) -> Result<(), AdvertisingError> {
        self.controller.stop()?;
        payload::encode(&mut self.payload, measurement);
        self.controller.apply_payload(&self.payload)?;
        self.controller.start()
    }

    /// Restart the broadcast with the payload as it is
    fn refresh(&mut self) -> Result<(), AdvertisingError> {
        self.controller.stop()?;
        self.controller.apply_payload(&self.payload)?;
        self.controller.start()
    }

    fn defer(e: AdvertisingError) -> Result<CycleOutcome, FatalError> {
        match e {
            AdvertisingError::Stack(stack) if e.is_transient() => {
                warn!("Advertising deferred to next cycle: {}", stack);
                Ok(CycleOutcome::Deferred(stack))
            }
            _ => {
                error!("Advertising failed: {}", e);
                Err(FatalError::Advertising(e))
            }
        }
    }
}
