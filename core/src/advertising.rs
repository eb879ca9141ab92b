//! Advertisement lifecycle controller
//!
//! Tracks whether the node is broadcasting and enforces the ordering
//! stop → apply → start, so the advertiser never carries a payload that is
//! being rewritten.

use hal_abstractions::{
    Advertiser, AdvertiserError, AdvertisingEvent, AdvertisingMode, BroadcastId,
};

use crate::error::AdvertisingError;
use crate::payload::AdvertisementPayload;

/// Broadcast state as seen by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertisingState {
    Stopped,
    Started,
}

/// Owns the advertiser and its on/off state
pub struct AdvertisementController<A> {
    advertiser: A,
    mode: AdvertisingMode,
    state: AdvertisingState,
    broadcast: Option<BroadcastId>,
}

impl<A: Advertiser> AdvertisementController<A> {
    /// Wrap an advertiser that is not yet broadcasting
    pub fn new(advertiser: A, mode: AdvertisingMode) -> Self {
        Self {
            advertiser,
            mode,
            state: AdvertisingState::Stopped,
            broadcast: None,
        }
    }

    pub fn state(&self) -> AdvertisingState {
        self.state
    }

    pub fn advertiser(&self) -> &A {
        &self.advertiser
    }

    /// Halt any in-progress broadcast
    ///
    /// Safe to call when already stopped: the stack's "not advertising"
    /// answer counts as success.
    pub fn stop(&mut self) -> Result<(), AdvertisingError> {
        match self.advertiser.stop() {
            Ok(()) | Err(AdvertiserError::InvalidState) => {
                self.state = AdvertisingState::Stopped;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Hand the current payload to the advertiser
    ///
    /// Only valid while stopped.
    pub fn apply_payload(&mut self, payload: &AdvertisementPayload) -> Result<(), AdvertisingError> {
        if self.state == AdvertisingState::Started {
            return Err(AdvertisingError::NotStopped);
        }
        self.advertiser.set_data(&payload.to_bytes())?;
        Ok(())
    }

    /// Start broadcasting in the configured mode
    pub fn start(&mut self) -> Result<(), AdvertisingError> {
        if self.state == AdvertisingState::Started {
            return Err(AdvertisingError::AlreadyStarted);
        }
        let id = self.advertiser.start(self.mode)?;
        self.state = AdvertisingState::Started;
        self.broadcast = Some(id);
        debug!("Advertising started, broadcast {}", id);
        Ok(())
    }

    /// Track state changes reported by the stack
    ///
    /// Returns `false` for events about a broadcast that has since been
    /// stopped or replaced; those leave the state untouched.
    pub fn on_event(&mut self, event: AdvertisingEvent) -> bool {
        if self.state != AdvertisingState::Started || self.broadcast != Some(event.broadcast()) {
            return false;
        }
        if let AdvertisingEvent::Idle(_) = event {
            self.state = AdvertisingState::Stopped;
        }
        true
    }
}
