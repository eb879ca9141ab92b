//! Platform-agnostic sample-and-broadcast control loop
//!
//! This crate contains the logic of the broadcast sensor node: a two-phase
//! timer state machine that samples a TMP102 temperature sensor and
//! republishes the reading as BLE advertisement service data. It has NO
//! hardware dependencies; boards plug in through the traits of
//! `hal-abstractions` and `embedded-hal`.
//!
//! ## Modules
//! - **`config`**: compile-time configuration with `Default` values
//! - **`error`**: error enums for sampling, advertising and fatal faults
//! - **`identity`**: device identifier loaded once at boot
//! - **`payload`**: fixed-layout advertisement payload and its encoder
//! - **`sensor`**: TMP102 one-shot acquisition over I²C
//! - **`advertising`**: advertising on/off lifecycle
//! - **`scheduler`**: warmup → sampling timer state machine
//! - **`pipeline`**: one sample-and-broadcast cycle
//! - **`node`**: event dispatch tying everything together
//!
//! ## Logging
//! All logging goes through defmt when the `defmt` feature is enabled and
//! compiles to nothing otherwise.

#![no_std]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to the other modules
mod fmt;

pub mod advertising;
pub mod config;
pub mod error;
pub mod identity;
pub mod node;
pub mod payload;
pub mod pipeline;
pub mod scheduler;
pub mod sensor;

pub use advertising::{AdvertisementController, AdvertisingState};
pub use config::{FailureAction, NodeConfig, TickRate};
pub use error::{AdvertisingError, ConfigError, FatalError, SampleError};
pub use identity::DeviceIdentity;
pub use node::{CycleStats, Event, NodeParts, SensorNode};
pub use payload::AdvertisementPayload;
pub use pipeline::{CycleOutcome, SamplingPipeline};
pub use scheduler::{SamplingPhase, SamplingScheduler};
pub use sensor::{Measurement, SampleOutcome, SensorReader, Tmp102};
