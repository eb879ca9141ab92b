//! Hardware abstraction traits for the broadcast sensor node
//!
//! This crate defines the seams between the platform-agnostic control loop
//! in `beacon-core` and the board support code. BSPs implement these traits;
//! tests implement them with recording fakes.
//!
//! - **`advertiser`**: BLE advertising start/stop/data and its events
//! - **`bus`**: power gating for the measurement bus
//! - **`identity`**: factory-programmed device identifier
//! - **`power`**: board indication and system-off
//! - **`timer`**: one-shot and repeating application timers

#![no_std]
#![deny(unsafe_code)]

pub mod advertiser;
pub mod bus;
pub mod identity;
pub mod power;
pub mod timer;

pub use advertiser::{
    Advertiser, AdvertiserError, AdvertisingEvent, AdvertisingMode, BroadcastId,
};
pub use bus::BusPower;
pub use identity::IdentitySource;
pub use power::{Indication, Indicator, PowerControl, PowerError};
pub use timer::{Ticks, TimerError, TimerId, TimerMode, TimerService};
