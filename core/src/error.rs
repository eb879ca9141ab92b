//! Error types for the control loop
//!
//! Errors fall into three classes:
//! - [`SampleError`]: transient, the cycle is skipped and retried on the next tick
//! - [`AdvertisingError`]: lifecycle failures; `Busy` is transient, the rest fatal
//! - [`FatalError`]: unrecoverable at runtime, the board reports and resets

use embedded_hal::i2c::ErrorKind;
use hal_abstractions::{AdvertiserError, PowerError, TimerError};

/// Sensor acquisition failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleError {
    /// A bus transaction failed
    Bus(ErrorKind),
    /// The conversion did not complete within the poll ceiling
    NotReady,
}

impl core::fmt::Display for SampleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus(kind) => write!(f, "Bus transaction failed: {}", kind),
            Self::NotReady => write!(f, "Sensor conversion not ready"),
        }
    }
}

impl core::error::Error for SampleError {}

/// Advertisement lifecycle errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertisingError {
    /// Payload applied while advertising was running
    NotStopped,
    /// Start requested while advertising was running
    AlreadyStarted,
    /// The advertising stack rejected the call
    Stack(AdvertiserError),
}

impl AdvertisingError {
    /// Whether the same call may succeed on the next cycle
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Stack(AdvertiserError::Busy))
    }
}

impl From<AdvertiserError> for AdvertisingError {
    fn from(e: AdvertiserError) -> Self {
        Self::Stack(e)
    }
}

impl core::fmt::Display for AdvertisingError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotStopped => write!(f, "Advertising not stopped"),
            Self::AlreadyStarted => write!(f, "Advertising already started"),
            Self::Stack(e) => write!(f, "{}", e),
        }
    }
}

impl core::error::Error for AdvertisingError {}

/// Configuration rejected at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Warmup rounds down to zero ticks
    WarmupTooShort,
    /// Sampling interval rounds down to zero ticks
    IntervalTooShort,
    /// Sensor poll ceiling is zero
    NoPolls,
    /// Worst-case acquisition is not well under the sampling interval
    AcquisitionExceedsInterval,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::WarmupTooShort => write!(f, "Warmup shorter than one timer step"),
            Self::IntervalTooShort => write!(f, "Sampling interval shorter than one timer step"),
            Self::NoPolls => write!(f, "Sensor poll ceiling is zero"),
            Self::AcquisitionExceedsInterval => {
                write!(f, "Sensor acquisition does not fit the sampling interval")
            }
        }
    }
}

impl core::error::Error for ConfigError {}

/// Unrecoverable faults; the board must report and reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FatalError {
    /// Invalid configuration
    Config(ConfigError),
    /// Timer creation or start failed
    Timer(TimerError),
    /// Advertising lifecycle failed with a non-transient error
    Advertising(AdvertisingError),
    /// System-off request failed
    Power(PowerError),
}

impl From<ConfigError> for FatalError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<TimerError> for FatalError {
    fn from(e: TimerError) -> Self {
        Self::Timer(e)
    }
}

impl From<AdvertisingError> for FatalError {
    fn from(e: AdvertisingError) -> Self {
        Self::Advertising(e)
    }
}

impl From<PowerError> for FatalError {
    fn from(e: PowerError) -> Self {
        Self::Power(e)
    }
}

impl core::fmt::Display for FatalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {}", e),
            Self::Timer(e) => write!(f, "Timer error: {}", e),
            Self::Advertising(e) => write!(f, "Advertising error: {}", e),
            Self::Power(e) => write!(f, "Power error: {}", e),
        }
    }
}

impl core::error::Error for FatalError {}
