//! Application timer interface
//!
//! Timers do not call back into the application directly. A fire is turned
//! into an event carrying the timer's [`TimerId`] and dispatched from the
//! single application context, so handlers always run to completion.

/// Timer duration in platform ticks
pub type Ticks = u32;

/// Firing mode of an application timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerMode {
    /// Fires once after the duration
    OneShot,
    /// Fires every duration until stopped
    Repeating,
}

/// Application timers known to the node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerId {
    /// Sensor stabilization delay before the first sample
    Warmup,
    /// Periodic sampling tick
    Sampler,
}

/// Timer subsystem errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// No free timer slot
    NoResources,
    /// Timer is already running
    AlreadyRunning,
    /// Unknown timer handle
    InvalidHandle,
    /// Duration out of range for the timer hardware
    InvalidDuration,
}

impl core::fmt::Display for TimerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoResources => write!(f, "No timer resources"),
            Self::AlreadyRunning => write!(f, "Timer already running"),
            Self::InvalidHandle => write!(f, "Invalid timer handle"),
            Self::InvalidDuration => write!(f, "Invalid timer duration"),
        }
    }
}

impl core::error::Error for TimerError {}

/// Timer subsystem
pub trait TimerService {
    /// Opaque handle to a created timer
    type Handle: Copy;

    /// Create a timer whose fires are reported as `id`
    fn create(&mut self, mode: TimerMode, id: TimerId) -> Result<Self::Handle, TimerError>;

    /// Arm a created timer
    fn start(&mut self, handle: Self::Handle, ticks: Ticks) -> Result<(), TimerError>;
}
