//! Board indication and low-power control

/// Board-level status shown on the indication LEDs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indication {
    /// Nothing in progress, about to sleep
    Idle,
    /// Advertising is active
    Advertising,
}

/// Indication outputs (LEDs)
pub trait Indicator {
    fn indicate(&mut self, indication: Indication);
}

/// Low-power control errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerError {
    /// Wakeup sources could not be configured
    WakeupConfig,
    /// The stack refused the system-off request
    SystemOff(u32),
}

impl core::fmt::Display for PowerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::WakeupConfig => write!(f, "Wakeup configuration failed"),
            Self::SystemOff(code) => write!(f, "System-off request failed: 0x{:x}", code),
        }
    }
}

impl core::error::Error for PowerError {}

/// System power control
pub trait PowerControl {
    /// Prepare wakeup sources and enter system-off
    ///
    /// On hardware this does not return on success; wakeup causes a reset.
    /// Fakes return `Ok(())`.
    fn system_off(&mut self) -> Result<(), PowerError>;
}
