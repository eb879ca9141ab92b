//! Advertising subsystem interface
//!
//! The advertiser owns the structural part of the advertisement (flags,
//! local name, appearance, service UUID). Callers only hand it the service
//! data bytes and tell it when to broadcast.

/// Errors reported by the advertising stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertiserError {
    /// Stack is temporarily busy; the same call may succeed later
    Busy,
    /// Operation not valid in the current radio state
    /// (e.g. stop while not advertising)
    InvalidState,
    /// Any other stack failure, with the raw stack error code
    Stack(u32),
}

impl core::fmt::Display for AdvertiserError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Busy => write!(f, "Advertising stack busy"),
            Self::InvalidState => write!(f, "Invalid advertising state"),
            Self::Stack(code) => write!(f, "Advertising stack error 0x{:x}", code),
        }
    }
}

impl core::error::Error for AdvertiserError {}

/// Advertising mode requested on start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertisingMode {
    /// Fast advertising until `timeout_secs` elapse, then the stack reports
    /// [`AdvertisingEvent::Idle`]. A timeout of 0 advertises forever.
    Fast {
        /// Advertising interval in 0.625 ms units
        interval: u32,
        /// Advertising window in seconds
        timeout_secs: u16,
    },
}

/// Identifies one started broadcast
///
/// Returned by [`Advertiser::start`] and echoed in every
/// [`AdvertisingEvent`] about that broadcast. Events can still be queued
/// after the broadcast they describe was replaced.
pub type BroadcastId = u32;

/// Asynchronous events delivered by the advertising stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertisingEvent {
    /// Fast advertising has begun
    Fast(BroadcastId),
    /// The advertising window ended without being restarted
    Idle(BroadcastId),
}

impl AdvertisingEvent {
    pub const fn broadcast(&self) -> BroadcastId {
        match self {
            Self::Fast(id) | Self::Idle(id) => *id,
        }
    }
}

/// BLE advertising subsystem
///
/// All methods are synchronous and must not block for longer than a stack
/// call. Implementations translate "already stopped" into
/// [`AdvertiserError::InvalidState`].
pub trait Advertiser {
    /// Halt any in-progress broadcast
    fn stop(&mut self) -> Result<(), AdvertiserError>;

    /// Replace the service data carried in the advertisement
    fn set_data(&mut self, service_data: &[u8]) -> Result<(), AdvertiserError>;

    /// Begin broadcasting in the given mode
    ///
    /// Each successful start gets a new [`BroadcastId`].
    fn start(&mut self, mode: AdvertisingMode) -> Result<BroadcastId, AdvertiserError>;
}
