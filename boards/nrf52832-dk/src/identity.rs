//! Device identifier for the nRF52832
//!
//! The FICR holds a factory-programmed 64-bit device ID in `DEVICEID[0]`
//! and `DEVICEID[1]`. It is stable across reboots and unique per chip, and
//! is broadcast as the identity region of every advertisement.
//!
//! # Usage
//!
//! ```no_run
//! let identity = beacon_core::identity::load(&FicrIdentity);
//! ```

use embassy_nrf::pac;
use hal_abstractions::IdentitySource;

/// Reads `FICR.DEVICEID[0..2]`
#[derive(Debug, Clone, Copy, Default)]
pub struct FicrIdentity;

impl IdentitySource for FicrIdentity {
    fn device_id(&self) -> [u32; 2] {
        [pac::FICR.deviceid(0).read(), pac::FICR.deviceid(1).read()]
    }
}
