//! Advertisement payload layout and encoder
//!
//! The payload is the service data broadcast by the node and the only
//! bit-exact artifact seen by receivers:
//!
//! ```text
//! offset  0        2                               10
//!         +--------+-------------------------------+
//!         | meas.  | identity                      |
//!         | 2 B    | 8 B (FICR DEVICEID, LE)       |
//!         +--------+-------------------------------+
//! ```
//!
//! The identity region is fixed at construction. Only [`encode`] writes the
//! measurement region.

use crate::identity::DeviceIdentity;
use crate::sensor::Measurement;

/// Size of the measurement region
pub const MEASUREMENT_LEN: usize = 2;
/// Size of the identity region
pub const IDENTITY_LEN: usize = 8;
/// Total payload size
pub const PAYLOAD_LEN: usize = MEASUREMENT_LEN + IDENTITY_LEN;

/// Measurement region content before the first successful sample
pub const UNSET_MEASUREMENT: [u8; MEASUREMENT_LEN] = [0xFF; MEASUREMENT_LEN];

// A sample must fill the measurement region exactly, and the identity
// region must match the identity it holds.
const _: () = assert!(core::mem::size_of::<Measurement>() == MEASUREMENT_LEN);
const _: () = assert!(core::mem::size_of::<DeviceIdentity>() == IDENTITY_LEN);

/// Broadcast payload with a measurement and an identity region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisementPayload {
    measurement: [u8; MEASUREMENT_LEN],
    identity: DeviceIdentity,
}

impl AdvertisementPayload {
    /// Create a payload for this device with no measurement yet
    pub const fn new(identity: DeviceIdentity) -> Self {
        Self {
            measurement: UNSET_MEASUREMENT,
            identity,
        }
    }

    pub const fn measurement(&self) -> &[u8; MEASUREMENT_LEN] {
        &self.measurement
    }

    pub const fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Serialize in wire order
    pub fn to_bytes(&self) -> [u8; PAYLOAD_LEN] {
        let mut out = [0u8; PAYLOAD_LEN];
        out[..MEASUREMENT_LEN].copy_from_slice(&self.measurement);
        out[MEASUREMENT_LEN..].copy_from_slice(self.identity.as_bytes());
        out
    }
}

/// Write a sample into the measurement region
///
/// The identity region is left untouched.
pub fn encode(payload: &mut AdvertisementPayload, sample: &Measurement) {
    payload.measurement = *sample.raw();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> AdvertisementPayload {
        AdvertisementPayload::new(DeviceIdentity::from_words([0x1122_3344, 0x5566_7788]))
    }

    #[test]
    fn test_new_payload_has_unset_measurement() {
        let p = payload();
        assert_eq!(p.measurement(), &UNSET_MEASUREMENT);
        assert_eq!(
            p.to_bytes(),
            [0xFF, 0xFF, 0x44, 0x33, 0x22, 0x11, 0x88, 0x77, 0x66, 0x55]
        );
    }

    #[test]
    fn test_encode_touches_only_measurement() {
        let mut p = payload();
        let identity = *p.identity();

        encode(&mut p, &Measurement::new([0x19, 0x88]));
        assert_eq!(
            p.to_bytes(),
            [0x19, 0x88, 0x44, 0x33, 0x22, 0x11, 0x88, 0x77, 0x66, 0x55]
        );

        encode(&mut p, &Measurement::new([0x00, 0x10]));
        assert_eq!(p.measurement(), &[0x00, 0x10]);
        assert_eq!(p.identity(), &identity);
    }
}
