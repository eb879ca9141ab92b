//! Device identity loaded once at boot
//!
//! The two hardware identifier words are laid out little-endian, word 0
//! first, in the identity region of the advertisement payload. The value is
//! read exactly once; nothing mutates it afterwards.

use hal_abstractions::IdentitySource;

use crate::payload::IDENTITY_LEN;

/// Device-unique bytes carried in every advertisement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceIdentity([u8; IDENTITY_LEN]);

impl DeviceIdentity {
    /// Build the identity from the two hardware identifier words
    pub const fn from_words(words: [u32; 2]) -> Self {
        let lo = words[0].to_le_bytes();
        let hi = words[1].to_le_bytes();
        Self([lo[0], lo[1], lo[2], lo[3], hi[0], hi[1], hi[2], hi[3]])
    }

    pub const fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }
}

/// Read the device identifier from the hardware
pub fn load(source: &impl IdentitySource) -> DeviceIdentity {
    let identity = DeviceIdentity::from_words(source.device_id());
    info!("Device ID: {=[u8]:02x}", &identity.as_bytes()[..]);
    identity
}
