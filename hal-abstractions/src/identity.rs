/// Source of the factory-programmed device identifier
///
/// The value must be stable for the lifetime of the process. It is read
/// once at boot.
pub trait IdentitySource {
    /// Two 32-bit identifier words, in hardware register order
    fn device_id(&self) -> [u32; 2];
}
