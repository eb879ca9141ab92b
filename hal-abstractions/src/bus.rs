//! Measurement bus power gating
//!
//! The transaction primitive itself is `embedded_hal::i2c::I2c`; this trait
//! only covers enabling the peripheral before a read and disabling it
//! afterwards so it draws no current between samples.

/// Power control for a bus peripheral
pub trait BusPower {
    /// Enable the bus peripheral
    fn power_up(&mut self);

    /// Disable the bus peripheral
    fn power_down(&mut self);
}
