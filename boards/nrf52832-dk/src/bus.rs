//! Power-gated TWIM0 bus for the TMP102

use embassy_nrf::pac;
use embassy_nrf::pac::twim::vals::Enable;
use embassy_nrf::twim::{self, Twim};
use embedded_hal::i2c::{ErrorType, I2c, Operation};
use hal_abstractions::BusPower;

/// TWIM0 that is only enabled for the duration of a sample
///
/// An enabled TWIM keeps its clock request active, so the peripheral is
/// disabled between samples.
pub struct GatedTwim {
    twim: Twim<'static>,
}

impl GatedTwim {
    /// Wrap a configured TWIM0 driver and disable it until first use
    pub fn new(twim: Twim<'static>) -> Self {
        let mut bus = Self { twim };
        bus.power_down();
        bus
    }
}

impl BusPower for GatedTwim {
    fn power_up(&mut self) {
        pac::TWIM0.enable().write(|w| w.set_enable(Enable::ENABLED));
    }

    fn power_down(&mut self) {
        pac::TWIM0.enable().write(|w| w.set_enable(Enable::DISABLED));
    }
}

impl ErrorType for GatedTwim {
    type Error = twim::Error;
}

// Blocking transfers; `Twim` also has async inherent methods of the same names
impl I2c for GatedTwim {
    fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        I2c::read(&mut self.twim, address, read)
    }

    fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
        I2c::write(&mut self.twim, address, write)
    }

    fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        I2c::write_read(&mut self.twim, address, write, read)
    }

    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        I2c::transaction(&mut self.twim, address, operations)
    }
}
