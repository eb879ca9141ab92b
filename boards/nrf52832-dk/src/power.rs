//! Indication LED and system-off

use defmt::info;
use embassy_nrf::gpio::{Input, Output};
use embassy_nrf::pac;
use embassy_nrf::pac::gpio::vals::Sense;
use hal_abstractions::{Indication, Indicator, PowerControl, PowerError};

/// Status LED, lit while advertising
pub struct LedIndicator {
    led: Output<'static>,
}

impl LedIndicator {
    pub fn new(led: Output<'static>) -> Self {
        Self { led }
    }
}

impl Indicator for LedIndicator {
    fn indicate(&mut self, indication: Indication) {
        match indication {
            Indication::Advertising => self.led.set_high(),
            Indication::Idle => self.led.set_low(),
        }
    }
}

/// System-off through the SoftDevice, woken by the wake button
pub struct SystemOff {
    wake: Input<'static>,
    wake_pin: usize,
}

impl SystemOff {
    /// `wake_pin` is the P0 pin number of `wake`
    pub fn new(wake: Input<'static>, wake_pin: usize) -> Self {
        Self { wake, wake_pin }
    }

    fn arm_wakeup(&mut self) -> Result<(), PowerError> {
        // Button pulls low; wakeup needs the line idle high
        if self.wake.is_low() {
            return Err(PowerError::WakeupConfig);
        }
        pac::P0
            .pin_cnf(self.wake_pin)
            .modify(|w| w.set_sense(Sense::LOW));
        Ok(())
    }
}

impl PowerControl for SystemOff {
    fn system_off(&mut self) -> Result<(), PowerError> {
        self.arm_wakeup()?;
        info!("Entering system-off");

        // Only returns on failure; wakeup is a reset
        #[allow(unsafe_code)]
        let err = unsafe { nrf_softdevice::raw::sd_power_system_off() };
        Err(PowerError::SystemOff(err))
    }
}
