//! TMP102 temperature sensor reader
//!
//! The sensor is kept in shutdown mode between samples. Each sample powers
//! up the bus, triggers a one-shot conversion, waits for the OS bit,
//! reads the temperature register and puts the sensor back into shutdown.
//!
//! ## Register writes
//! | Step       | Bytes              | Meaning                        |
//! |------------|--------------------|--------------------------------|
//! | one-shot   | `01 81 00`         | config: OS=1, SD=1             |
//! | poll       | read 2             | config, OS bit = conversion done |
//! | pointer    | `00`               | select temperature register    |
//! | result     | read 2             | temperature, MSB first         |
//! | shutdown   | `01 01 00`         | config: SD=1                   |

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::{Error as _, I2c};
use hal_abstractions::BusPower;

use crate::config::SensorConfig;
use crate::error::SampleError;
use crate::payload::MEASUREMENT_LEN;

/// TMP102 7-bit address with ADD0 tied to ground
pub const TMP102_ADDRESS: u8 = 0x48;

const REG_TEMPERATURE: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;
const CONFIG_ONE_SHOT: [u8; 3] = [REG_CONFIG, 0x81, 0x00];
const CONFIG_SHUTDOWN: [u8; 3] = [REG_CONFIG, 0x01, 0x00];
const CONFIG_OS_BIT: u8 = 0x80;

/// Raw temperature register contents, MSB first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement([u8; MEASUREMENT_LEN]);

impl Measurement {
    pub const fn new(raw: [u8; MEASUREMENT_LEN]) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> &[u8; MEASUREMENT_LEN] {
        &self.0
    }

    /// Temperature in thousandths of a degree Celsius
    ///
    /// 12-bit two's complement in the upper bits, 0.0625 °C per LSB.
    pub fn millicelsius(&self) -> i32 {
        let counts = i16::from_be_bytes(self.0) >> 4;
        i32::from(counts) * 625 / 10
    }
}

/// Result of one acquisition cycle
pub type SampleOutcome = Result<Measurement, SampleError>;

/// A blocking sensor acquisition
pub trait SensorReader {
    /// Run one complete acquisition cycle
    ///
    /// Blocks the caller until the sensor is back in its idle state.
    fn read_sample(&mut self) -> SampleOutcome;
}

/// TMP102 driver over a power-gated I²C bus
///
/// The indicator output is driven high for the duration of each read.
pub struct Tmp102<B, L, D> {
    bus: B,
    indicator: L,
    delay: D,
    config: SensorConfig,
}

impl<B, L, D> Tmp102<B, L, D>
where
    B: I2c + BusPower,
    L: OutputPin,
    D: DelayNs,
{
    pub fn new(bus: B, indicator: L, delay: D, config: SensorConfig) -> Self {
        Self {
            bus,
            indicator,
            delay,
            config,
        }
    }

    /// Give back the bus, indicator and delay
    pub fn release(self) -> (B, L, D) {
        (self.bus, self.indicator, self.delay)
    }

    fn acquire(&mut self) -> SampleOutcome {
        self.write(&CONFIG_ONE_SHOT)?;
        self.wait_for_conversion()?;
        self.write(&[REG_TEMPERATURE])?;

        let mut raw = [0u8; MEASUREMENT_LEN];
        self.bus
            .read(self.config.address, &mut raw)
            .map_err(|e| SampleError::Bus(e.kind()))?;
        Ok(Measurement::new(raw))
    }

    fn wait_for_conversion(&mut self) -> Result<(), SampleError> {
        let mut status = [0u8; 2];
        for poll in 0..self.config.max_polls {
            self.delay.delay_us(self.config.poll_interval_us);
            self.bus
                .read(self.config.address, &mut status)
                .map_err(|e| SampleError::Bus(e.kind()))?;
            if status[0] & CONFIG_OS_BIT != 0 {
                trace!("Conversion complete after {} polls", poll + 1);
                return Ok(());
            }
        }
        Err(SampleError::NotReady)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), SampleError> {
        self.bus
            .write(self.config.address, bytes)
            .map_err(|e| SampleError::Bus(e.kind()))
    }
}

impl<B, L, D> SensorReader for Tmp102<B, L, D>
where
    B: I2c + BusPower,
    L: OutputPin,
    D: DelayNs,
{
    fn read_sample(&mut self) -> SampleOutcome {
        // Indicator failures must not affect the sample
        let _ = self.indicator.set_high();
        self.bus.power_up();

        let acquired = self.acquire();
        // Shutdown is attempted even after a failed acquisition
        let shutdown = self.write(&CONFIG_SHUTDOWN);

        self.bus.power_down();
        let _ = self.indicator.set_low();

        let outcome = acquired.and_then(|m| shutdown.map(|()| m));
        match &outcome {
            Ok(m) => info!(
                "New reading: {=[u8]:02X} ({} mdegC)",
                &m.raw()[..],
                m.millicelsius()
            ),
            Err(e) => warn!("Sensor read failed: {}", e),
        }
        outcome
    }
}
