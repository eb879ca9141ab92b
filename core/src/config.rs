//! Node configuration structures

use fugit::MillisDurationU32;
use hal_abstractions::{AdvertisingMode, Ticks};

use crate::error::ConfigError;

/// Timer tick rate of the platform timer subsystem
///
/// Durations are converted with 100 ms granularity: a duration is first
/// truncated to whole 100 ms steps, then multiplied by the tick count of
/// one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickRate {
    ticks_per_100ms: u32,
}

impl TickRate {
    /// Derive the rate from the timer frequency in Hz (rounded to the
    /// nearest tick per 100 ms)
    pub const fn from_hz(hz: u32) -> Self {
        let ticks = (hz as u64 * 100 + 500) / 1000;
        Self {
            ticks_per_100ms: ticks as u32,
        }
    }

    /// Ticks in one 100 ms step
    pub const fn ticks_per_100ms(&self) -> u32 {
        self.ticks_per_100ms
    }

    /// Convert a duration to timer ticks
    pub fn ticks(&self, duration: MillisDurationU32) -> Ticks {
        self.ticks_per_100ms
            .saturating_mul(duration.to_millis() / 100)
    }
}

/// What the pipeline does to the broadcast when a sample fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FailureAction {
    /// Stop advertising before every read; a failed read leaves the node
    /// silent until the next successful cycle
    #[default]
    StopBroadcasting,
    /// Read before touching the advertiser; a failed read restarts the
    /// previous payload (or leaves the radio off, if it was off)
    KeepBroadcasting,
}

/// Warmup and sampling timer configuration
#[derive(Debug, Clone, Copy)]
pub struct SamplingConfig {
    /// Delay before the first measurement
    pub warmup: MillisDurationU32,
    /// Period between measurements
    pub interval: MillisDurationU32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            warmup: MillisDurationU32::from_ticks(100),
            interval: MillisDurationU32::from_ticks(10_000),
        }
    }
}

/// Advertisement configuration
#[derive(Debug, Clone, Copy)]
pub struct AdvertisingConfig {
    /// Complete local name
    pub device_name: &'static str,
    /// GAP appearance value
    pub appearance: u16,
    /// 16-bit UUID of the service data entry carrying the payload
    pub service_uuid: u16,
    /// Advertising interval in 0.625 ms units
    pub interval: u32,
    /// Fast advertising window in seconds
    pub fast_timeout_secs: u16,
}

impl AdvertisingConfig {
    /// Generic Thermometer
    pub const APPEARANCE_GENERIC_THERMOMETER: u16 = 0x0300;

    pub const fn mode(&self) -> AdvertisingMode {
        AdvertisingMode::Fast {
            interval: self.interval,
            timeout_secs: self.fast_timeout_secs,
        }
    }
}

impl Default for AdvertisingConfig {
    fn default() -> Self {
        Self {
            device_name: "EMON_123456789",
            appearance: Self::APPEARANCE_GENERIC_THERMOMETER,
            service_uuid: 0x7B18,
            interval: 10_000,
            fast_timeout_secs: 30,
        }
    }
}

/// TMP102 acquisition configuration
#[derive(Debug, Clone, Copy)]
pub struct SensorConfig {
    /// 7-bit I²C address
    pub address: u8,
    /// Maximum status reads while waiting for a conversion
    pub max_polls: u8,
    /// Delay before each status read in microseconds
    pub poll_interval_us: u32,
}

impl SensorConfig {
    /// Upper bound of the time spent waiting for a conversion
    pub const fn max_wait_us(&self) -> u32 {
        (self.max_polls as u32).saturating_mul(self.poll_interval_us)
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            address: crate::sensor::TMP102_ADDRESS,
            // One-shot conversion takes 26 ms typ., 35 ms max
            max_polls: 10,
            poll_interval_us: 5_000,
        }
    }
}

/// Complete node configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeConfig {
    pub sampling: SamplingConfig,
    pub advertising: AdvertisingConfig,
    pub sensor: SensorConfig,
    pub failure_action: FailureAction,
}

impl NodeConfig {
    /// Check the configuration against the given tick rate
    ///
    /// Both timers must be at least one tick long and a worst-case sensor
    /// acquisition must fit well inside one sampling interval, so timer
    /// fires can never overlap.
    pub fn validate(&self, tick_rate: TickRate) -> Result<(), ConfigError> {
        if tick_rate.ticks(self.sampling.warmup) == 0 {
            return Err(ConfigError::WarmupTooShort);
        }
        if tick_rate.ticks(self.sampling.interval) == 0 {
            return Err(ConfigError::IntervalTooShort);
        }
        if self.sensor.max_polls == 0 {
            return Err(ConfigError::NoPolls);
        }
        let max_wait_ms = self.sensor.max_wait_us() / 1000;
        if max_wait_ms.saturating_mul(2) >= self.sampling.interval.to_millis() {
            return Err(ConfigError::AcquisitionExceedsInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_rate_rounds_like_app_timer() {
        // 32.768 kHz RTC: 3276.8 ticks per 100 ms rounds up
        let rate = TickRate::from_hz(32_768);
        assert_eq!(rate.ticks_per_100ms(), 3277);
        assert_eq!(rate.ticks(MillisDurationU32::from_ticks(10_000)), 327_700);
    }

    #[test]
    fn test_ticks_truncate_to_100ms_steps() {
        let rate = TickRate::from_hz(1_000);
        assert_eq!(rate.ticks_per_100ms(), 100);
        assert_eq!(rate.ticks(MillisDurationU32::from_ticks(250)), 200);
        assert_eq!(rate.ticks(MillisDurationU32::from_ticks(99)), 0);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = NodeConfig::default();
        assert!(config.validate(TickRate::from_hz(32_768)).is_ok());
        assert_eq!(config.sampling.warmup.to_millis(), 100);
        assert_eq!(config.sampling.interval.to_millis(), 10_000);
        assert_eq!(config.failure_action, FailureAction::StopBroadcasting);
    }

    #[test]
    fn test_sub_tick_warmup_rejected() {
        let mut config = NodeConfig::default();
        config.sampling.warmup = MillisDurationU32::from_ticks(50);
        assert_eq!(
            config.validate(TickRate::from_hz(32_768)),
            Err(ConfigError::WarmupTooShort)
        );
    }

    #[test]
    fn test_acquisition_must_fit_interval() {
        let mut config = NodeConfig::default();
        config.sampling.interval = MillisDurationU32::from_ticks(100);
        // 10 polls x 5 ms = 50 ms, not well under 100 ms
        assert_eq!(
            config.validate(TickRate::from_hz(32_768)),
            Err(ConfigError::AcquisitionExceedsInterval)
        );
    }

    #[test]
    fn test_huge_poll_budget_rejected() {
        let mut config = NodeConfig::default();
        config.sensor.max_polls = u8::MAX;
        config.sensor.poll_interval_us = 20_000_000;
        assert_eq!(config.sensor.max_wait_us(), u32::MAX);
        assert_eq!(
            config.validate(TickRate::from_hz(32_768)),
            Err(ConfigError::AcquisitionExceedsInterval)
        );
    }

    #[test]
    fn test_advertising_mode_from_config() {
        let config = AdvertisingConfig::default();
        assert_eq!(
            config.mode(),
            AdvertisingMode::Fast {
                interval: 10_000,
                timeout_secs: 30
            }
        );
    }
}
