//! Advertising over the S132 SoftDevice
//!
//! The control loop talks to [`SoftdeviceAdvertiser`] synchronously. Each
//! call is turned into an [`AdvCommand`] and queued to the advertising task,
//! which owns the running `advertise` future. Dropping that future stops
//! the broadcast.

use core::sync::atomic::{AtomicU32, Ordering};

use beacon_core::config::AdvertisingConfig;
use beacon_core::payload::PAYLOAD_LEN;
use beacon_core::Event;
use defmt::{debug, warn};
use embassy_futures::select::{select, Either};
use hal_abstractions::{
    Advertiser, AdvertiserError, AdvertisingEvent, AdvertisingMode, BroadcastId,
};
use nrf_softdevice::ble::advertisement_builder::{
    AdvertisementDataType, Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload,
};
use nrf_softdevice::ble::peripheral::{self, AdvertiseError, NonconnectableAdvertisement};
use nrf_softdevice::{raw, Softdevice};
use rtic_sync::channel::{Receiver, Sender, TrySendError};

use crate::events::{post, EventSender};

/// Depth of the command queue to the advertising task
pub const ADV_QUEUE: usize = 4;

pub type CommandSender = Sender<'static, AdvCommand, ADV_QUEUE>;
pub type CommandReceiver = Receiver<'static, AdvCommand, ADV_QUEUE>;

/// Broadcast requested and not yet timed out or stopped; 0 when none
static CURRENT: AtomicU32 = AtomicU32::new(0);

/// Requests handled by [`run`]
pub enum AdvCommand {
    Start {
        id: BroadcastId,
        adv_data: LegacyAdvertisementPayload,
        mode: AdvertisingMode,
    },
    Stop,
}

/// [`Advertiser`] front end for the advertising task
pub struct SoftdeviceAdvertiser {
    commands: CommandSender,
    config: AdvertisingConfig,
    adv_data: Option<LegacyAdvertisementPayload>,
    last_id: BroadcastId,
}

impl SoftdeviceAdvertiser {
    pub fn new(commands: CommandSender, config: AdvertisingConfig) -> Self {
        Self {
            commands,
            config,
            adv_data: None,
            last_id: 0,
        }
    }

    /// Flags, appearance and the service data entry
    ///
    /// The complete local name goes into the scan response; all four do
    /// not fit one legacy advertisement.
    fn build(&self, service_data: &[u8]) -> Result<LegacyAdvertisementPayload, AdvertiserError> {
        let mut entry = [0u8; 2 + PAYLOAD_LEN];
        entry[..2].copy_from_slice(&self.config.service_uuid.to_le_bytes());
        entry
            .get_mut(2..2 + service_data.len())
            .ok_or(AdvertiserError::Stack(raw::NRF_ERROR_INVALID_LENGTH))?
            .copy_from_slice(service_data);

        LegacyAdvertisementBuilder::new()
            .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
            .raw(
                AdvertisementDataType::APPEARANCE,
                &self.config.appearance.to_le_bytes(),
            )
            .raw(
                AdvertisementDataType::SERVICE_DATA_16,
                &entry[..2 + service_data.len()],
            )
            .try_build()
            .map_err(|_| AdvertiserError::Stack(raw::NRF_ERROR_DATA_SIZE))
    }
}

impl Advertiser for SoftdeviceAdvertiser {
    fn stop(&mut self) -> Result<(), AdvertiserError> {
        if CURRENT.load(Ordering::Acquire) == 0 {
            return Err(AdvertiserError::InvalidState);
        }
        self.commands
            .try_send(AdvCommand::Stop)
            .map_err(|_| AdvertiserError::Busy)?;
        CURRENT.store(0, Ordering::Release);
        Ok(())
    }

    fn set_data(&mut self, service_data: &[u8]) -> Result<(), AdvertiserError> {
        self.adv_data = Some(self.build(service_data)?);
        Ok(())
    }

    fn start(&mut self, mode: AdvertisingMode) -> Result<BroadcastId, AdvertiserError> {
        let adv_data = self
            .adv_data
            .take()
            .ok_or(AdvertiserError::InvalidState)?;
        // 0 is reserved for "no broadcast"
        let id = match self.last_id.wrapping_add(1) {
            0 => 1,
            id => id,
        };
        match self.commands.try_send(AdvCommand::Start { id, adv_data, mode }) {
            Ok(()) => {}
            Err(TrySendError::Full(command) | TrySendError::NoReceiver(command)) => {
                // Keep the payload for the retry on the next tick
                if let AdvCommand::Start { adv_data, .. } = command {
                    self.adv_data = Some(adv_data);
                }
                return Err(AdvertiserError::Busy);
            }
        }
        self.last_id = id;
        CURRENT.store(id, Ordering::Release);
        Ok(id)
    }
}

/// Scan response carrying the complete local name
pub fn scan_data(config: &AdvertisingConfig) -> LegacyAdvertisementPayload {
    LegacyAdvertisementBuilder::new()
        .full_name(config.device_name)
        .build()
}

fn peripheral_config(mode: AdvertisingMode) -> peripheral::Config {
    let AdvertisingMode::Fast {
        interval,
        timeout_secs,
    } = mode;

    let mut config = peripheral::Config::default();
    config.interval = interval;
    // SoftDevice timeout unit is 10 ms; zero means no timeout
    config.timeout = (timeout_secs != 0).then(|| timeout_secs.saturating_mul(100));
    config
}

/// Advertising task body
///
/// Runs one broadcast at a time. A new command replaces the running
/// broadcast; a timeout reports [`AdvertisingEvent::Idle`] tagged with the
/// broadcast that ended.
pub async fn run(
    sd: &'static Softdevice,
    scan_data: &LegacyAdvertisementPayload,
    commands: &mut CommandReceiver,
    events: &mut EventSender,
) -> ! {
    let mut pending = None;

    loop {
        let command = match pending.take() {
            Some(command) => command,
            None => match commands.recv().await {
                Ok(command) => command,
                Err(_) => defmt::panic!("Advertising command channel closed"),
            },
        };

        let (id, adv_data, mode) = match command {
            AdvCommand::Start { id, adv_data, mode } => (id, adv_data, mode),
            AdvCommand::Stop => continue,
        };

        let adv = NonconnectableAdvertisement::ScannableUndirected {
            adv_data: &adv_data,
            scan_data,
        };
        let config = peripheral_config(mode);

        post(events, Event::Advertising(AdvertisingEvent::Fast(id)));
        debug!("Advertising {} {=[u8]:02x}", id, &adv_data[..]);

        match select(peripheral::advertise(sd, adv, &config), commands.recv()).await {
            Either::First(result) => {
                if !matches!(result, Err(AdvertiseError::Timeout)) {
                    warn!("Advertising ended: {}", result);
                }
                // A newer start may already be queued behind this timeout
                CURRENT
                    .compare_exchange(id, 0, Ordering::AcqRel, Ordering::Acquire)
                    .ok();
                post(events, Event::Advertising(AdvertisingEvent::Idle(id)));
            }
            Either::Second(Ok(next)) => pending = Some(next),
            Either::Second(Err(_)) => defmt::panic!("Advertising command channel closed"),
        }
    }
}
