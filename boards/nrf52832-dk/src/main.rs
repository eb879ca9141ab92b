#![deny(unsafe_code)]
#![no_main]
#![no_std]

use defmt_rtt as _; // global logger
use panic_probe as _;
use rtic::app;
use rtic_monotonics::nrf::rtc::prelude::*;

mod advertiser;
mod bus;
mod events;
mod identity;
mod power;
mod timers;

// RTC0 belongs to the SoftDevice
nrf_rtc2_monotonic!(Mono);

/// RTC2 runs from the 32.768 kHz LFCLK without prescaler
const MONO_HZ: u32 = 32_768;

#[app(device = nrf52832_pac, peripherals = true, dispatchers = [SWI0_EGU0, SWI1_EGU1])]
mod app {
    use super::*;
    use beacon_core::{NodeConfig, NodeParts, SensorNode, TickRate, Tmp102};
    use defmt::info;
    use embassy_nrf::gpio::{Input, Level, Output, OutputDrive, Pull};
    use embassy_nrf::interrupt::Priority;
    use embassy_nrf::{bind_interrupts, peripherals, twim};
    use hal_abstractions::{Ticks, TimerId};
    use nrf_softdevice::ble::advertisement_builder::LegacyAdvertisementPayload;
    use nrf_softdevice::{raw, Softdevice};
    use rtic_sync::make_channel;
    use static_cell::StaticCell;

    use crate::advertiser::{AdvCommand, CommandReceiver, SoftdeviceAdvertiser, ADV_QUEUE};
    use crate::bus::GatedTwim;
    use crate::events::{EventReceiver, EventSender, EVENT_QUEUE};
    use crate::identity::FicrIdentity;
    use crate::power::{LedIndicator, SystemOff};
    use crate::timers::RticTimers;

    type Sensor = Tmp102<GatedTwim, Output<'static>, embassy_time::Delay>;
    type Node = SensorNode<Sensor, SoftdeviceAdvertiser, RticTimers, SystemOff, LedIndicator>;

    /// P0 pin of the wake button
    const WAKE_PIN: usize = 17;

    bind_interrupts!(struct Irqs {
        TWISPI0 => twim::InterruptHandler<peripherals::TWISPI0>;
    });

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        node: Node,
        events: EventReceiver,
        commands: CommandReceiver,
        adv_events: EventSender,
        scan_data: LegacyAdvertisementPayload,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local) {
        info!("Beacon node starting...");

        // Application interrupts must stay clear of SoftDevice priorities 0, 1 and 4
        let mut config = embassy_nrf::config::Config::default();
        config.gpiote_interrupt_priority = Priority::P2;
        config.time_interrupt_priority = Priority::P2;
        let p = embassy_nrf::init(config);

        let sd: &'static Softdevice = Softdevice::enable(&nrf_softdevice::Config {
            clock: Some(raw::nrf_clock_lf_cfg_t {
                source: raw::NRF_CLOCK_LF_SRC_XTAL as u8,
                rc_ctiv: 0,
                rc_temp_ctiv: 0,
                accuracy: raw::NRF_CLOCK_LF_ACCURACY_20_PPM as u8,
            }),
            ..Default::default()
        });
        info!("SoftDevice enabled");

        // LFCLK is running once the SoftDevice is up
        Mono::start(cx.device.RTC2);
        info!("RTC2 monotonic started at {} Hz", MONO_HZ);

        let node_config = NodeConfig::default();

        // TMP102 on TWIM0: SDA P0.26, SCL P0.27; green LED on P0.22 while sampling
        static TWIM_TX: StaticCell<[u8; 4]> = StaticCell::new();
        let twim = twim::Twim::new(
            p.TWISPI0,
            Irqs,
            p.P0_26,
            p.P0_27,
            twim::Config::default(),
            TWIM_TX.init([0; 4]),
        );
        let sensor = Tmp102::new(
            GatedTwim::new(twim),
            Output::new(p.P0_22, Level::Low, OutputDrive::Standard),
            embassy_time::Delay,
            node_config.sensor,
        );

        let scan_data = crate::advertiser::scan_data(&node_config.advertising);
        let (event_tx, event_rx) = make_channel!(beacon_core::Event, EVENT_QUEUE);
        let (command_tx, command_rx) = make_channel!(AdvCommand, ADV_QUEUE);

        let parts = NodeParts {
            sensor,
            advertiser: SoftdeviceAdvertiser::new(command_tx, node_config.advertising),
            timers: RticTimers::new(event_tx.clone()),
            power: SystemOff::new(Input::new(p.P0_17, Pull::Up), WAKE_PIN),
            indicator: LedIndicator::new(Output::new(p.P0_21, Level::Low, OutputDrive::Standard)),
        };

        let mut node = match SensorNode::new(
            &node_config,
            TickRate::from_hz(MONO_HZ),
            &FicrIdentity,
            parts,
        ) {
            Ok(node) => node,
            Err(e) => defmt::panic!("Node setup failed: {}", e),
        };

        if let Err(e) = node.boot() {
            defmt::panic!("Boot failed: {}", e);
        }

        softdevice_task::spawn(sd).ok();
        advertising_task::spawn(sd).ok();
        dispatcher::spawn().ok();

        (
            Shared {},
            Local {
                node,
                events: event_rx,
                commands: command_rx,
                adv_events: event_tx,
                scan_data,
            },
        )
    }

    #[idle]
    fn idle(_cx: idle::Context) -> ! {
        loop {
            cortex_m::asm::wfi();
        }
    }

    /// SoftDevice event pump
    #[task(priority = 1)]
    async fn softdevice_task(_cx: softdevice_task::Context, sd: &'static Softdevice) -> ! {
        sd.run().await
    }

    /// Owns the running broadcast
    #[task(priority = 1, local = [commands, adv_events, scan_data])]
    async fn advertising_task(cx: advertising_task::Context, sd: &'static Softdevice) -> ! {
        crate::advertiser::run(sd, cx.local.scan_data, cx.local.commands, cx.local.adv_events)
            .await
    }

    /// Runs every event through the node, one at a time
    #[task(priority = 1, local = [node, events])]
    async fn dispatcher(cx: dispatcher::Context) -> ! {
        let node = cx.local.node;
        loop {
            let event = match cx.local.events.recv().await {
                Ok(event) => event,
                Err(_) => defmt::panic!("Event channel closed"),
            };
            if let Err(e) = node.dispatch(event) {
                defmt::panic!("Fatal error: {}", e);
            }
        }
    }

    #[task(priority = 1)]
    async fn warmup_timer(_cx: warmup_timer::Context, ticks: Ticks, events: EventSender) {
        crate::timers::one_shot(TimerId::Warmup, ticks, events).await
    }

    #[task(priority = 1)]
    async fn sampler_timer(_cx: sampler_timer::Context, ticks: Ticks, events: EventSender) -> ! {
        crate::timers::repeating(TimerId::Sampler, ticks, events).await
    }
}
