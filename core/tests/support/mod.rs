//! Recording fakes for the board collaborators
//!
//! All fakes append to one shared call log so tests can check the order of
//! operations across components.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use beacon_core::{
    CycleOutcome, Event, FatalError, Measurement, NodeConfig, NodeParts, SampleError,
    SampleOutcome, SensorNode, SensorReader, TickRate,
};
use hal_abstractions::{
    Advertiser, AdvertiserError, AdvertisingMode, BroadcastId, IdentitySource, Indication, Indicator,
    PowerControl, PowerError, Ticks, TimerError, TimerId, TimerMode, TimerService,
};

pub const TIMER_HZ: u32 = 32_768;
pub const WARMUP_TICKS: Ticks = 3_277;
pub const INTERVAL_TICKS: Ticks = 327_700;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Read,
    AdvStop,
    AdvSetData(Vec<u8>),
    AdvStart(AdvertisingMode),
    TimerStart(TimerId, Ticks),
    Indicate(Indication),
    SystemOff,
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub struct FixedIdentity(pub [u32; 2]);

impl IdentitySource for FixedIdentity {
    fn device_id(&self) -> [u32; 2] {
        self.0
    }
}

/// Sensor returning scripted outcomes, then failing
pub struct ScriptedSensor {
    log: CallLog,
    outcomes: Rc<RefCell<VecDeque<SampleOutcome>>>,
}

impl SensorReader for ScriptedSensor {
    fn read_sample(&mut self) -> SampleOutcome {
        self.log.borrow_mut().push(Call::Read);
        self.outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(SampleError::NotReady))
    }
}

/// Advertiser with an optional queue of injected failures per call
pub struct FakeAdvertiser {
    log: CallLog,
    failures: Rc<RefCell<VecDeque<(Call, AdvertiserError)>>>,
    advertising: Rc<RefCell<bool>>,
    last_broadcast: Rc<RefCell<BroadcastId>>,
}

impl FakeAdvertiser {
    fn injected(&self, call: &Call) -> Option<AdvertiserError> {
        let mut failures = self.failures.borrow_mut();
        let matches = failures
            .front()
            .is_some_and(|(c, _)| std::mem::discriminant(c) == std::mem::discriminant(call));
        if matches {
            failures.pop_front().map(|(_, e)| e)
        } else {
            None
        }
    }
}

impl Advertiser for FakeAdvertiser {
    fn stop(&mut self) -> Result<(), AdvertiserError> {
        self.log.borrow_mut().push(Call::AdvStop);
        if let Some(e) = self.injected(&Call::AdvStop) {
            return Err(e);
        }
        let mut advertising = self.advertising.borrow_mut();
        if !*advertising {
            return Err(AdvertiserError::InvalidState);
        }
        *advertising = false;
        Ok(())
    }

    fn set_data(&mut self, service_data: &[u8]) -> Result<(), AdvertiserError> {
        assert!(
            !*self.advertising.borrow(),
            "payload changed while advertising"
        );
        let call = Call::AdvSetData(service_data.to_vec());
        self.log.borrow_mut().push(call.clone());
        self.injected(&call).map_or(Ok(()), Err)
    }

    fn start(&mut self, mode: AdvertisingMode) -> Result<BroadcastId, AdvertiserError> {
        let call = Call::AdvStart(mode);
        self.log.borrow_mut().push(call.clone());
        if let Some(e) = self.injected(&call) {
            return Err(e);
        }
        *self.advertising.borrow_mut() = true;
        let mut id = self.last_broadcast.borrow_mut();
        *id += 1;
        Ok(*id)
    }
}

#[derive(Debug, Default)]
pub struct TimerState {
    pub created: Vec<(TimerMode, TimerId)>,
    pub armed: Vec<(TimerId, Ticks)>,
    pub fail_start: Option<TimerError>,
}

pub struct FakeTimers {
    log: CallLog,
    state: Rc<RefCell<TimerState>>,
}

impl TimerService for FakeTimers {
    type Handle = usize;

    fn create(&mut self, mode: TimerMode, id: TimerId) -> Result<usize, TimerError> {
        let mut state = self.state.borrow_mut();
        state.created.push((mode, id));
        Ok(state.created.len() - 1)
    }

    fn start(&mut self, handle: usize, ticks: Ticks) -> Result<(), TimerError> {
        let mut state = self.state.borrow_mut();
        if let Some(e) = state.fail_start {
            return Err(e);
        }
        let (_, id) = *state.created.get(handle).ok_or(TimerError::InvalidHandle)?;
        if state.armed.iter().any(|(armed, _)| *armed == id) {
            return Err(TimerError::AlreadyRunning);
        }
        state.armed.push((id, ticks));
        self.log.borrow_mut().push(Call::TimerStart(id, ticks));
        Ok(())
    }
}

pub struct FakePower {
    log: CallLog,
}

impl PowerControl for FakePower {
    fn system_off(&mut self) -> Result<(), PowerError> {
        self.log.borrow_mut().push(Call::SystemOff);
        Ok(())
    }
}

pub struct FakeIndicator {
    log: CallLog,
}

impl Indicator for FakeIndicator {
    fn indicate(&mut self, indication: Indication) {
        self.log.borrow_mut().push(Call::Indicate(indication));
    }
}

pub type Node = SensorNode<ScriptedSensor, FakeAdvertiser, FakeTimers, FakePower, FakeIndicator>;

/// A node wired to fakes plus handles into their shared state
pub struct Harness {
    pub node: Node,
    pub log: CallLog,
    pub outcomes: Rc<RefCell<VecDeque<SampleOutcome>>>,
    pub adv_failures: Rc<RefCell<VecDeque<(Call, AdvertiserError)>>>,
    pub advertising: Rc<RefCell<bool>>,
    pub last_broadcast: Rc<RefCell<BroadcastId>>,
    pub timers: Rc<RefCell<TimerState>>,
}

impl Harness {
    pub fn new(config: NodeConfig, device_id: [u32; 2]) -> Self {
        Self::try_new(config, device_id).expect("node construction")
    }

    pub fn try_new(config: NodeConfig, device_id: [u32; 2]) -> Result<Self, FatalError> {
        let log = CallLog::default();
        let outcomes = Rc::new(RefCell::new(VecDeque::new()));
        let adv_failures = Rc::new(RefCell::new(VecDeque::new()));
        let advertising = Rc::new(RefCell::new(false));
        let last_broadcast = Rc::new(RefCell::new(0));
        let timers = Rc::new(RefCell::new(TimerState::default()));

        let parts = NodeParts {
            sensor: ScriptedSensor {
                log: log.clone(),
                outcomes: outcomes.clone(),
            },
            advertiser: FakeAdvertiser {
                log: log.clone(),
                failures: adv_failures.clone(),
                advertising: advertising.clone(),
                last_broadcast: last_broadcast.clone(),
            },
            timers: FakeTimers {
                log: log.clone(),
                state: timers.clone(),
            },
            power: FakePower { log: log.clone() },
            indicator: FakeIndicator { log: log.clone() },
        };

        let node = SensorNode::new(
            &config,
            TickRate::from_hz(TIMER_HZ),
            &FixedIdentity(device_id),
            parts,
        )?;

        Ok(Self {
            node,
            log,
            outcomes,
            adv_failures,
            advertising,
            last_broadcast,
            timers,
        })
    }

    pub fn queue_sample(&self, outcome: SampleOutcome) {
        self.outcomes.borrow_mut().push_back(outcome);
    }

    pub fn queue_reading(&self, raw: [u8; 2]) {
        self.queue_sample(Ok(Measurement::new(raw)));
    }

    pub fn fail_next(&self, call: Call, error: AdvertiserError) {
        self.adv_failures.borrow_mut().push_back((call, error));
    }

    /// Simulate the timer subsystem firing `id`; one-shot timers disarm
    pub fn fire(&mut self, id: TimerId) -> Result<Option<CycleOutcome>, FatalError> {
        {
            let mut state = self.timers.borrow_mut();
            let armed = state.armed.iter().any(|(armed, _)| *armed == id);
            assert!(armed, "{:?} fired while not armed", id);
            let one_shot = state
                .created
                .iter()
                .any(|(mode, created)| *created == id && *mode == TimerMode::OneShot);
            if one_shot {
                state.armed.retain(|(armed, _)| *armed != id);
            }
        }
        self.node.dispatch(Event::Timer(id))
    }

    /// Id of the most recent successful start
    pub fn broadcast(&self) -> BroadcastId {
        *self.last_broadcast.borrow()
    }

    pub fn armed(&self) -> Vec<(TimerId, Ticks)> {
        self.timers.borrow().armed.clone()
    }

    pub fn take_log(&self) -> Vec<Call> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    pub fn payload(&self) -> [u8; 10] {
        self.node.pipeline().payload().to_bytes()
    }
}
