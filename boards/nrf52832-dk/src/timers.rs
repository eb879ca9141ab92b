//! Application timers as RTIC software tasks
//!
//! Each [`TimerId`] maps to one software task that waits on the RTC2
//! monotonic and posts [`Event::Timer`] when it fires. RTIC refuses to
//! spawn a task that is still running, which is reported as
//! [`TimerError::AlreadyRunning`].

use beacon_core::Event;
use hal_abstractions::{Ticks, TimerError, TimerId, TimerMode, TimerService};
use rtic_monotonics::Monotonic;

use crate::app::{sampler_timer, warmup_timer};
use crate::events::{post, EventSender};
use crate::Mono;

type Duration = <Mono as Monotonic>::Duration;

/// [`TimerService`] backed by the timer tasks
pub struct RticTimers {
    events: EventSender,
}

impl RticTimers {
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }
}

impl TimerService for RticTimers {
    type Handle = TimerId;

    fn create(&mut self, mode: TimerMode, id: TimerId) -> Result<TimerId, TimerError> {
        // Each task implements exactly one mode
        match (id, mode) {
            (TimerId::Warmup, TimerMode::OneShot) | (TimerId::Sampler, TimerMode::Repeating) => {
                Ok(id)
            }
            _ => Err(TimerError::NoResources),
        }
    }

    fn start(&mut self, handle: TimerId, ticks: Ticks) -> Result<(), TimerError> {
        if ticks == 0 {
            return Err(TimerError::InvalidDuration);
        }
        let events = self.events.clone();
        match handle {
            TimerId::Warmup => warmup_timer::spawn(ticks, events),
            TimerId::Sampler => sampler_timer::spawn(ticks, events),
        }
        .map_err(|_| TimerError::AlreadyRunning)
    }
}

/// One-shot timer body
pub async fn one_shot(id: TimerId, ticks: Ticks, mut events: EventSender) {
    Mono::delay(Duration::from_ticks(u64::from(ticks))).await;
    post(&mut events, Event::Timer(id));
}

/// Repeating timer body, free of drift from dispatch latency
pub async fn repeating(id: TimerId, ticks: Ticks, mut events: EventSender) -> ! {
    let period = Duration::from_ticks(u64::from(ticks));
    let mut next = Mono::now() + period;
    loop {
        Mono::delay_until(next).await;
        next += period;
        post(&mut events, Event::Timer(id));
    }
}
