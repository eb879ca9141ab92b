//! Event queue into the dispatcher task

use beacon_core::Event;
use defmt::warn;
use rtic_sync::channel::{Receiver, Sender};

/// Depth of the event queue
///
/// At most one timer fire and two advertising events are outstanding at a
/// time; the rest is headroom.
pub const EVENT_QUEUE: usize = 8;

pub type EventSender = Sender<'static, Event, EVENT_QUEUE>;
pub type EventReceiver = Receiver<'static, Event, EVENT_QUEUE>;

/// Queue an event without waiting
///
/// A full queue drops the event. Timer fires recur and advertising events
/// are re-raised on the next start, so nothing is lost for good.
pub fn post(events: &mut EventSender, event: Event) {
    if events.try_send(event).is_err() {
        warn!("Event queue full, dropping {}", event);
    }
}
