// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The closed event set emitted to listeners.
//!
//! Dispatched through a simple `Vec<Box<dyn FnMut(&Event)>>` registry owned
//! by the single executor — a drastically simplified reading of the
//! teacher's callback-subscriber idea without its lock-free multi-consumer
//! ring buffer (unneeded for one connection on one thread).

use std::time::{Duration, Instant};

use crate::frame::FrameError;
use crate::protocol::ResultMessage;
use crate::state::{SpindleCountSource, StateSnapshot};

/// A single domain event. Payloads are value types; no shared mutable
/// structure crosses the listener boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connected,
    Disconnected,
    Reconnecting { attempt: u32, delay: Duration },
    LinkEstablished { revision: u16 },
    TighteningCycleStarted { timestamp: Instant },
    SpindleResult { result: ResultMessage },
    TighteningCycleCompleted {
        results: Vec<ResultMessage>,
        overall_ok: bool,
        duration: Duration,
    },
    TighteningIncomplete {
        expected: u8,
        received: u8,
        results: Vec<ResultMessage>,
    },
    CommandAccepted { mid: u16 },
    CommandError { failed_mid: u16, error_code: u32, message: String },
    CommandTimeout { mid: u16, command_id: u64 },
    CommandAborted { mid: u16, command_id: u64 },
    CommandSuccess { mid: u16, command_id: u64 },
    CommandFailed { mid: u16, command_id: u64, error_code: u32, message: String },
    JobSelected { job_id: u32, param_set_id: u32 },
    VinRequired { required: bool },
    VinLocked { vin: String },
    BatchStarted { batch_id: u32, size: u32 },
    BatchProgress { counter: u32, size: u32 },
    BatchCompleted { batch_id: u32 },
    BatchResetConfirmed,
    BatchResetFailed,
    Alarm { code: u32, message: String },
    AlarmStatus { active: bool },
    SpindleCountUpdated { count: u8, source: SpindleCountSource },
    StateChanged { state: StateSnapshot },
    FrameError { error: FrameError },
    ParseError { mid: u16 },
    Error { message: String },
}

type Listener = Box<dyn FnMut(&Event)>;

/// Owns the registered listeners and fans each event out to all of them.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn FnMut(&Event)>) {
        self.listeners.push(listener);
    }

    pub fn emit(&mut self, event: Event) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn fans_out_to_all_listeners() {
        let seen = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        for _ in 0..3 {
            let seen = seen.clone();
            bus.subscribe(Box::new(move |_e| *seen.borrow_mut() += 1));
        }
        bus.emit(Event::Connected);
        assert_eq!(*seen.borrow(), 3);
    }
}
