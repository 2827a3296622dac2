// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The state snapshot: plain-old-data, `Clone + PartialEq`, no interior
//! mutability and no shared `Rc`/`Arc` substructure, so `getState()` is a
//! structural defensive copy rather than a runtime deep-copy routine.

use crate::protocol::AlarmInfo;

/// Authority that last set `tool.spindle_count`. `Config` and `Manual` are
/// sticky: incoming MID 0101/0061 may never lower their authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpindleCountSource {
    Default,
    Config,
    Manual,
    Mid101,
    Mid061,
}

impl SpindleCountSource {
    fn is_sticky(self) -> bool {
        matches!(self, SpindleCountSource::Config | SpindleCountSource::Manual)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionState {
    pub connected: bool,
    pub link_ready: bool,
    pub last_received_mid: Option<u16>,
    pub reconnecting: bool,
    pub reconnect_attempts: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Subscriptions {
    pub tightening_results: bool,
    pub alarms: bool,
    pub multi_spindle_status: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolState {
    pub revision: u16,
    pub subscriptions: Subscriptions,
}

impl Default for ProtocolState {
    fn default() -> Self {
        Self {
            revision: 1,
            subscriptions: Subscriptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerState {
    pub ready: bool,
    pub error_active: bool,
    pub error_code: Option<u32>,
    pub alarms: Vec<AlarmInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolState {
    pub enabled: bool,
    pub running: bool,
    pub spindle_count: u8,
    pub spindle_count_source: SpindleCountSource,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            enabled: false,
            running: false,
            spindle_count: 1,
            spindle_count_source: SpindleCountSource::Default,
        }
    }
}

impl ToolState {
    /// Apply a spindle-count report from `source`, respecting stickiness
    /// of a previously-configured/manual authority.
    pub fn adopt_spindle_count(&mut self, count: u8, source: SpindleCountSource) -> bool {
        if count == 0 {
            return false;
        }
        if self.spindle_count_source.is_sticky() && source != self.spindle_count_source {
            return false;
        }
        if self.spindle_count == count && self.spindle_count_source == source {
            return false;
        }
        self.spindle_count = count;
        self.spindle_count_source = source;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductState {
    pub vin: String,
    pub vin_required: bool,
    pub vin_valid: bool,
    pub vin_locked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobState {
    pub job_id: Option<u32>,
    pub param_set_id: Option<u32>,
    pub active: bool,
    pub locked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchState {
    pub batch_id: Option<u32>,
    pub size: Option<u32>,
    pub counter: u32,
    pub active: bool,
    pub complete: bool,
    pub locked: bool,
    pub pending_reset: bool,
}

/// The deep, externally-visible state tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateSnapshot {
    pub connection: ConnectionState,
    pub protocol: ProtocolState,
    pub controller: ControllerState,
    pub tool: ToolState,
    pub product: ProductState,
    pub job: JobState,
    pub batch: BatchState,
}
