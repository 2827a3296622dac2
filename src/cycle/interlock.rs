// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The interlock gate: a pure predicate over the state snapshot, with no
//! side effects and no access to the socket or timers, grounded on the
//! teacher's preference for standalone `should_keep_connection()`-style
//! helpers living next to the stateful component they gate.

use std::fmt;

use crate::state::StateSnapshot;

/// A failed interlock precondition, in the fixed evaluation order of the
/// gate table. The discriminant order is significant: `check_start_tightening`
/// returns the smallest-index violated rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterlockViolation {
    NotConnected,
    LinkNotReady,
    ToolDisabled,
    ToolRunning,
    CtrlNotReady,
    AlarmActive,
    VinRequired,
    JobNotActive,
}

impl InterlockViolation {
    /// Stable error code, as listed in the interlock table.
    pub fn code(self) -> &'static str {
        match self {
            InterlockViolation::NotConnected => "NOT_CONNECTED",
            InterlockViolation::LinkNotReady => "LINK_NOT_READY",
            InterlockViolation::ToolDisabled => "TOOL_DISABLED",
            InterlockViolation::ToolRunning => "TOOL_RUNNING",
            InterlockViolation::CtrlNotReady => "CTRL_NOT_READY",
            InterlockViolation::AlarmActive => "ALARM_ACTIVE",
            InterlockViolation::VinRequired => "VIN_REQUIRED",
            InterlockViolation::JobNotActive => "JOB_NOT_ACTIVE",
        }
    }
}

impl fmt::Display for InterlockViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::error::Error for InterlockViolation {}

/// Rules 1–2 of the gate table, required by every operator command other
/// than `startTightening()`.
pub fn check_basic(state: &StateSnapshot) -> Result<(), InterlockViolation> {
    if !state.connection.connected {
        return Err(InterlockViolation::NotConnected);
    }
    if !state.connection.link_ready {
        return Err(InterlockViolation::LinkNotReady);
    }
    Ok(())
}

/// The full 8-rule gate for `startTightening()`. Evaluated in fixed order;
/// fails on the first violation.
pub fn check_start_tightening(state: &StateSnapshot) -> Result<(), InterlockViolation> {
    check_basic(state)?;
    if !state.tool.enabled {
        return Err(InterlockViolation::ToolDisabled);
    }
    if state.tool.running {
        return Err(InterlockViolation::ToolRunning);
    }
    if !state.controller.ready {
        return Err(InterlockViolation::CtrlNotReady);
    }
    if state.controller.error_active {
        return Err(InterlockViolation::AlarmActive);
    }
    if state.product.vin_required && !state.product.vin_valid {
        return Err(InterlockViolation::VinRequired);
    }
    if !state.job.active {
        return Err(InterlockViolation::JobNotActive);
    }
    Ok(())
}
