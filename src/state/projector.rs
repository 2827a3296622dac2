// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Applies decoded inbound MIDs to the state snapshot and emits events.
//!
//! Cycle aggregation (MID 0061/0065) and command ACK/NAK resolution (MID
//! 0004/0005) are handled by [`crate::cycle`] and [`crate::command`]
//! respectively; this module owns the remaining per-MID state transitions.

use crate::events::Event;
use crate::protocol::Inbound;

use super::snapshot::{BatchState, JobState, SpindleCountSource, StateSnapshot};

/// Outcome of projecting one inbound message, beyond the events it emits
/// directly: whether the tool transitioned into the running state, which
/// the cycle aggregator uses to decide whether to start a new cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProjectionOutcome {
    pub tool_started_running: bool,
}

/// Applies one decoded `Inbound` message to `state`, pushing any resulting
/// events onto `events`.
pub fn project(state: &mut StateSnapshot, inbound: &Inbound, events: &mut Vec<Event>) -> ProjectionOutcome {
    let mut outcome = ProjectionOutcome::default();
    match inbound {
        Inbound::LinkEstablished { revision } => {
            state.protocol.revision = *revision;
            state.connection.link_ready = true;
            state.protocol.subscriptions.tightening_results = true;
            state.protocol.subscriptions.alarms = true;
            events.push(Event::LinkEstablished { revision: *revision });
        }
        Inbound::JobReply(job) => {
            state.job = JobState {
                job_id: Some(job.job_id),
                param_set_id: Some(job.param_set_id),
                active: true,
                locked: true,
            };
            state.product.vin_locked = false;
            events.push(Event::JobSelected {
                job_id: job.job_id,
                param_set_id: job.param_set_id,
            });
        }
        Inbound::BatchReply(batch) => {
            state.batch = BatchState {
                batch_id: Some(batch.batch_id),
                size: Some(batch.size),
                counter: 0,
                active: true,
                complete: false,
                locked: true,
                pending_reset: false,
            };
            state.product.vin_locked = false;
            events.push(Event::BatchStarted {
                batch_id: batch.batch_id,
                size: batch.size,
            });
        }
        Inbound::ToolStatus(status) => {
            let was_running = state.tool.running;
            state.controller.ready = status.controller_ready;
            state.tool.enabled = status.tool_enabled;
            state.tool.running = status.tool_running;
            state.controller.error_active = status.alarm_active;
            outcome.tool_started_running = !was_running && status.tool_running;
        }
        Inbound::VinReply { vin } => {
            state.product.vin = vin.clone();
        }
        Inbound::VinRequired { required } => {
            state.product.vin_required = *required;
            events.push(Event::VinRequired { required: *required });
        }
        Inbound::Alarm(alarm) => {
            state.controller.alarms.push(alarm.clone());
            state.controller.error_active = true;
            events.push(Event::Alarm {
                code: alarm.code,
                message: alarm.message.clone(),
            });
        }
        Inbound::AlarmStatus { active } => {
            if !active {
                state.controller.alarms.clear();
                state.controller.error_active = false;
            }
            events.push(Event::AlarmStatus { active: *active });
        }
        Inbound::BatchDecrementAck => {
            state.batch.counter = state.batch.counter.saturating_sub(1);
            state.batch.complete = false;
        }
        Inbound::MultiSpindleCount { spindle_count } if *spindle_count > 0 => {
            let updated = state
                .tool
                .adopt_spindle_count(*spindle_count as u8, SpindleCountSource::Mid101);
            if updated {
                events.push(Event::SpindleCountUpdated {
                    count: state.tool.spindle_count,
                    source: state.tool.spindle_count_source,
                });
            }
        }
        // Command accept/error, param-set/batch-decrement replies and
        // results are handled by the command tracker / cycle aggregator.
        _ => {}
    }
    events.push(Event::StateChanged {
        state: state.clone(),
    });
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{BatchInfo, JobInfo, ToolStatusInfo};

    #[test]
    fn job_reply_clears_vin_lock() {
        let mut state = StateSnapshot::default();
        state.product.vin_locked = true;
        let mut events = Vec::new();
        project(
            &mut state,
            &Inbound::JobReply(JobInfo {
                job_id: 7,
                param_set_id: 2,
            }),
            &mut events,
        );
        assert!(!state.product.vin_locked);
        assert!(state.job.active);
        assert!(events.iter().any(|e| matches!(e, Event::JobSelected { .. })));
    }

    #[test]
    fn batch_reply_resets_counter_and_locks() {
        let mut state = StateSnapshot::default();
        let mut events = Vec::new();
        project(
            &mut state,
            &Inbound::BatchReply(BatchInfo { batch_id: 1, size: 10 }),
            &mut events,
        );
        assert_eq!(state.batch.counter, 0);
        assert!(state.batch.active);
        assert!(!state.batch.complete);
    }

    #[test]
    fn tool_status_reports_rising_edge() {
        let mut state = StateSnapshot::default();
        let mut events = Vec::new();
        let outcome = project(
            &mut state,
            &Inbound::ToolStatus(ToolStatusInfo {
                controller_ready: true,
                tool_enabled: true,
                tool_running: true,
                alarm_active: false,
            }),
            &mut events,
        );
        assert!(outcome.tool_started_running);

        let outcome2 = project(
            &mut state,
            &Inbound::ToolStatus(ToolStatusInfo {
                controller_ready: true,
                tool_enabled: true,
                tool_running: true,
                alarm_active: false,
            }),
            &mut events,
        );
        assert!(!outcome2.tool_started_running);
    }

    #[test]
    fn alarm_status_false_clears_alarm_list() {
        let mut state = StateSnapshot::default();
        let mut events = Vec::new();
        project(
            &mut state,
            &Inbound::Alarm(crate::protocol::AlarmInfo {
                code: 5,
                message: "jam".into(),
            }),
            &mut events,
        );
        assert_eq!(state.controller.alarms.len(), 1);
        project(&mut state, &Inbound::AlarmStatus { active: false }, &mut events);
        assert!(state.controller.alarms.is_empty());
        assert!(!state.controller.error_active);
    }

    #[test]
    fn sticky_spindle_count_resists_mid101() {
        let mut state = StateSnapshot::default();
        state.tool.spindle_count = 4;
        state.tool.spindle_count_source = SpindleCountSource::Config;
        let mut events = Vec::new();
        project(&mut state, &Inbound::MultiSpindleCount { spindle_count: 2 }, &mut events);
        assert_eq!(state.tool.spindle_count, 4);
    }
}
