// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tightening cycle aggregation: start detection, per-spindle result
//! collection, watchdog-bounded completion, mandatory ACK.

use std::time::{Duration, Instant};

use crate::events::Event;
use crate::protocol::ResultMessage;
use crate::state::{SpindleCountSource, StateSnapshot};

const WATCHDOG_DURATION: Duration = Duration::from_secs(8);

/// Ephemeral per-cycle state. Always cleared before the next cycle starts.
#[derive(Debug, Default)]
pub struct CycleAggregator {
    in_progress: bool,
    cycle_start: Option<Instant>,
    watchdog_deadline: Option<Instant>,
    pending_spindles: Vec<ResultMessage>,
}

impl CycleAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    /// Start a new cycle, triggered when MID 0041 reports `tool_running`
    /// rising with no cycle already in progress.
    pub fn start(&mut self, now: Instant) -> Event {
        self.in_progress = true;
        self.cycle_start = Some(now);
        self.watchdog_deadline = Some(now + WATCHDOG_DURATION);
        self.pending_spindles.clear();
        Event::TighteningCycleStarted { timestamp: now }
    }

    /// Process one MID 0061/0065 result. Always returns the events to
    /// emit, in order; the caller must still send a mandatory MID 0062 ACK
    /// regardless of what is returned here.
    pub fn process_result(
        &mut self,
        state: &mut StateSnapshot,
        result: ResultMessage,
        now: Instant,
    ) -> Vec<Event> {
        let mut events = Vec::new();

        if !state.product.vin_locked && !state.product.vin.is_empty() {
            state.product.vin_locked = true;
            events.push(Event::VinLocked {
                vin: state.product.vin.clone(),
            });
        }

        if state.tool.spindle_count_source == SpindleCountSource::Default
            && result.spindle > state.tool.spindle_count
        {
            state.tool.spindle_count = result.spindle;
            state.tool.spindle_count_source = SpindleCountSource::Mid061;
            events.push(Event::SpindleCountUpdated {
                count: state.tool.spindle_count,
                source: state.tool.spindle_count_source,
            });
        }

        events.push(Event::SpindleResult {
            result: result.clone(),
        });

        if let Some(existing) = self
            .pending_spindles
            .iter_mut()
            .find(|r| r.spindle == result.spindle)
        {
            *existing = result;
        } else {
            self.pending_spindles.push(result);
        }

        if (self.pending_spindles.len() as u8) < state.tool.spindle_count {
            return events;
        }

        let duration = self
            .cycle_start
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default();
        let overall_ok = self.pending_spindles.iter().all(|r| r.ok);
        let results = std::mem::take(&mut self.pending_spindles);
        self.clear();

        if state.batch.active && !state.batch.complete {
            state.batch.counter += 1;
            events.push(Event::BatchProgress {
                counter: state.batch.counter,
                size: state.batch.size.unwrap_or(0),
            });
            if Some(state.batch.counter) >= state.batch.size {
                state.batch.complete = true;
                events.push(Event::BatchCompleted {
                    batch_id: state.batch.batch_id.unwrap_or(0),
                });
            }
        }

        events.push(Event::TighteningCycleCompleted {
            results,
            overall_ok,
            duration,
        });
        events
    }

    /// Check the watchdog against `now`; returns `Some(event)` exactly
    /// once per expired cycle.
    pub fn poll_watchdog(&mut self, now: Instant, expected: u8) -> Option<Event> {
        let deadline = self.watchdog_deadline?;
        if now < deadline {
            return None;
        }
        let received = self.pending_spindles.len() as u8;
        let results = std::mem::take(&mut self.pending_spindles);
        self.clear();
        Some(Event::TighteningIncomplete {
            expected,
            received,
            results,
        })
    }

    /// Reset ephemeral cycle state. Called internally on completion/
    /// watchdog expiry, and by the client on disconnect so a mid-flight
    /// cycle doesn't survive into the next connection.
    pub fn clear(&mut self) {
        self.in_progress = false;
        self.cycle_start = None;
        self.watchdog_deadline = None;
        self.pending_spindles.clear();
    }
}
