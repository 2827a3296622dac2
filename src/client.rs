// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The top-level client: wires the frame codec, MID codec, command
//! tracker, connection manager, state/event projector and cycle
//! aggregator behind one `poll(now)` entry point.
//!
//! Single-executor model: every tick-driving method takes an explicit
//! `Instant` rather than reading the wall clock, so the whole client can
//! be driven deterministically from `tests/scenarios.rs` without a real
//! socket or real sleeping.

use std::time::Instant;

use log::warn;

use crate::command::CommandTracker;
use crate::config::ClientConfig;
use crate::connection::{BoxedByteStream, ConnectionManager};
use crate::cycle::{check_basic, check_start_tightening, CycleAggregator};
use crate::error::{CommandError, Result};
use crate::events::{Event, EventBus};
use crate::protocol::{decode_inbound, encode_download_vin, encode_select_job, encode_select_param_set, mid, Inbound};
use crate::state::{project, SpindleCountSource, StateSnapshot};

/// The Open Protocol client.
pub struct Client {
    config: ClientConfig,
    auto_reconnect: bool,
    connection: ConnectionManager,
    commands: CommandTracker,
    state: StateSnapshot,
    cycle: CycleAggregator,
    events: EventBus,
}

impl Client {
    pub fn new(config: ClientConfig, now: Instant) -> Self {
        let auto_reconnect = config.auto_reconnect;
        let mut state = StateSnapshot::default();
        if let Some(count) = config.spindle_count {
            state.tool.spindle_count = count;
            state.tool.spindle_count_source = SpindleCountSource::Config;
        }
        let connection = ConnectionManager::new(config.host.clone(), config.port, config.validate_frames, now);
        Self {
            commands: CommandTracker::new(config.allow_duplicate_commands),
            auto_reconnect,
            connection,
            state,
            cycle: CycleAggregator::new(),
            events: EventBus::new(),
            config,
        }
    }

    /// Register a listener invoked for every event, in addition to the
    /// events returned from [`Client::poll`].
    pub fn on_event(&mut self, listener: Box<dyn FnMut(&Event)>) {
        self.events.subscribe(listener);
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn get_state(&self) -> StateSnapshot {
        self.state.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.connection.connected
    }

    pub fn is_ready(&self) -> bool {
        self.state.connection.connected
            && self.state.connection.link_ready
            && self.state.controller.ready
            && !self.state.controller.error_active
    }

    pub fn get_spindle_count(&self) -> u8 {
        self.state.tool.spindle_count
    }

    /// Override the spindle count locally (sticky, `Manual` authority).
    /// Does not touch the wire: Open Protocol has no MID for this.
    pub fn set_spindle_count(&mut self, count: u8) -> Result<()> {
        if !(1..=99).contains(&count) {
            return Err(CommandError::OutOfRange {
                what: "spindle_count",
                value: count as i64,
            }
            .into());
        }
        self.state.tool.spindle_count = count;
        self.state.tool.spindle_count_source = SpindleCountSource::Manual;
        Ok(())
    }

    /// Open the TCP connection and send the initial MID 0001 handshake.
    pub fn connect(&mut self, now: Instant) -> Result<Vec<Event>> {
        self.connection.connect(now)?;
        Ok(self.finish_connect(now))
    }

    /// Inject an already-established stream (used by tests with a mock
    /// `ByteStream`) in place of a real `connect()`.
    pub fn connect_with_stream(&mut self, stream: BoxedByteStream, now: Instant) -> Vec<Event> {
        self.connection.adopt_stream(stream, now);
        self.finish_connect(now)
    }

    fn finish_connect(&mut self, now: Instant) -> Vec<Event> {
        let mut out = Vec::new();
        self.state.connection.connected = true;
        self.state.connection.reconnecting = false;
        self.state.connection.reconnect_attempts = 0;
        out.push(Event::Connected);
        if let Err(e) = self.connection.send(mid::COMM_START, &[], true, now) {
            warn!("failed to send comm-start: {e}");
        }
        out
    }

    /// Explicit disconnect: sends MID 0002, disables auto-reconnect, and
    /// tears down the socket.
    pub fn disconnect(&mut self, now: Instant) -> Vec<Event> {
        let _ = self.connection.send(mid::COMM_STOP, &[], false, now);
        self.auto_reconnect = false;
        self.teardown(now)
    }

    fn teardown(&mut self, now: Instant) -> Vec<Event> {
        let mut out = Vec::new();
        self.connection.close();
        out.extend(self.commands.abort_all());
        self.cycle.clear();
        self.state.connection.connected = false;
        self.state.connection.link_ready = false;
        let _ = now;
        out.push(Event::Disconnected);
        out
    }

    /// Drain available frames, project them onto state, service timers.
    /// This is the single executor's entry point; call it repeatedly from
    /// one thread.
    pub fn poll(&mut self, now: Instant) -> Vec<Event> {
        let mut out = Vec::new();

        if self.connection.is_connected() {
            match self.connection.poll_frames(now) {
                Ok((frames, errors)) => {
                    for error in errors {
                        out.push(Event::FrameError { error });
                    }
                    for frame in frames {
                        self.handle_frame(frame, now, &mut out);
                    }
                }
                Err(e) => {
                    warn!("connection lost: {e}");
                    out.push(Event::Error {
                        message: e.to_string(),
                    });
                    out.extend(self.teardown(now));
                    if self.auto_reconnect {
                        let (attempt, delay) = self.connection.schedule_reconnect(now);
                        self.state.connection.reconnecting = true;
                        self.state.connection.reconnect_attempts = attempt;
                        out.push(Event::Reconnecting { attempt, delay });
                    }
                }
            }

            if self.connection.heartbeat_due(now) {
                if let Err(e) = self.connection.send_heartbeat(now) {
                    warn!("heartbeat send failed: {e}");
                }
            }
        } else if self.connection.reconnect_due(now) {
            match self.connection.connect(now) {
                Ok(()) => out.extend(self.finish_connect(now)),
                Err(e) => {
                    warn!("reconnect attempt failed: {e}");
                    let (attempt, delay) = self.connection.schedule_reconnect(now);
                    self.state.connection.reconnect_attempts = attempt;
                    out.push(Event::Reconnecting { attempt, delay });
                }
            }
        }

        out.extend(self.commands.poll_timeouts(now));

        if self.cycle.in_progress() {
            if let Some(ev) = self.cycle.poll_watchdog(now, self.state.tool.spindle_count) {
                out.push(ev);
            }
        }

        for event in &out {
            self.events.emit(event.clone());
        }
        out
    }

    fn handle_frame(&mut self, frame: crate::frame::DecodedFrame, now: Instant, out: &mut Vec<Event>) {
        self.state.connection.last_received_mid = Some(frame.mid);
        let inbound = decode_inbound(&frame, self.state.protocol.revision);
        match inbound {
            Inbound::CommandAccepted { accepted_mid } => {
                out.push(Event::CommandAccepted { mid: accepted_mid });
                if let Some(resolved) = self.commands.resolve_accepted(accepted_mid) {
                    out.push(Event::CommandSuccess {
                        mid: resolved.mid,
                        command_id: resolved.command_id,
                    });
                    if resolved.mid == mid::RESET_BATCH {
                        self.state.batch.counter = 0;
                        self.state.batch.complete = false;
                        self.state.batch.pending_reset = false;
                        out.push(Event::BatchResetConfirmed);
                    }
                }
            }
            Inbound::CommandError {
                failed_mid,
                error_code,
                message,
            } => {
                out.push(Event::CommandError {
                    failed_mid,
                    error_code,
                    message: message.clone(),
                });
                if let Some(resolved) = self.commands.resolve_failed(failed_mid) {
                    out.push(Event::CommandFailed {
                        mid: resolved.mid,
                        command_id: resolved.command_id,
                        error_code,
                        message: message.clone(),
                    });
                    if resolved.mid == mid::RESET_BATCH {
                        self.state.batch.pending_reset = false;
                        out.push(Event::BatchResetFailed);
                    }
                }
            }
            Inbound::Result(result) | Inbound::OldResult(result) => {
                out.extend(self.cycle.process_result(&mut self.state, result, now));
                if let Err(e) = self.connection.send(mid::RESULT_ACK, &[], false, now) {
                    warn!("failed to send result ack: {e}");
                }
            }
            Inbound::ParseError { mid: parse_mid } => {
                out.push(Event::ParseError { mid: parse_mid });
                // Mandatory ACK applies even when a result payload fails to
                // parse (spec P5): the controller still needs MID 0062.
                if parse_mid == mid::LAST_RESULT || parse_mid == mid::OLD_RESULT {
                    if let Err(e) = self.connection.send(mid::RESULT_ACK, &[], false, now) {
                        warn!("failed to send result ack after parse error: {e}");
                    }
                }
            }
            Inbound::LinkEstablished { revision } => {
                project(&mut self.state, &Inbound::LinkEstablished { revision }, out);
                for auto_mid in [mid::SUBSCRIBE_RESULTS, mid::ALARM] {
                    match self.commands.track(auto_mid, now) {
                        Ok(_) => {
                            if let Err(e) = self.connection.send(auto_mid, &[], true, now) {
                                warn!("failed to send auto-subscribe MID {auto_mid}: {e}");
                            }
                        }
                        Err(e) => warn!("auto-subscribe MID {auto_mid} not sent: {e}"),
                    }
                }
            }
            other => {
                let outcome = project(&mut self.state, &other, out);
                if outcome.tool_started_running && !self.cycle.in_progress() {
                    out.push(self.cycle.start(now));
                }
            }
        }
    }

    fn send_command(&mut self, mid: u16, payload: &[u8], now: Instant) -> Result<u64> {
        check_basic(&self.state)?;
        let command_id = self.commands.track(mid, now)?;
        self.connection.send(mid, payload, true, now)?;
        Ok(command_id)
    }

    pub fn select_job(&mut self, job_id: u32, now: Instant) -> Result<u64> {
        if job_id > 9999 {
            return Err(CommandError::OutOfRange {
                what: "job_id",
                value: job_id as i64,
            }
            .into());
        }
        self.send_command(mid::SELECT_JOB, &encode_select_job(job_id), now)
    }

    pub fn download_vin(&mut self, vin: &str, now: Instant) -> Result<u64> {
        if vin.len() > 25 {
            return Err(CommandError::VinTooLong(vin.len()).into());
        }
        let id = self.send_command(mid::DOWNLOAD_VIN, &encode_download_vin(vin), now)?;
        self.state.product.vin_valid = true;
        Ok(id)
    }

    pub fn select_parameter_set(&mut self, id: u32, now: Instant) -> Result<u64> {
        if id > 999 {
            return Err(CommandError::OutOfRange {
                what: "param_set_id",
                value: id as i64,
            }
            .into());
        }
        self.send_command(mid::SELECT_PARAM_SET, &encode_select_param_set(id), now)
    }

    pub fn enable_tool(&mut self, now: Instant) -> Result<u64> {
        self.send_command(mid::ENABLE_TOOL, &[], now)
    }

    pub fn disable_tool(&mut self, now: Instant) -> Result<u64> {
        self.send_command(mid::DISABLE_TOOL, &[], now)
    }

    /// Send `startTightening()`, gated by the full 8-rule interlock.
    pub fn start_tightening(&mut self, now: Instant) -> Result<u64> {
        check_start_tightening(&self.state)?;
        let command_id = self.commands.track(mid::START, now)?;
        self.connection.send(mid::START, &[], true, now)?;
        Ok(command_id)
    }

    pub fn reset_batch(&mut self, now: Instant) -> Result<u64> {
        let id = self.send_command(mid::RESET_BATCH, &[], now)?;
        self.state.batch.pending_reset = true;
        Ok(id)
    }

    pub fn decrement_batch(&mut self, now: Instant) -> Result<u64> {
        self.send_command(mid::DECREMENT_BATCH, &[], now)
    }

    pub fn subscribe_tightening_results(&mut self, now: Instant) -> Result<u64> {
        let id = self.send_command(mid::SUBSCRIBE_RESULTS, &[], now)?;
        self.state.protocol.subscriptions.tightening_results = true;
        Ok(id)
    }

    pub fn unsubscribe_tightening_results(&mut self, now: Instant) -> Result<u64> {
        let id = self.send_command(mid::UNSUBSCRIBE_RESULTS, &[], now)?;
        self.state.protocol.subscriptions.tightening_results = false;
        Ok(id)
    }

    pub fn subscribe_alarms(&mut self, now: Instant) -> Result<u64> {
        let id = self.send_command(mid::ALARM, &[], now)?;
        self.state.protocol.subscriptions.alarms = true;
        Ok(id)
    }

    pub fn unsubscribe_alarms(&mut self, now: Instant) -> Result<u64> {
        let id = self.send_command(mid::UNSUBSCRIBE_ALARM, &[], now)?;
        self.state.protocol.subscriptions.alarms = false;
        Ok(id)
    }

    pub fn acknowledge_alarm(&mut self, now: Instant) -> Result<u64> {
        self.send_command(mid::ALARM_ACK, &[], now)
    }
}
