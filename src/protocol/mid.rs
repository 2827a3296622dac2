// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Message identifiers supported by this client.

/// Comm start (outbound).
pub const COMM_START: u16 = 1;
/// Comm start acknowledged / comm stop (bidirectional; also emitted as an
/// alias by some firmware in place of [`COMM_START_ACK_ALT`]).
pub const COMM_STOP: u16 = 2;
/// Alias some firmware emits for the comm-start-ACK instead of [`COMM_STOP`].
pub const COMM_START_ACK_ALT: u16 = 3;
/// Command error (inbound NAK).
pub const COMMAND_ERROR: u16 = 4;
/// Command accepted (inbound ACK).
pub const COMMAND_ACCEPTED: u16 = 5;
/// Parameter set reply (inbound).
pub const PARAM_SET_REPLY: u16 = 11;
/// Select parameter set (outbound).
pub const SELECT_PARAM_SET: u16 = 18;
/// Reset batch (outbound).
pub const RESET_BATCH: u16 = 20;
/// Decrement batch (outbound) / batch-decrement ACK (inbound).
pub const DECREMENT_BATCH: u16 = 21;
/// Batch reply (inbound).
pub const BATCH_REPLY: u16 = 31;
/// Select job (outbound).
pub const SELECT_JOB: u16 = 34;
/// Job reply (inbound).
pub const JOB_REPLY: u16 = 35;
/// Tool status (inbound).
pub const TOOL_STATUS: u16 = 41;
/// Enable tool (outbound).
pub const ENABLE_TOOL: u16 = 42;
/// Start tightening (outbound).
pub const START: u16 = 43;
/// Disable tool (outbound).
pub const DISABLE_TOOL: u16 = 45;
/// Download VIN (outbound).
pub const DOWNLOAD_VIN: u16 = 50;
/// VIN reply (inbound).
pub const VIN_REPLY: u16 = 51;
/// VIN required (inbound).
pub const VIN_REQUIRED: u16 = 52;
/// Subscribe tightening results (outbound).
pub const SUBSCRIBE_RESULTS: u16 = 60;
/// Last tightening result (inbound).
pub const LAST_RESULT: u16 = 61;
/// Result ACK (outbound, mandatory after every result).
pub const RESULT_ACK: u16 = 62;
/// Unsubscribe tightening results (outbound).
pub const UNSUBSCRIBE_RESULTS: u16 = 63;
/// Old (replayed) tightening result (inbound).
pub const OLD_RESULT: u16 = 65;
/// Subscribe alarms (outbound) / alarm report (inbound).
///
/// The source preserves sending MID 0070 for both subscription and the
/// controller's alarm report; see the open question recorded for this in
/// SPEC_FULL.md §9.
pub const ALARM: u16 = 70;
/// Unsubscribe alarms (outbound).
pub const UNSUBSCRIBE_ALARM: u16 = 73;
/// Alarm status (inbound).
pub const ALARM_STATUS: u16 = 76;
/// Acknowledge alarm (outbound).
pub const ALARM_ACK: u16 = 78;
/// Multi-spindle cycle complete (inbound).
pub const MULTI_SPINDLE_RESULT: u16 = 101;
/// Heartbeat (outbound, no-ACK).
pub const HEARTBEAT: u16 = 9999;
