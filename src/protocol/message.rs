// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed inbound/outbound message payloads, decoded from and encoded to
//! the raw bytes handled by [`crate::frame`].

/// Protocol revision declared by the controller on MID 0002/0003.
///
/// A small closed enum driving a `match` in the decode table, the same
/// shape as the teacher's `TcpRole`/`RtpsRange` dispatch enums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultRevision {
    Rev1,
    Rev2or3,
    Rev4,
}

impl ResultRevision {
    pub fn from_protocol_revision(revision: u16) -> Self {
        match revision {
            1 => ResultRevision::Rev1,
            4..=6 => ResultRevision::Rev4,
            _ => ResultRevision::Rev2or3,
        }
    }
}

/// A normalized tightening result, independent of wire revision.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMessage {
    pub spindle: u8,
    pub tightening_id: String,
    pub torque: f64,
    pub angle: f64,
    pub torque_status: bool,
    pub angle_status: bool,
    pub ok: bool,
    pub vin: Option<String>,
    pub job_id: Option<u32>,
    pub param_set_id: Option<u32>,
    pub batch_size: Option<u32>,
    pub batch_counter: Option<u32>,
    pub batch_status: Option<bool>,
    pub timestamp: Option<String>,
}

/// A single alarm record as reported by MID 0070.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmInfo {
    pub code: u32,
    pub message: String,
}

/// MID 0031 batch reply fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchInfo {
    pub batch_id: u32,
    pub size: u32,
}

/// MID 0035 job reply fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobInfo {
    pub job_id: u32,
    pub param_set_id: u32,
}

/// MID 0041 tool status fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolStatusInfo {
    pub controller_ready: bool,
    pub tool_enabled: bool,
    pub tool_running: bool,
    pub alarm_active: bool,
}

/// A decoded inbound message, ready for routing to the command tracker
/// and/or the state projector.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    LinkEstablished { revision: u16 },
    CommandAccepted { accepted_mid: u16 },
    CommandError { failed_mid: u16, error_code: u32, message: String },
    ParamSetReply { param_set_id: u32 },
    BatchDecrementAck,
    BatchReply(BatchInfo),
    JobReply(JobInfo),
    ToolStatus(ToolStatusInfo),
    VinReply { vin: String },
    VinRequired { required: bool },
    Result(ResultMessage),
    OldResult(ResultMessage),
    Alarm(AlarmInfo),
    AlarmStatus { active: bool },
    MultiSpindleCount { spindle_count: u32 },
    /// A payload could not be parsed; the frame is otherwise valid.
    ParseError { mid: u16 },
}
