// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decode/encode of typed MID payloads on top of [`crate::frame::DecodedFrame`].

use crate::frame::DecodedFrame;

use super::message::{
    AlarmInfo, BatchInfo, Inbound, JobInfo, ResultMessage, ResultRevision, ToolStatusInfo,
};
use super::mid;

fn digits(bytes: &[u8]) -> u64 {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

fn signed_scaled_100(bytes: &[u8]) -> f64 {
    digits(bytes) as f64 / 100.0
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

fn flag(byte: Option<&u8>) -> bool {
    byte == Some(&b'1')
}

/// Decode a frame's payload into a typed [`Inbound`] message.
///
/// `protocol_revision` is the connection's established protocol revision
/// (from MID 0002/0003), used to select the MID 0061/0065 payload layout;
/// it is independent of the per-frame `revision` header field.
pub fn decode_inbound(frame: &DecodedFrame, protocol_revision: u16) -> Inbound {
    let p = &frame.payload;
    match frame.mid {
        mid::COMM_STOP | mid::COMM_START_ACK_ALT => Inbound::LinkEstablished {
            revision: frame.revision,
        },
        mid::COMMAND_ACCEPTED => Inbound::CommandAccepted {
            accepted_mid: digits(p.get(0..4).unwrap_or(&[])) as u16,
        },
        mid::COMMAND_ERROR => {
            if p.len() < 8 {
                return Inbound::ParseError { mid: frame.mid };
            }
            Inbound::CommandError {
                failed_mid: digits(&p[0..4]) as u16,
                error_code: digits(&p[4..8]) as u32,
                message: text(&p[8..]),
            }
        }
        mid::PARAM_SET_REPLY => Inbound::ParamSetReply {
            param_set_id: digits(p.get(0..3).unwrap_or(&[])) as u32,
        },
        mid::DECREMENT_BATCH => Inbound::BatchDecrementAck,
        mid::BATCH_REPLY => {
            if p.len() < 8 {
                return Inbound::ParseError { mid: frame.mid };
            }
            Inbound::BatchReply(BatchInfo {
                batch_id: digits(&p[0..4]) as u32,
                size: digits(&p[4..8]) as u32,
            })
        }
        mid::JOB_REPLY => {
            if p.len() < 7 {
                return Inbound::ParseError { mid: frame.mid };
            }
            Inbound::JobReply(JobInfo {
                job_id: digits(&p[0..4]) as u32,
                param_set_id: digits(&p[4..7]) as u32,
            })
        }
        mid::TOOL_STATUS => {
            if p.len() < 4 {
                return Inbound::ParseError { mid: frame.mid };
            }
            Inbound::ToolStatus(ToolStatusInfo {
                controller_ready: flag(p.first()),
                tool_enabled: flag(p.get(1)),
                tool_running: flag(p.get(2)),
                alarm_active: flag(p.get(3)),
            })
        }
        mid::VIN_REPLY => Inbound::VinReply {
            vin: text(p.get(0..25).unwrap_or(p)),
        },
        mid::VIN_REQUIRED => Inbound::VinRequired {
            required: flag(p.first()),
        },
        mid::LAST_RESULT => match decode_result(p, frame.spindle, protocol_revision) {
            Some(r) => Inbound::Result(r),
            None => Inbound::ParseError { mid: frame.mid },
        },
        mid::OLD_RESULT => match decode_result(p, frame.spindle, protocol_revision) {
            Some(r) => Inbound::OldResult(r),
            None => Inbound::ParseError { mid: frame.mid },
        },
        mid::ALARM => {
            if p.len() < 4 {
                return Inbound::ParseError { mid: frame.mid };
            }
            Inbound::Alarm(AlarmInfo {
                code: digits(&p[0..4]) as u32,
                message: text(&p[4..]),
            })
        }
        mid::ALARM_STATUS => Inbound::AlarmStatus {
            active: flag(p.first()),
        },
        mid::MULTI_SPINDLE_RESULT => Inbound::MultiSpindleCount {
            spindle_count: digits(p.get(0..2).unwrap_or(&[])) as u32,
        },
        other => Inbound::ParseError { mid: other },
    }
}

fn decode_result(p: &[u8], header_spindle: u8, protocol_revision: u16) -> Option<ResultMessage> {
    match ResultRevision::from_protocol_revision(protocol_revision) {
        ResultRevision::Rev1 => decode_result_rev1(p, header_spindle),
        ResultRevision::Rev2or3 => decode_result_rev2_3(p),
        ResultRevision::Rev4 => decode_result_rev4(p),
    }
}

fn decode_result_rev1(p: &[u8], header_spindle: u8) -> Option<ResultMessage> {
    if p.len() < 24 {
        return None;
    }
    let torque_status = flag(p.get(22));
    let angle_status = flag(p.get(23));
    Some(ResultMessage {
        spindle: header_spindle,
        tightening_id: text(&p[0..10]),
        torque: signed_scaled_100(&p[10..16]),
        angle: digits(&p[16..22]) as f64,
        torque_status,
        angle_status,
        ok: torque_status && angle_status,
        vin: None,
        job_id: None,
        param_set_id: None,
        batch_size: None,
        batch_counter: None,
        batch_status: None,
        timestamp: None,
    })
}

fn decode_result_rev2_3(p: &[u8]) -> Option<ResultMessage> {
    if p.len() < 95 {
        return None;
    }
    let torque_status = flag(p.get(42));
    let angle_status = flag(p.get(43));
    Some(ResultMessage {
        spindle: digits(&p[10..12]) as u8,
        tightening_id: text(&p[0..10]),
        torque: signed_scaled_100(&p[12..18]),
        angle: digits(&p[18..24]) as f64,
        torque_status,
        angle_status,
        ok: torque_status && angle_status,
        vin: Some(text(&p[63..88])),
        job_id: Some(digits(&p[88..92]) as u32),
        param_set_id: Some(digits(&p[92..95]) as u32),
        batch_size: None,
        batch_counter: None,
        batch_status: Some(flag(p.get(49))),
        timestamp: Some(text(&p[44..63])),
    })
}

fn decode_result_rev4(p: &[u8]) -> Option<ResultMessage> {
    if p.len() < 167 {
        return None;
    }
    let torque_status = flag(p.get(72));
    let angle_status = flag(p.get(73));
    let overall_ok = flag(p.get(71));
    Some(ResultMessage {
        spindle: 1,
        tightening_id: text(&p[157..167]),
        torque: signed_scaled_100(&p[92..98]),
        angle: digits(&p[113..118]) as f64,
        torque_status,
        angle_status,
        ok: overall_ok,
        vin: Some(text(&p[31..56])),
        job_id: Some(digits(&p[56..60]) as u32),
        param_set_id: Some(digits(&p[60..63]) as u32),
        batch_size: Some(digits(&p[63..67]) as u32),
        batch_counter: Some(digits(&p[67..71]) as u32),
        batch_status: Some(flag(p.get(156))),
        timestamp: Some(text(&p[118..137])),
    })
}

fn fmt_digits(n: u32, width: usize) -> String {
    format!("{:0width$}", n, width = width)
}

/// Build the payload for `selectJob(id)`.
pub fn encode_select_job(id: u32) -> Vec<u8> {
    fmt_digits(id, 4).into_bytes()
}

/// Build the payload for `selectParameterSet(id)`.
pub fn encode_select_param_set(id: u32) -> Vec<u8> {
    fmt_digits(id, 3).into_bytes()
}

/// Build the payload for `downloadVIN(vin)`, space-padded to 25 chars.
pub fn encode_download_vin(vin: &str) -> Vec<u8> {
    let mut s = vin.to_string();
    while s.len() < 25 {
        s.push(' ');
    }
    s.into_bytes()
}
