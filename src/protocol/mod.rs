// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Revision-aware typed message layer on top of the raw frame codec.

pub mod mid;

mod codec;
mod message;

pub use codec::{decode_inbound, encode_download_vin, encode_select_job, encode_select_param_set};
pub use message::{
    AlarmInfo, BatchInfo, Inbound, JobInfo, ResultMessage, ResultRevision, ToolStatusInfo,
};
