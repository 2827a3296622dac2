// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tightening cycle aggregation and the startTightening interlock gate.

mod aggregator;
mod interlock;

pub use aggregator::CycleAggregator;
pub use interlock::{check_basic, check_start_tightening, InterlockViolation};
