// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canonical state tree and the projection of inbound messages onto it.

mod projector;
mod snapshot;

pub use projector::{project, ProjectionOutcome};
pub use snapshot::{
    BatchState, ConnectionState, ControllerState, JobState, ProductState, ProtocolState,
    SpindleCountSource, StateSnapshot, Subscriptions, ToolState,
};
