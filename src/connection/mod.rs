// SPDX-License-Identifier: Apache-2.0 OR MIT

//! TCP connection lifecycle: the socket, framing buffer, heartbeat and
//! reconnect backoff.

pub mod byte_stream;
mod manager;

pub use byte_stream::{BoxedByteStream, ByteStream};
pub use manager::ConnectionManager;
