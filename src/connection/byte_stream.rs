// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `ByteStream` abstraction over the TCP socket, grounded on the teacher's
//! `transport/tcp/byte_stream.rs`. TLS-specific members and the raw-fd
//! accessor used for `mio` registration are dropped: this client has no
//! TLS requirement and drives its socket via non-blocking reads from an
//! explicit poll loop rather than epoll registration.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

/// Abstraction over a connected byte stream, so the connection manager can
/// be driven by an in-memory mock in tests instead of a real socket.
pub trait ByteStream: Read + Write {
    fn shutdown(&mut self, how: Shutdown) -> io::Result<()>;
    fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()>;
    fn set_read_timeout(&self, dur: Option<Duration>) -> io::Result<()>;
}

impl ByteStream for TcpStream {
    fn shutdown(&mut self, how: Shutdown) -> io::Result<()> {
        TcpStream::shutdown(self, how)
    }

    fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        TcpStream::set_nonblocking(self, nonblocking)
    }

    fn set_read_timeout(&self, dur: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, dur)
    }
}

/// Boxed byte stream, the shape the connection manager stores.
pub type BoxedByteStream = Box<dyn ByteStream>;
