// SPDX-License-Identifier: Apache-2.0 OR MIT

//! TCP lifecycle: connect, heartbeat, frame draining, reconnect with
//! exponential backoff. Time is injected via an explicit `Instant` on every
//! tick-driving method, so tests can simulate elapsed time deterministically
//! instead of sleeping.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::frame::{DecodedFrame, FrameCodec, FrameError};

use super::byte_stream::BoxedByteStream;

const HEARTBEAT_IDLE: Duration = Duration::from_secs(7);
const RECONNECT_INITIAL: Duration = Duration::from_secs(1);
const RECONNECT_CAP: Duration = Duration::from_secs(30);

pub struct ConnectionManager {
    host: String,
    port: u16,
    stream: Option<BoxedByteStream>,
    buffer: Vec<u8>,
    codec: FrameCodec,
    last_activity: Instant,
    reconnect_delay: Duration,
    reconnect_attempts: u32,
    reconnect_at: Option<Instant>,
}

impl ConnectionManager {
    pub fn new(host: impl Into<String>, port: u16, validate_frames: bool, now: Instant) -> Self {
        Self {
            host: host.into(),
            port,
            stream: None,
            buffer: Vec::new(),
            codec: FrameCodec::with_strict(validate_frames),
            last_activity: now,
            reconnect_delay: RECONNECT_INITIAL,
            reconnect_attempts: 0,
            reconnect_at: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Open a real TCP connection to the configured host/port.
    pub fn connect(&mut self, now: Instant) -> io::Result<()> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))?;
        stream.set_nonblocking(true)?;
        self.adopt_stream(Box::new(stream), now);
        Ok(())
    }

    /// Inject an already-connected stream (tests use this with a mock).
    pub fn adopt_stream(&mut self, stream: BoxedByteStream, now: Instant) {
        self.stream = Some(stream);
        self.buffer.clear();
        self.last_activity = now;
        self.reconnect_delay = RECONNECT_INITIAL;
        self.reconnect_attempts = 0;
        self.reconnect_at = None;
    }

    /// Write one encoded frame to the socket.
    pub fn send(&mut self, mid: u16, payload: &[u8], expect_ack: bool, now: Instant) -> io::Result<()> {
        let frame = FrameCodec::encode(mid, payload, expect_ack);
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "not connected"))?;
        stream.write_all(&frame)?;
        self.last_activity = now;
        Ok(())
    }

    /// Drain all currently-available bytes and decode as many frames as
    /// possible. Returns `Err` (connection-aborted) when the peer has
    /// closed the socket. Frame-level decode errors are recovered locally
    /// (the codec resyncs by one byte) but are still returned alongside the
    /// successfully decoded frames so the caller can surface `frameError`.
    pub fn poll_frames(&mut self, now: Instant) -> io::Result<(Vec<DecodedFrame>, Vec<FrameError>)> {
        let mut frames = Vec::new();
        let mut errors = Vec::new();
        let Some(stream) = self.stream.as_mut() else {
            return Ok((frames, errors));
        };

        let mut chunk = [0u8; 4096];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => {
                    return Err(io::Error::new(io::ErrorKind::ConnectionAborted, "peer closed"));
                }
                Ok(n) => {
                    self.buffer.extend_from_slice(&chunk[..n]);
                    self.last_activity = now;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }

        loop {
            match self.codec.decode(&mut self.buffer) {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => break,
                Err(e) => {
                    warn!("frame decode error, resyncing: {e}");
                    errors.push(e);
                    continue;
                }
            }
        }
        Ok((frames, errors))
    }

    pub fn heartbeat_due(&self, now: Instant) -> bool {
        self.is_connected() && now.saturating_duration_since(self.last_activity) >= HEARTBEAT_IDLE
    }

    pub fn send_heartbeat(&mut self, now: Instant) -> io::Result<()> {
        debug!("sending heartbeat");
        self.send(crate::protocol::mid::HEARTBEAT, &[], false, now)
    }

    /// Drop the socket locally after a read error or explicit disconnect.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.buffer.clear();
    }

    /// Schedule the next reconnect attempt; returns `(attempt, delay)` for
    /// the `reconnecting` event.
    pub fn schedule_reconnect(&mut self, now: Instant) -> (u32, Duration) {
        self.reconnect_attempts += 1;
        let delay = self.reconnect_delay;
        self.reconnect_at = Some(now + delay);
        self.reconnect_delay = (self.reconnect_delay * 2).min(RECONNECT_CAP);
        (self.reconnect_attempts, delay)
    }

    pub fn reconnect_due(&self, now: Instant) -> bool {
        self.reconnect_at.is_some_and(|t| now >= t)
    }

    pub fn cancel_reconnect(&mut self) {
        self.reconnect_at = None;
    }
}
