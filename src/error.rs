// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for the Open Protocol client.
//!
//! Three synchronous error kinds are distinguished ([`Error::Interlock`],
//! [`Error::Protocol`], [`Error::Command`]) plus transport I/O failures.
//! Conditions that are only known after the fact (timeouts, watchdog fires,
//! disconnect aborts) are reported as [`crate::events::Event`]s instead,
//! not as `Result` errors.

use std::fmt;

use crate::cycle::InterlockViolation;

/// Errors returned synchronously by client operations.
#[derive(Debug)]
pub enum Error {
    /// An interlock precondition failed before any bytes were sent.
    Interlock(InterlockViolation),
    /// The controller rejected a command (MID 0004).
    Protocol {
        failed_mid: u16,
        error_code: u32,
        message: String,
    },
    /// The client refused to send a command (one-per-MID violation, bad argument).
    Command(CommandError),
    /// The underlying byte stream failed.
    Io(std::io::Error),
}

/// Client-detected command errors, raised before any bytes are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// A command for this MID is already pending an ACK/NAK.
    DuplicatePending(u16),
    /// A VIN longer than 25 characters was supplied.
    VinTooLong(usize),
    /// An argument was outside its valid range.
    OutOfRange { what: &'static str, value: i64 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Interlock(v) => write!(f, "interlock violation: {v}"),
            Error::Protocol {
                failed_mid,
                error_code,
                message,
            } => write!(
                f,
                "controller rejected command mid {failed_mid:04}: error {error_code} ({message})"
            ),
            Error::Command(c) => write!(f, "command error: {c}"),
            Error::Io(e) => write!(f, "transport error: {e}"),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::DuplicatePending(mid) => {
                write!(f, "command for mid {mid:04} already pending")
            }
            CommandError::VinTooLong(len) => write!(f, "VIN too long: {len} chars (max 25)"),
            CommandError::OutOfRange { what, value } => {
                write!(f, "{what} out of range: {value}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for CommandError {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Error::Command(e)
    }
}

impl From<InterlockViolation> for Error {
    fn from(v: InterlockViolation) -> Self {
        Error::Interlock(v)
    }
}

/// Convenient alias for client operation results.
pub type Result<T> = std::result::Result<T, Error>;
