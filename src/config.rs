// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Client configuration.
//!
//! Validated once at construction rather than scattered through the hot
//! path, the same way the teacher keeps transport tunables in a single
//! plain struct (`TcpConfig`) separate from connection state.

use crate::error::CommandError;

/// Default Open Protocol TCP port.
pub const DEFAULT_PORT: u16 = 4545;

/// Client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Controller hostname or IP address.
    pub host: String,

    /// Controller TCP port.
    pub port: u16,

    /// Reconnect automatically with exponential backoff after an
    /// unexpected disconnect.
    pub auto_reconnect: bool,

    /// Validate decoded frame headers strictly (reject malformed MIDs).
    pub validate_frames: bool,

    /// Fixed spindle count. When set, this is sticky: MID 0101/0061 can
    /// never lower or override it (source = `config`).
    pub spindle_count: Option<u8>,

    /// Allow more than one pending command per MID.
    pub allow_duplicate_commands: bool,
}

impl ClientConfig {
    /// Create a configuration for `host` with all other fields defaulted,
    /// validating `host` is non-empty.
    pub fn new(host: impl Into<String>) -> std::result::Result<Self, CommandError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(CommandError::OutOfRange {
                what: "host",
                value: 0,
            });
        }
        Ok(Self {
            host,
            port: DEFAULT_PORT,
            auto_reconnect: true,
            validate_frames: true,
            spindle_count: None,
            allow_duplicate_commands: false,
        })
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set a fixed, sticky spindle count (1..=99).
    pub fn with_spindle_count(
        mut self,
        count: u8,
    ) -> std::result::Result<Self, CommandError> {
        if !(1..=99).contains(&count) {
            return Err(CommandError::OutOfRange {
                what: "spindle_count",
                value: count as i64,
            });
        }
        self.spindle_count = Some(count);
        Ok(self)
    }

    /// Disable automatic reconnection.
    pub fn without_auto_reconnect(mut self) -> Self {
        self.auto_reconnect = false;
        self
    }

    /// Allow more than one pending command per MID.
    pub fn with_duplicate_commands_allowed(mut self) -> Self {
        self.allow_duplicate_commands = true;
        self
    }
}
