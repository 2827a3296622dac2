// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command sequencing: monotonic command IDs, one-per-MID dedup, per-command
//! timeout, FIFO-per-MID ACK/NAK resolution.
//!
//! The pending-command table is an insertion-ordered `Vec`, matching the
//! teacher's preference for small linear scans over hash lookups in
//! low-cardinality hot paths (`connection_manager.rs`'s `PendingConnection`
//! bookkeeping) rather than a `HashMap`: at most a handful of commands are
//! ever outstanding, and FIFO-per-MID resolution order must be preserved
//! exactly.

use std::time::{Duration, Instant};

use crate::error::CommandError;
use crate::events::Event;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct PendingCommand {
    command_id: u64,
    mid: u16,
    deadline: Instant,
}

/// The outcome of successfully resolving a pending command, for callers
/// that need to react to which specific command ACKed/NAKed (e.g. the
/// batch-reset confirmation protocol).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub mid: u16,
    pub command_id: u64,
}

#[derive(Debug, Default)]
pub struct CommandTracker {
    next_id: u64,
    pending: Vec<PendingCommand>,
    allow_duplicates: bool,
}

impl CommandTracker {
    pub fn new(allow_duplicates: bool) -> Self {
        Self {
            next_id: 1,
            pending: Vec::new(),
            allow_duplicates,
        }
    }

    /// Register a command about to be sent with `expect_ack=true`.
    /// Fails fast (no bytes written by the caller) if a command for this
    /// MID is already pending and duplicates are not allowed.
    pub fn track(&mut self, mid: u16, now: Instant) -> Result<u64, CommandError> {
        if !self.allow_duplicates && self.pending.iter().any(|p| p.mid == mid) {
            return Err(CommandError::DuplicatePending(mid));
        }
        let command_id = self.next_id;
        self.next_id += 1;
        self.pending.push(PendingCommand {
            command_id,
            mid,
            deadline: now + COMMAND_TIMEOUT,
        });
        Ok(command_id)
    }

    /// Resolve the first pending entry for `accepted_mid` as a success
    /// (MID 0005).
    pub fn resolve_accepted(&mut self, accepted_mid: u16) -> Option<Resolved> {
        let idx = self.pending.iter().position(|p| p.mid == accepted_mid)?;
        let p = self.pending.remove(idx);
        Some(Resolved {
            mid: p.mid,
            command_id: p.command_id,
        })
    }

    /// Resolve the first pending entry for `failed_mid` as a failure
    /// (MID 0004).
    pub fn resolve_failed(&mut self, failed_mid: u16) -> Option<Resolved> {
        let idx = self.pending.iter().position(|p| p.mid == failed_mid)?;
        let p = self.pending.remove(idx);
        Some(Resolved {
            mid: p.mid,
            command_id: p.command_id,
        })
    }

    /// Expire any commands whose deadline has passed, emitting
    /// `commandTimeout` for each.
    pub fn poll_timeouts(&mut self, now: Instant) -> Vec<Event> {
        let mut events = Vec::new();
        self.pending.retain(|p| {
            if now >= p.deadline {
                events.push(Event::CommandTimeout {
                    mid: p.mid,
                    command_id: p.command_id,
                });
                false
            } else {
                true
            }
        });
        events
    }

    /// Abort every pending command on disconnect, emitting `commandAborted`
    /// for each and clearing the table.
    pub fn abort_all(&mut self) -> Vec<Event> {
        self.pending
            .drain(..)
            .map(|p| Event::CommandAborted {
                mid: p.mid,
                command_id: p.command_id,
            })
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
