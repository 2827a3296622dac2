// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # open-protocol-client
//!
//! A client for Open Protocol tightening controllers (electronic
//! nutrunners) used in automotive and aerospace assembly lines: a
//! text-framed request/response protocol carried over a persistent TCP
//! connection.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use open_protocol_client::{Client, ClientConfig};
//! use std::time::Instant;
//!
//! fn main() -> open_protocol_client::Result<()> {
//!     let config = ClientConfig::new("10.0.0.5")?;
//!     let now = Instant::now();
//!     let mut client = Client::new(config, now);
//!     client.connect(now)?;
//!     loop {
//!         let now = Instant::now();
//!         for event in client.poll(now) {
//!             println!("{event:?}");
//!         }
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +-------------------------------------------------------------+
//! |                           Client                            |
//! |   operator calls out, domain events in                      |
//! +-------------------------------------------------------------+
//! |  F: Cycle Aggregator + Interlock Gate                       |
//! |  E: State + Event Projector                                 |
//! |  D: Connection Manager (TCP, heartbeat, reconnect backoff)  |
//! |  C: Command Tracker (sequencing, timeouts, ACK/NAK)         |
//! |  B: MID Codec (revision-aware typed payloads)                |
//! |  A: Frame Codec (length-prefixed ASCII wire framing)         |
//! +-------------------------------------------------------------+
//! ```
//!
//! `Client::poll` is the single entry point driving the whole stack: it is
//! called repeatedly from one thread with the current `Instant`, drains
//! available socket bytes, projects decoded frames onto state, and
//! services due timers (heartbeat, command deadlines, the cycle
//! watchdog, reconnect backoff). There is no background thread and no
//! async runtime: one logical executor, explicit time.
//!
//! ## Modules
//!
//! - [`frame`] — length-prefixed ASCII wire framing
//! - [`protocol`] — revision-aware typed MID payloads
//! - [`command`] — command sequencing and ACK/NAK resolution
//! - [`connection`] — TCP lifecycle, heartbeat, reconnect backoff
//! - [`state`] — the canonical state snapshot and its projector
//! - [`cycle`] — tightening cycle aggregation and the interlock gate
//! - [`events`] — the closed domain event set
//! - [`client`] — [`Client`], the public entry point

pub mod client;
pub mod command;
pub mod config;
pub mod connection;
pub mod cycle;
pub mod error;
pub mod events;
pub mod frame;
pub mod protocol;
pub mod state;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use events::Event;
