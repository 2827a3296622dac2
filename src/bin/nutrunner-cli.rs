// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Demo CLI for exercising an Open Protocol client against a real or
//! simulated controller. Not a protocol bridge: OPC UA/MQTT/InfluxDB
//! integrations remain out of scope for this crate.

use std::thread::sleep;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::info;

use open_protocol_client::{Client, ClientConfig};

#[derive(Parser)]
#[command(name = "nutrunner-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Connect to an Open Protocol tightening controller")]
struct Cli {
    /// Controller hostname or IP address.
    #[arg(long)]
    host: String,

    /// Controller TCP port.
    #[arg(long, default_value_t = open_protocol_client::config::DEFAULT_PORT)]
    port: u16,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Connect and print every event as it arrives until interrupted.
    Monitor,
    /// Select a job by id (0..9999).
    SelectJob { id: u32 },
    /// Download a VIN (max 25 chars).
    DownloadVin { vin: String },
    /// Select a parameter set by id (0..999).
    SelectParameterSet { id: u32 },
    /// Enable the tool.
    EnableTool,
    /// Disable the tool.
    DisableTool,
    /// Start a tightening cycle.
    Start,
    /// Reset the current batch.
    ResetBatch,
    /// Decrement the current batch.
    DecrementBatch,
    /// Acknowledge the active alarm.
    AcknowledgeAlarm,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = ClientConfig::new(cli.host.clone())
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?
        .with_port(cli.port);

    let now = Instant::now();
    let mut client = Client::new(config, now);
    client.on_event(Box::new(|event| println!("{event:?}")));

    info!("connecting to {}:{}", cli.host, cli.port);
    client.connect(Instant::now())?;

    match cli.command {
        Command::Monitor => loop {
            client.poll(Instant::now());
            sleep(Duration::from_millis(100));
        },
        other => run_command(&mut client, other),
    }
}

fn run_command(client: &mut Client, command: Command) -> Result<()> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let now = Instant::now();
    match command {
        Command::SelectJob { id } => client.select_job(id, now)?,
        Command::DownloadVin { vin } => client.download_vin(&vin, now)?,
        Command::SelectParameterSet { id } => client.select_parameter_set(id, now)?,
        Command::EnableTool => client.enable_tool(now)?,
        Command::DisableTool => client.disable_tool(now)?,
        Command::Start => client.start_tightening(now)?,
        Command::ResetBatch => client.reset_batch(now)?,
        Command::DecrementBatch => client.decrement_batch(now)?,
        Command::AcknowledgeAlarm => client.acknowledge_alarm(now)?,
        Command::Monitor => unreachable!(),
    };

    while Instant::now() < deadline {
        client.poll(Instant::now());
        sleep(Duration::from_millis(50));
    }
    if !client.is_connected() {
        bail!("disconnected before command completed");
    }
    Ok(())
}
