//! `insteon`: talk to an Insteon Hub from the command line.

mod cli;
mod config;
mod error;

use std::process::ExitCode;

use clap::Parser;
use insteon_hub::{CommandStatus, HubClient, HubEvent};
use insteon_protocol::{decode_message, level_from_percent, percent_from_level, Message, DEFAULT_HUB_PORT};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::config::CliConfig;
use crate::error::{CliError, Result};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so JSON output on stdout stays clean. `RUST_LOG` wins
/// over `--verbose`.
fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let command = match cli.command {
        Commands::Decode { hex } => {
            for msg in decode_all(&hex.concat())? {
                if cli.json {
                    print_json(&msg)?;
                } else {
                    println!("{:02X} {}", msg.code(), msg.raw());
                }
            }
            return Ok(ExitCode::SUCCESS);
        }
        command => command,
    };

    let config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            CliConfig::load(path)?
        }
        None => CliConfig::default(),
    };

    let host = cli
        .host
        .clone()
        .or_else(|| config.host.clone())
        .ok_or(CliError::MissingHost)?;
    let port = cli.port.or(config.port).unwrap_or(DEFAULT_HUB_PORT);

    let (hub, events) = HubClient::connect_tcp((host.as_str(), port), config.hub.clone()).await?;
    for device in &config.devices {
        debug!(id = %device.id, kind = ?device.kind, "registering device");
        hub.register_device(device.id, device.kind).await?;
    }

    let code = match command {
        Commands::Monitor { raw } => {
            monitor(events, raw, cli.json).await?;
            ExitCode::SUCCESS
        }
        Commands::Info => {
            let im = hub.im_info().await?;
            if cli.json {
                print_json(&im)?;
            } else {
                println!(
                    "IM {} category {:02X} subcategory {:02X} firmware {:02X}",
                    im.id, im.info.category, im.info.subcategory, im.info.firmware
                );
            }
            ExitCode::SUCCESS
        }
        Commands::Links => {
            let links = hub.links().await?;
            if cli.json {
                print_json(&links)?;
            } else {
                for link in &links {
                    let role = if link.flags.is_controller { "controller" } else { "responder" };
                    println!(
                        "group {:3} {} {:10} data {:02X} {:02X} {:02X}",
                        link.group, link.id, role, link.data[0], link.data[1], link.data[2]
                    );
                }
                println!("{} link(s)", links.len());
            }
            ExitCode::SUCCESS
        }
        Commands::Ping { id } => exit_code(report(hub.ping(id).await?, cli.json)?),
        Commands::On { id, percent } => {
            let level = level_from_percent(percent)?;
            exit_code(report(hub.turn_on(id, level).await?, cli.json)?)
        }
        Commands::Off { id } => exit_code(report(hub.turn_off(id).await?, cli.json)?),
        Commands::Decode { .. } => ExitCode::SUCCESS,
        Commands::Status { id } => {
            let level = hub.status(id).await?;
            if cli.json {
                print_json(&serde_json::json!({ "id": id, "level": level }))?;
            } else {
                println!("{} level {} ({}%)", id, level, percent_from_level(level));
            }
            ExitCode::SUCCESS
        }
    };

    hub.shutdown().await;
    Ok(code)
}

/// Decode back-to-back messages, ignoring whitespace between them.
fn decode_all(text: &str) -> Result<Vec<Message>> {
    let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let mut rest = text.as_str();
    let mut messages = Vec::new();
    while !rest.is_empty() {
        let (msg, used) = decode_message(rest)?;
        messages.push(msg);
        rest = &rest[used..];
    }
    Ok(messages)
}

/// Print events until the hub closes the connection. `events` is the
/// receiver handed out by connect, so the `Connect` event is included.
async fn monitor(mut events: broadcast::Receiver<HubEvent>, raw: bool, json: bool) -> Result<()> {
    info!("monitoring hub events");

    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(missed)) => {
                warn!(missed, "event output fell behind");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let traffic = matches!(event, HubEvent::SendCommand { .. } | HubEvent::RecvCommand(_));
        if traffic && !raw {
            continue;
        }

        let timestamp = chrono::Local::now();
        if json {
            print_json(&serde_json::json!({
                "time": timestamp.to_rfc3339(),
                "event": &event,
            }))?;
        } else {
            println!("{} {}", timestamp.format("%H:%M:%S%.3f"), describe(&event));
        }

        if matches!(event, HubEvent::Close { .. }) {
            break;
        }
    }
    Ok(())
}

fn describe(event: &HubEvent) -> String {
    match event {
        HubEvent::Connect => "connected".to_string(),
        HubEvent::Close { had_error: true } => "connection closed with error".to_string(),
        HubEvent::Close { had_error: false } => "connection closed".to_string(),
        HubEvent::Error(e) => format!("error: {}", e),
        HubEvent::SendCommand { raw } => format!("> {}", raw),
        HubEvent::RecvCommand(msg) => format!("< {}", msg.raw()),
        HubEvent::Command(msg) => format!("message {}", msg.raw()),
        HubEvent::Device(device) => match device.group {
            Some(group) => format!("{} ({:?}) group {}: {:?}", device.id, device.kind, group, device.event),
            None => format!("{} ({:?}): {:?}", device.id, device.kind, device.event),
        },
    }
}

/// Print a command's outcome. Returns whether it succeeded.
fn report(status: CommandStatus, json: bool) -> Result<bool> {
    if json {
        print_json(&status)?;
    } else if status.success {
        println!("ok");
    } else if status.timed_out {
        println!("no response after {} retries", status.retries);
    } else if status.nack {
        println!("refused");
    } else {
        println!("failed");
    }
    Ok(status.success)
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
