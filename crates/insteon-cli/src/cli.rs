//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use insteon_protocol::DeviceId;

#[derive(Debug, Parser)]
#[command(name = "insteon", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Hub host name or address
    #[arg(short = 'H', long, global = true)]
    pub host: Option<String>,

    /// Hub TCP port [default: 9761]
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results and events as JSON lines
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print hub events until the connection closes
    Monitor {
        /// Also print every message written and received
        #[arg(long)]
        raw: bool,
    },
    /// Show the IM's address and firmware
    Info,
    /// List the IM's ALL-Link database
    Links,
    /// Ping a device
    Ping {
        /// Device id (six hex digits)
        id: DeviceId,
    },
    /// Turn a device on
    On {
        /// Device id (six hex digits)
        id: DeviceId,
        /// Brightness in percent
        #[arg(short = 'l', long, default_value_t = 100)]
        percent: u8,
    },
    /// Turn a device off
    Off {
        /// Device id (six hex digits)
        id: DeviceId,
    },
    /// Read a device's current level
    Status {
        /// Device id (six hex digits)
        id: DeviceId,
    },
    /// Decode captured IM messages without connecting
    Decode {
        /// Hex text, split across arguments as convenient
        #[arg(required = true)]
        hex: Vec<String>,
    },
}
