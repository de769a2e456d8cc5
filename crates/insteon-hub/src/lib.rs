//! Insteon PLM/Hub protocol engine
//!
//! This crate drives an Insteon IM over any byte stream:
//!
//! - **Sender**: a FIFO command queue with one command in flight, write
//!   delay, response timeout, retries and NAK backoff
//! - **Router**: classifies device messages, deduplicates repeats and hands
//!   them to device capability handlers
//! - **Registry**: the devices whose messages become typed events
//!
//! [`HubState`] ties these together without doing any I/O, driven by
//! explicit `Instant`s. [`HubClient`] runs a `HubState` in a tokio task over
//! a TCP connection or any other `AsyncRead + AsyncWrite` stream.
//!
//! # Example
//!
//! ```rust,ignore
//! use insteon_hub::{HubClient, HubConfig};
//!
//! let (hub, mut events) = HubClient::connect_host("192.168.1.20", HubConfig::default()).await?;
//! let light = "1A2B3C".parse()?;
//! hub.turn_on(light, 0xFF).await?;
//! ```

mod command;
mod config;
mod connection;
pub mod devices;
mod error;
mod event;
mod hub;
mod registry;
pub mod router;
pub mod sender;
mod transport;

pub use command::*;
pub use config::*;
pub use connection::*;
pub use devices::{x10_device_id, Device, DeviceHandler, DeviceKind};
pub use error::*;
pub use event::*;
pub use hub::*;
pub use registry::*;
pub use router::{classify, Route, Router};
pub use sender::{CommandSender, TimerKind};
pub use transport::*;
