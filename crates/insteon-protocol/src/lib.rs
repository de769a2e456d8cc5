//! Insteon PLM/Hub wire protocol
//!
//! This crate provides the types and codecs for talking to an Insteon
//! PowerLinc Modem or Hub. The modem exchanges unframed byte messages that
//! begin with `0x02` followed by a type code:
//!
//! - **Commands** (host → modem): `0x60..=0x6F`, echoed back with a trailing
//!   ACK (`0x06`) or NAK (`0x15`)
//! - **Received messages** (modem → host): `0x50..=0x58`, traffic heard on
//!   the powerline/RF network and link database results
//!
//! The receive side is a [`HexBuffer`] fed with arbitrary chunks and drained
//! with [`next_message`], which consults the [`DISPATCH_TABLE`] to size and
//! decode each message.
//!
//! # Example
//!
//! ```rust,ignore
//! use insteon_protocol::{Command, DeviceId, DispatchResult, HexBuffer, next_message};
//!
//! let light: DeviceId = "1A2B3C".parse()?;
//! let bytes = Command::turn_on(light, 0xFF).encode();
//!
//! let mut buf = HexBuffer::new();
//! buf.push_bytes(&received);
//! while let DispatchResult::Processed(msg) | DispatchResult::Skipped(_) = next_message(&mut buf) {
//!     // ...
//! }
//! ```

mod buffer;
pub mod checksum;
mod commands;
mod constants;
mod dispatch;
mod error;
mod messages;
mod types;

pub use buffer::*;
pub use commands::*;
pub use constants::*;
pub use dispatch::*;
pub use error::*;
pub use messages::*;
pub use types::*;
