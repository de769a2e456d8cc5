//! Event router.
//!
//! Turns standard messages that did not settle the in-flight command into
//! device events. Every message is classified by its flags subtype, checked
//! against the sending device's dedup cache and handed to the matching
//! capability method.

use std::time::{Duration, Instant};

use insteon_protocol::{
    Message, MessageType, StandardMessage, CMD_CLEANUP_SUCCESS, X10_FLAG_COMMAND,
};
use tracing::trace;

use crate::config::HubConfig;
use crate::devices::x10_device_id;
use crate::event::{DeviceEvent, DeviceEventKind, HubEvent};
use crate::registry::DeviceRegistry;

/// Which capability a standard message is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Direct command to the IM.
    Direct {
        /// Command 1.
        cmd1: u8,
        /// Command 2.
        cmd2: u8,
    },
    /// ALL-Link broadcast, cleanup or cleanup ACK.
    Broadcast {
        /// ALL-Link group.
        group: u8,
        /// Command 1.
        cmd1: u8,
        /// Command 2.
        cmd2: u8,
    },
    /// Direct ACK.
    Ack {
        /// Command 1.
        cmd1: u8,
        /// Command 2.
        cmd2: u8,
    },
    /// Nothing to deliver (NAKs, plain broadcasts).
    Ignored,
}

/// Classify a standard message by its subtype.
pub fn classify(msg: &StandardMessage) -> Route {
    match msg.message_type() {
        MessageType::Direct => Route::Direct {
            cmd1: msg.cmd1,
            cmd2: msg.cmd2,
        },
        // Success report: the destination field packs cmd1, cmd2, group
        MessageType::AllLinkBroadcast if msg.cmd1 == CMD_CLEANUP_SUCCESS => Route::Broadcast {
            group: msg.to.0[2],
            cmd1: msg.to.0[0],
            cmd2: msg.to.0[1],
        },
        MessageType::AllLinkBroadcast => Route::Broadcast {
            group: msg.group(),
            cmd1: msg.cmd1,
            cmd2: msg.cmd2,
        },
        MessageType::Cleanup | MessageType::CleanupAck => Route::Broadcast {
            group: msg.cmd2,
            cmd1: msg.cmd1,
            cmd2: 0x00,
        },
        MessageType::DirectAck => Route::Ack {
            cmd1: msg.cmd1,
            cmd2: msg.cmd2,
        },
        _ => Route::Ignored,
    }
}

/// Routes unclaimed messages to registered devices.
#[derive(Debug)]
pub struct Router {
    window: Duration,
    emit_duplicates: bool,
    emit_self_acks: bool,
    /// Last X10 address seen: (house, unit).
    x10_address: Option<(u8, u8)>,
}

impl Router {
    /// Create a router with the dedup settings from `config`.
    pub fn new(config: &HubConfig) -> Self {
        Router {
            window: config.dedup_window(),
            emit_duplicates: config.emit_duplicates,
            emit_self_acks: config.emit_self_acks,
            x10_address: None,
        }
    }

    /// Whether ACKs for our own commands are delivered.
    pub fn emit_self_acks(&self) -> bool {
        self.emit_self_acks
    }

    /// The dedup window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Route a standard message. `self_ack` tells whether an ACK answers a
    /// command this host sent to the device.
    pub fn route_standard(
        &mut self,
        msg: &StandardMessage,
        registry: &mut DeviceRegistry,
        self_ack: bool,
        now: Instant,
    ) -> Option<HubEvent> {
        let device = match registry.get_mut(&msg.from) {
            Some(device) => device,
            None => {
                trace!(from = %msg.from, "message from unregistered device");
                return Some(HubEvent::Command(Message::Standard(msg.clone())));
            }
        };

        let (group, event) = match classify(msg) {
            Route::Direct { cmd1, cmd2 } => {
                if device.is_duplicate(cmd1, cmd2, now, self.window) && !self.emit_duplicates {
                    trace!(from = %msg.from, cmd1, cmd2, "duplicate direct suppressed");
                    return None;
                }
                (None, device.handler().handle_direct(cmd1, cmd2))
            }
            Route::Broadcast { group, cmd1, cmd2 } => {
                if device.is_duplicate(cmd1, group, now, self.window) && !self.emit_duplicates {
                    trace!(from = %msg.from, cmd1, group, "duplicate broadcast suppressed");
                    return None;
                }
                (Some(group), device.handler().handle_all_link_broadcast(group, cmd1, cmd2))
            }
            Route::Ack { cmd1, cmd2 } => {
                if !device.handler().emit_on_ack() || (self_ack && !self.emit_self_acks) {
                    return None;
                }
                (None, device.handler().handle_ack(cmd1, cmd2))
            }
            Route::Ignored => {
                trace!(from = %msg.from, raw = %msg.raw, "message not routed");
                return None;
            }
        };

        match event {
            Some(event) => Some(HubEvent::Device(DeviceEvent {
                id: device.id(),
                kind: device.kind(),
                group,
                event,
            })),
            None => Some(HubEvent::Command(Message::Standard(msg.clone()))),
        }
    }

    /// Route an X10 received message.
    ///
    /// Addresses are remembered; a function for the same house code is
    /// delivered to the last addressed unit.
    pub fn route_x10(&mut self, x10: u8, flag: u8, registry: &mut DeviceRegistry) -> Option<HubEvent> {
        let house = x10 >> 4;
        let code = x10 & 0x0F;

        if flag != X10_FLAG_COMMAND {
            self.x10_address = Some((house, code));
            return None;
        }

        let (addr_house, unit) = self.x10_address?;
        if addr_house != house {
            trace!(house, "X10 function for a house with no address");
            return None;
        }

        let device = registry.get_mut(&x10_device_id(house, unit))?;
        let event: DeviceEventKind = device.handler().handle_direct(code, 0)?;
        Some(HubEvent::Device(DeviceEvent {
            id: device.id(),
            kind: device.kind(),
            group: None,
            event,
        }))
    }
}
