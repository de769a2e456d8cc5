//! Connection state machine.
//!
//! [`HubState`] owns everything one connection to the IM needs: the receive
//! buffer, the command sender, the router and the device registry. It does
//! no I/O of its own. The owner feeds it received data and timer ticks, and
//! drains the events it produces:
//!
//! ```rust,ignore
//! let mut hub = HubState::new(HubConfig::default(), transport);
//! hub.enqueue(OutgoingCommand::new(Command::GetImInfo), Instant::now());
//! loop {
//!     // wait for data or hub.poll_timeout()
//!     hub.push_bytes(&data, Instant::now());
//!     hub.handle_timeout(Instant::now());
//!     while let Some(event) = hub.poll_event() { /* ... */ }
//! }
//! ```

use std::collections::VecDeque;
use std::time::Instant;

use insteon_protocol::{next_message, DeviceId, DispatchResult, HexBuffer, Message, MessageType, NAK_HEX};
use tracing::trace;

use crate::command::{OutgoingCommand, PendingMatcher};
use crate::config::HubConfig;
use crate::devices::DeviceKind;
use crate::error::TransportError;
use crate::event::HubEvent;
use crate::registry::DeviceRegistry;
use crate::router::Router;
use crate::sender::CommandSender;
use crate::transport::Transport;

/// Sans-I/O state of one connection to the IM.
pub struct HubState<T: Transport> {
    config: HubConfig,
    transport: T,
    buffer: HexBuffer,
    sender: CommandSender,
    router: Router,
    registry: DeviceRegistry,
    events: VecDeque<HubEvent>,
}

impl<T: Transport> HubState<T> {
    /// Create the state for a fresh connection.
    pub fn new(config: HubConfig, transport: T) -> Self {
        HubState {
            sender: CommandSender::new(config.retry_policy()),
            router: Router::new(&config),
            config,
            transport,
            buffer: HexBuffer::new(),
            registry: DeviceRegistry::new(),
            events: VecDeque::new(),
        }
    }

    /// The configuration.
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The device registry.
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Mutable access to the device registry.
    pub fn registry_mut(&mut self) -> &mut DeviceRegistry {
        &mut self.registry
    }

    /// The command sender.
    pub fn sender(&self) -> &CommandSender {
        &self.sender
    }

    /// Register a device so its messages become device events.
    pub fn register_device(&mut self, id: DeviceId, kind: DeviceKind) {
        self.registry.get_or_create(id, kind);
    }

    /// Hex characters waiting in the receive buffer.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Queue a command. It is written once it reaches the front of the
    /// queue and the write delay has passed.
    pub fn enqueue(&mut self, command: OutgoingCommand, now: Instant) {
        self.sender.enqueue(command, now);
        self.handle_timeout(now);
    }

    /// Reject the in-flight command with `Cancelled`.
    pub fn cancel_in_progress(&mut self, now: Instant) -> bool {
        let cancelled = self.sender.cancel_in_progress(now);
        self.handle_timeout(now);
        cancelled
    }

    /// Reject queued commands selected by `matcher`; returns how many.
    pub fn cancel_pending(&mut self, matcher: &PendingMatcher) -> usize {
        self.sender.cancel_pending(matcher)
    }

    /// A write reported asynchronously has failed.
    pub fn transport_failed(&mut self, error: TransportError, now: Instant) {
        self.events.push_back(HubEvent::Error(error.to_string()));
        self.sender.transport_failed(error, now);
        self.handle_timeout(now);
    }

    /// Reject everything outstanding with `Closed`.
    pub fn close(&mut self) {
        self.sender.close();
    }

    // ========================================================================
    // Timers
    // ========================================================================

    /// When [`handle_timeout`](Self::handle_timeout) next needs to run.
    pub fn poll_timeout(&self) -> Option<Instant> {
        self.sender.poll_timeout()
    }

    /// Fire every timer due at `now`.
    pub fn handle_timeout(&mut self, now: Instant) {
        while let Some(deadline) = self.sender.poll_timeout() {
            if deadline > now {
                break;
            }
            self.sender
                .handle_timeout(now, &mut self.transport, &mut self.events);
        }
    }

    // ========================================================================
    // Receive
    // ========================================================================

    /// Feed raw bytes from the transport.
    pub fn push_bytes(&mut self, data: &[u8], now: Instant) {
        self.buffer.push_bytes(data);
        self.dispatch(now);
    }

    /// Feed hex text from the transport.
    pub fn push_hex(&mut self, text: &str, now: Instant) {
        self.buffer.push_hex(text);
        self.dispatch(now);
    }

    /// Parse and handle everything complete in the buffer.
    fn dispatch(&mut self, now: Instant) {
        loop {
            // A bare NAK means the IM was busy
            if self.buffer.starts_with(NAK_HEX) && self.sender.is_awaiting_response() {
                self.buffer.skip(2);
                self.sender.on_nak(now);
                continue;
            }

            match next_message(&mut self.buffer) {
                DispatchResult::Processed(msg) => self.process(msg, now),
                DispatchResult::Skipped(n) => trace!(skipped = n, "resynchronising"),
                DispatchResult::InsufficientData => break,
            }
        }
        self.handle_timeout(now);
    }

    fn process(&mut self, msg: Message, now: Instant) {
        self.events.push_back(HubEvent::RecvCommand(msg.clone()));
        let consumed = self.sender.offer(&msg, now);

        match &msg {
            Message::Standard(m) => {
                let is_ack = m.message_type() == MessageType::DirectAck;
                if consumed && !(is_ack && self.router.emit_self_acks()) {
                    return;
                }
                let self_ack = consumed
                    || self
                        .sender
                        .recently_sent(m.from, m.cmd1, now, self.router.window());
                if let Some(event) = self.router.route_standard(m, &mut self.registry, self_ack, now) {
                    self.events.push_back(event);
                }
            }
            Message::Extended(_) if !consumed => {
                self.events.push_back(HubEvent::Command(msg.clone()));
            }
            Message::X10Received { x10, flag, .. } => {
                if let Some(event) = self.router.route_x10(*x10, *flag, &mut self.registry) {
                    self.events.push_back(event);
                }
            }
            _ => {}
        }
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Take the oldest pending event.
    pub fn poll_event(&mut self) -> Option<HubEvent> {
        self.events.pop_front()
    }

    /// Take every pending event.
    pub fn drain_events(&mut self) -> Vec<HubEvent> {
        self.events.drain(..).collect()
    }
}
