//! Outgoing commands and their settled status.

use std::fmt;
use std::time::Duration;

use insteon_protocol::{
    Command, DeviceId, ExtendedMessage, Message, ProtocolResult, StandardMessage,
};
use serde::Serialize;
use tokio::sync::oneshot;

use crate::error::{CommandError, CommandResult};

// ============================================================================
// Options
// ============================================================================

/// Which IM message a command is, for logging and settle rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommandKind {
    /// Get IM info (0260).
    ImInfo,
    /// Standard direct message (0262).
    Direct,
    /// Extended direct message (0262).
    Extended,
    /// ALL-Link group command (0261).
    AllLink,
    /// X10 (0263).
    X10,
    /// Start linking (0264).
    StartLinking,
    /// Cancel linking (0265).
    CancelLinking,
    /// Get first link record (0269).
    GetFirstLink,
    /// Get next link record (026A).
    GetNextLink,
    /// Manage link record (026F).
    ManageLink,
}

impl From<&Command> for CommandKind {
    fn from(command: &Command) -> Self {
        match command {
            Command::GetImInfo => CommandKind::ImInfo,
            Command::Direct { .. } => CommandKind::Direct,
            Command::Extended { .. } => CommandKind::Extended,
            Command::AllLink { .. } => CommandKind::AllLink,
            Command::X10 { .. } => CommandKind::X10,
            Command::StartLinking { .. } => CommandKind::StartLinking,
            Command::CancelLinking => CommandKind::CancelLinking,
            Command::GetFirstLink => CommandKind::GetFirstLink,
            Command::GetNextLink => CommandKind::GetNextLink,
            Command::ManageLinkRecord { .. } => CommandKind::ManageLink,
        }
    }
}

/// Behaviour flags deciding when a command is settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandOptions {
    /// Settle as soon as the IM echoes an ACK.
    pub exit_on_ack: bool,
    /// Expect a standard ACK from the device followed by an extended response.
    pub wait_for_extended: bool,
    /// Number of extended responses to collect.
    pub response_count: Option<usize>,
    /// Settle on ALL-Linking completed (0253).
    pub wait_for_linking: bool,
    /// Settle on a direct (not ACK) standard message from the target.
    pub is_standard_response: bool,
    /// An echo NAK means "nothing more", not "busy".
    pub nak_ends_exchange: bool,
    /// Response timeout overriding the configured default.
    pub timeout: Option<Duration>,
    /// Timeout retries overriding the configured default.
    pub retries: Option<u32>,
}

impl CommandOptions {
    /// The usual settle rules for a command.
    ///
    /// IM-only commands settle on their echo; direct messages wait for the
    /// device ACK; group commands wait for the cleanup report; link reads
    /// wait for the record.
    pub fn for_command(command: &Command) -> Self {
        match CommandKind::from(command) {
            CommandKind::ImInfo
            | CommandKind::X10
            | CommandKind::CancelLinking
            | CommandKind::ManageLink => CommandOptions {
                exit_on_ack: true,
                ..Default::default()
            },
            CommandKind::StartLinking => CommandOptions {
                wait_for_linking: true,
                ..Default::default()
            },
            CommandKind::GetFirstLink | CommandKind::GetNextLink => CommandOptions {
                nak_ends_exchange: true,
                ..Default::default()
            },
            CommandKind::Direct | CommandKind::Extended | CommandKind::AllLink => {
                CommandOptions::default()
            }
        }
    }

    /// Wait for `count` extended responses after the device ACK.
    pub fn with_extended_responses(mut self, count: usize) -> Self {
        self.wait_for_extended = true;
        self.response_count = Some(count);
        self
    }

    /// Settle on a direct standard message from the target.
    pub fn with_standard_response(mut self) -> Self {
        self.is_standard_response = true;
        self
    }

    /// Settle on the IM echo.
    pub fn with_exit_on_ack(mut self) -> Self {
        self.exit_on_ack = true;
        self
    }

    /// Override the response timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the number of timeout retries.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Extended responses needed before settling.
    pub fn expected_responses(&self) -> usize {
        self.response_count.unwrap_or(1).max(1)
    }
}

// ============================================================================
// Status
// ============================================================================

/// What was observed for a command by the time it settled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandStatus {
    /// The IM echoed an ACK.
    pub ack: bool,
    /// The IM or device refused the command.
    pub nack: bool,
    /// Every expected response arrived.
    pub success: bool,
    /// The command ran out of time and retries.
    pub timed_out: bool,
    /// Resends after a timeout.
    pub retries: u32,
    /// NAKs received.
    pub naks: u32,
    /// The IM echo.
    pub echo: Option<Message>,
    /// Standard response from the target device.
    pub standard: Option<StandardMessage>,
    /// Extended responses from the target device.
    pub extended: Vec<ExtendedMessage>,
    /// Final IM message that settled the command (0253, 0257, 0258).
    pub response: Option<Message>,
}

// ============================================================================
// Outgoing Command
// ============================================================================

/// A command waiting to be, or being, written.
pub struct OutgoingCommand {
    command: Command,
    raw: Vec<u8>,
    hex: String,
    options: CommandOptions,
    reply: Option<oneshot::Sender<CommandResult>>,
}

impl OutgoingCommand {
    /// Wrap a command with its usual settle rules.
    pub fn new(command: Command) -> Self {
        let options = CommandOptions::for_command(&command);
        Self::with_options(command, options)
    }

    /// Wrap a command with explicit settle rules.
    pub fn with_options(command: Command, options: CommandOptions) -> Self {
        let raw = command.encode();
        let hex = command.to_hex();
        OutgoingCommand {
            command,
            raw,
            hex,
            options,
            reply: None,
        }
    }

    /// Attach a channel the result is delivered on, returning the receiver.
    pub fn subscribe(&mut self) -> oneshot::Receiver<CommandResult> {
        let (tx, rx) = oneshot::channel();
        self.reply = Some(tx);
        rx
    }

    /// The command.
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Bytes written to the IM.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Bytes written to the IM as uppercase hex.
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Settle rules.
    pub fn options(&self) -> &CommandOptions {
        &self.options
    }

    /// Which IM message this is.
    pub fn kind(&self) -> CommandKind {
        CommandKind::from(&self.command)
    }

    /// Target device of a direct command.
    pub fn target(&self) -> Option<DeviceId> {
        self.command.target()
    }

    /// Deliver the result. Later calls do nothing.
    pub(crate) fn resolve(&mut self, result: CommandResult) {
        if let Some(reply) = self.reply.take() {
            // The caller may have stopped waiting
            let _ = reply.send(result);
        }
    }

    pub(crate) fn reject(&mut self, error: CommandError) {
        self.resolve(Err(error));
    }
}

impl fmt::Debug for OutgoingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutgoingCommand")
            .field("hex", &self.hex)
            .field("kind", &self.kind())
            .field("options", &self.options)
            .finish()
    }
}

// ============================================================================
// Pending Matchers
// ============================================================================

/// Selects queued commands for [`HubState::cancel_pending`](crate::HubState::cancel_pending).
pub enum PendingMatcher {
    /// Every queued command.
    All,
    /// Direct commands addressed to this device.
    Device(DeviceId),
    /// Commands whose raw bytes satisfy the predicate.
    Predicate(Box<dyn Fn(&[u8]) -> bool + Send>),
}

impl PendingMatcher {
    /// Match direct commands to a device given as six hex characters.
    pub fn device(id: &str) -> ProtocolResult<Self> {
        Ok(PendingMatcher::Device(id.parse()?))
    }

    /// Match with a caller-supplied predicate over the raw bytes.
    pub fn predicate(f: impl Fn(&[u8]) -> bool + Send + 'static) -> Self {
        PendingMatcher::Predicate(Box::new(f))
    }

    /// Whether `raw` is selected.
    pub fn matches(&self, raw: &[u8]) -> bool {
        match self {
            PendingMatcher::All => true,
            // 02 62 <id:3> ...
            PendingMatcher::Device(id) => {
                raw.len() >= 5
                    && raw[1] == insteon_protocol::MSG_SEND_DIRECT
                    && raw[2..5] == id.0
            }
            PendingMatcher::Predicate(f) => f(raw),
        }
    }
}

impl fmt::Debug for PendingMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingMatcher::All => write!(f, "All"),
            PendingMatcher::Device(id) => write!(f, "Device({})", id),
            PendingMatcher::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light() -> DeviceId {
        "1A2B3C".parse().unwrap()
    }

    #[test]
    fn test_default_options_per_kind() {
        assert!(CommandOptions::for_command(&Command::GetImInfo).exit_on_ack);
        assert!(CommandOptions::for_command(&Command::start_linking(1, 0)).wait_for_linking);
        assert!(CommandOptions::for_command(&Command::GetNextLink).nak_ends_exchange);
        let direct = CommandOptions::for_command(&Command::ping(light()));
        assert_eq!(direct, CommandOptions::default());
    }

    #[test]
    fn test_outgoing_command_hex() {
        let cmd = OutgoingCommand::new(Command::turn_off(light()));
        assert_eq!(cmd.hex(), "02621A2B3C0F1300");
        assert_eq!(cmd.raw(), &[0x02, 0x62, 0x1A, 0x2B, 0x3C, 0x0F, 0x13, 0x00]);
        assert_eq!(cmd.kind(), CommandKind::Direct);
        assert_eq!(cmd.target(), Some(light()));
    }

    #[test]
    fn test_resolve_once() {
        let mut cmd = OutgoingCommand::new(Command::GetImInfo);
        let mut rx = cmd.subscribe();
        cmd.reject(CommandError::Cancelled);
        cmd.resolve(Ok(CommandStatus::default()));
        assert_eq!(rx.try_recv().unwrap(), Err(CommandError::Cancelled));
    }

    #[test]
    fn test_device_matcher() {
        let matcher = PendingMatcher::device("1a2b3c").unwrap();
        assert!(matcher.matches(&Command::ping(light()).encode()));
        assert!(!matcher.matches(&Command::ping("1A2B3D".parse().unwrap()).encode()));
        assert!(!matcher.matches(&Command::GetImInfo.encode()));
    }

    #[test]
    fn test_device_matcher_rejects_bad_id() {
        assert!(PendingMatcher::device("1A2B").is_err());
    }

    #[test]
    fn test_predicate_matcher() {
        let matcher = PendingMatcher::predicate(|raw| raw.get(6) == Some(&0x11));
        assert!(matcher.matches(&Command::turn_on(light(), 0xFF).encode()));
        assert!(!matcher.matches(&Command::turn_off(light()).encode()));
    }
}
