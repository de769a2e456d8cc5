//! Error types for the hub crate.

use insteon_protocol::ProtocolError;
use thiserror::Error;

/// Errors reported by a [`Transport`](crate::Transport).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The connection is gone.
    #[error("transport closed")]
    Closed,

    /// The outgoing buffer is full.
    #[error("transport queue full")]
    QueueFull,

    /// Writing to the underlying stream failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e.to_string())
    }
}

/// Why a command did not produce a status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    /// Removed by `cancel_in_progress` or `cancel_pending`.
    #[error("command cancelled")]
    Cancelled,

    /// The command could not be written.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The hub shut down before the command settled.
    #[error("hub closed")]
    Closed,
}

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value is out of its allowed range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level error for hub operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// I/O error on the connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid caller input.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The command failed.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// The command settled without the expected response.
    #[error("no response to {0}")]
    NoResponse(&'static str),
}

/// Result type for hub operations.
pub type HubResult<T> = Result<T, HubError>;

/// Result delivered for each command.
pub type CommandResult = Result<crate::CommandStatus, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_wraps_into_command_error() {
        let err: CommandError = TransportError::Closed.into();
        assert_eq!(err, CommandError::Transport(TransportError::Closed));
        assert_eq!(err.to_string(), "transport error: transport closed");
    }

    #[test]
    fn test_protocol_error_into_hub_error() {
        let err: HubError = ProtocolError::InvalidDeviceId("XYZ".into()).into();
        assert!(matches!(err, HubError::Protocol(_)));
    }
}
