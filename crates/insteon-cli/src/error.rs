//! CLI errors.

use insteon_hub::{ConfigError, HubError};
use insteon_protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Hub(#[from] HubError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no hub host given; use --host or set `host` in the config file")]
    MissingHost,
}

pub type Result<T> = std::result::Result<T, CliError>;
