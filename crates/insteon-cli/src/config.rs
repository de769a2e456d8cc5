//! CLI configuration file.
//!
//! ```yaml
//! host: 192.168.1.20
//! hub:
//!   command_timeout_ms: 3000
//! devices:
//!   - id: 1A2B3C
//!     kind: light
//!   - id: 4D5E6F
//!     kind: motion
//! ```

use std::path::Path;

use insteon_hub::{ConfigError, DeviceKind, HubConfig};
use insteon_protocol::DeviceId;
use serde::Deserialize;

/// A device to register before running a command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceEntry {
    /// Device address.
    pub id: DeviceId,
    /// Capability set.
    pub kind: DeviceKind,
}

/// Everything the CLI reads from its config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Hub host, used when `--host` is not given.
    pub host: Option<String>,
    /// Hub port, used when `--port` is not given.
    pub port: Option<u16>,
    /// Hub engine settings.
    pub hub: HubConfig,
    /// Devices to register.
    pub devices: Vec<DeviceEntry>,
}

impl CliConfig {
    /// Parse a config from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: CliConfig = serde_yaml::from_str(yaml)?;
        config.hub.validate()?;
        Ok(config)
    }

    /// Load a config from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
host: hub.local
port: 25105
hub:
  command_timeout_ms: 3000
  emit_duplicates: true
devices:
  - id: 1a2b3c
    kind: light
  - id: 4D5E6F
    kind: motion
"#;
        let config = CliConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.host.as_deref(), Some("hub.local"));
        assert_eq!(config.port, Some(25105));
        assert_eq!(config.hub.command_timeout_ms, 3000);
        assert!(config.hub.emit_duplicates);
        assert_eq!(config.hub.write_delay_ms, 50);
        assert_eq!(
            config.devices,
            vec![
                DeviceEntry {
                    id: "1A2B3C".parse().unwrap(),
                    kind: DeviceKind::Light,
                },
                DeviceEntry {
                    id: "4D5E6F".parse().unwrap(),
                    kind: DeviceKind::Motion,
                },
            ]
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = CliConfig::from_yaml_str("{}").unwrap();
        assert!(config.host.is_none());
        assert!(config.devices.is_empty());
        assert_eq!(config.hub, HubConfig::default());
    }

    #[test]
    fn test_rejects_bad_device() {
        let yaml = "devices:\n  - id: 1A2B\n    kind: light\n";
        assert!(CliConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_rejects_invalid_hub_settings() {
        let yaml = "hub:\n  command_timeout_ms: 0\n";
        assert!(matches!(
            CliConfig::from_yaml_str(yaml),
            Err(ConfigError::Invalid(_))
        ));
    }
}
