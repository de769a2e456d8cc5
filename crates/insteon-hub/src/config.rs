//! Hub configuration.
//!
//! All timing values are in milliseconds so the config reads naturally from
//! YAML. [`HubConfig::retry_policy`] converts them into the [`RetryPolicy`]
//! the sender consumes.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for a hub connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// How long to wait for a command's response before retrying (milliseconds).
    pub command_timeout_ms: u64,

    /// Number of times a timed-out command is resent.
    pub command_retries: u32,

    /// Delay between a command becoming current and being written (milliseconds).
    /// The IM drops bytes that arrive while it is still busy with the last message.
    pub write_delay_ms: u64,

    /// Starting value of the NAK backoff timer (milliseconds). The timer
    /// is multiplied before every resend, so the first NAK waits
    /// `nak_base_delay_ms * nak_backoff_multiplier`.
    pub nak_base_delay_ms: u64,

    /// Factor the NAK resend delay grows by on each NAK.
    pub nak_backoff_multiplier: u32,

    /// NAKs tolerated before the command settles as nacked.
    pub nak_max_retries: u32,

    /// Window in which a repeated device event is suppressed (milliseconds).
    pub dedup_window_ms: u64,

    /// Deliver repeated device events instead of suppressing them.
    pub emit_duplicates: bool,

    /// Deliver device ACKs for commands this host sent.
    pub emit_self_acks: bool,

    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,

    /// Capacity of the request channel into the hub task.
    pub request_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        HubConfig {
            command_timeout_ms: 5000,
            command_retries: 1,
            write_delay_ms: 50,
            nak_base_delay_ms: 100,
            nak_backoff_multiplier: 2,
            nak_max_retries: 8,
            dedup_window_ms: 5000,
            emit_duplicates: false,
            emit_self_acks: false,
            event_capacity: 256,
            request_capacity: 64,
        }
    }
}

impl HubConfig {
    /// Parse a config from YAML. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: HubConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "command_timeout_ms must be positive".to_string(),
            ));
        }
        if self.nak_backoff_multiplier == 0 {
            return Err(ConfigError::Invalid(
                "nak_backoff_multiplier must be positive".to_string(),
            ));
        }
        if self.event_capacity == 0 || self.request_capacity == 0 {
            return Err(ConfigError::Invalid(
                "channel capacities must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the command timeout.
    pub fn with_command_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.command_timeout_ms = timeout_ms;
        self
    }

    /// Set the number of timeout retries.
    pub fn with_command_retries(mut self, retries: u32) -> Self {
        self.command_retries = retries;
        self
    }

    /// Set the write delay.
    pub fn with_write_delay_ms(mut self, delay_ms: u64) -> Self {
        self.write_delay_ms = delay_ms;
        self
    }

    /// Set the dedup window.
    pub fn with_dedup_window_ms(mut self, window_ms: u64) -> Self {
        self.dedup_window_ms = window_ms;
        self
    }

    /// Deliver repeated device events.
    pub fn with_emit_duplicates(mut self, emit: bool) -> Self {
        self.emit_duplicates = emit;
        self
    }

    /// Deliver device ACKs for our own commands.
    pub fn with_emit_self_acks(mut self, emit: bool) -> Self {
        self.emit_self_acks = emit;
        self
    }

    /// The dedup window as a duration.
    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.dedup_window_ms)
    }

    /// Retry and backoff parameters for the sender.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(self.command_timeout_ms),
            retries: self.command_retries,
            write_delay: Duration::from_millis(self.write_delay_ms),
            nak_base_delay: Duration::from_millis(self.nak_base_delay_ms),
            nak_multiplier: self.nak_backoff_multiplier.max(1),
            nak_max_retries: self.nak_max_retries,
        }
    }
}

/// Timeout, retry and NAK backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Default response timeout.
    pub timeout: Duration,
    /// Resends after a timeout.
    pub retries: u32,
    /// Delay before the first write of a command.
    pub write_delay: Duration,
    /// Backoff timer before any NAK.
    pub nak_base_delay: Duration,
    /// Growth factor per NAK.
    pub nak_multiplier: u32,
    /// NAKs tolerated before giving up.
    pub nak_max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        HubConfig::default().retry_policy()
    }
}

impl RetryPolicy {
    /// Resend delay after the `nak_count`-th NAK (1-based). Each NAK
    /// multiplies the backoff timer, starting from the base.
    pub fn nak_delay(&self, nak_count: u32) -> Duration {
        let factor = self.nak_multiplier.saturating_pow(nak_count);
        self.nak_base_delay.saturating_mul(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HubConfig::default();
        assert_eq!(config.command_timeout_ms, 5000);
        assert_eq!(config.command_retries, 1);
        assert_eq!(config.write_delay_ms, 50);
        assert_eq!(config.dedup_window(), Duration::from_secs(5));
        assert!(!config.emit_duplicates);
        assert!(!config.emit_self_acks);
    }

    #[test]
    fn test_yaml_partial_override() {
        let config = HubConfig::from_yaml_str("command_retries: 3\nemit_self_acks: true\n")
            .expect("valid yaml");
        assert_eq!(config.command_retries, 3);
        assert!(config.emit_self_acks);
        assert_eq!(config.command_timeout_ms, 5000);
    }

    #[test]
    fn test_yaml_rejects_zero_timeout() {
        let err = HubConfig::from_yaml_str("command_timeout_ms: 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_nak_delay_grows() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.nak_delay(1), Duration::from_millis(200));
        assert_eq!(policy.nak_delay(2), Duration::from_millis(400));
        assert_eq!(policy.nak_delay(3), Duration::from_millis(800));
    }

    #[test]
    fn test_builders() {
        let config = HubConfig::default()
            .with_command_timeout_ms(1000)
            .with_command_retries(0)
            .with_write_delay_ms(0)
            .with_emit_duplicates(true);
        let policy = config.retry_policy();
        assert_eq!(policy.timeout, Duration::from_secs(1));
        assert_eq!(policy.retries, 0);
        assert_eq!(policy.write_delay, Duration::ZERO);
        assert!(config.emit_duplicates);
    }
}
