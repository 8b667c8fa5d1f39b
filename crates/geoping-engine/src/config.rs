//! Configuration for the geofence engine
//!
//! Defines the initial filter and permission state and the worker's command
//! channel capacity.

use crate::EngineError;
use serde::{Deserialize, Serialize};

/// Configuration for the geofence engine and its worker
///
/// # Examples
///
/// ```
/// use geoping_engine::EngineConfig;
///
/// // Default configuration: active reminders only, notifications allowed
/// let config = EngineConfig::default();
/// assert!(config.active_only);
/// assert!(config.notifications_enabled);
///
/// // Evaluate every reminder, including switched-off ones
/// let config = EngineConfig::all_reminders();
/// assert!(!config.active_only);
///
/// // Start without notification permission
/// let config = EngineConfig::muted();
/// assert!(!config.notifications_enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Only evaluate reminders whose active flag is set
    /// Default: true
    #[serde(default = "default_true")]
    pub active_only: bool,

    /// Initial notification permission state
    /// Default: true
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,

    /// Capacity of the worker's command channel
    /// Default: 32
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

fn default_true() -> bool {
    true
}

fn default_command_buffer() -> usize {
    32
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            active_only: true,
            notifications_enabled: true,
            command_buffer: default_command_buffer(),
        }
    }
}

impl EngineConfig {
    /// Evaluate inactive reminders too
    pub fn all_reminders() -> Self {
        Self {
            active_only: false,
            ..Self::default()
        }
    }

    /// Start with notifications withheld until permission is granted
    pub fn muted() -> Self {
        Self {
            notifications_enabled: false,
            ..Self::default()
        }
    }

    /// Parse a configuration from TOML
    ///
    /// ```
    /// use geoping_engine::EngineConfig;
    ///
    /// let config = EngineConfig::from_toml_str("active_only = false").unwrap();
    /// assert!(!config.active_only);
    /// assert_eq!(config.command_buffer, 32);
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that would otherwise fail at runtime
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.command_buffer == 0 {
            return Err(EngineError::Config(
                "command_buffer must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
