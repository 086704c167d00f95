//! Notification fanout configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Settings for live subscriber connections.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    /// Frames queued per connection before new ones are dropped
    #[serde(default = "default_connection_buffer")]
    pub connection_buffer: usize,
}

impl NotificationsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.connection_buffer == 0 || self.connection_buffer > 4096 {
            return Err(ValidationError::InvalidConnectionBuffer);
        }
        Ok(())
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            connection_buffer: default_connection_buffer(),
        }
    }
}

fn default_connection_buffer() -> usize {
    32
}
