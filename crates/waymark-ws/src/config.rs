//! Upgrade configuration.

/// Settings for the handshake and the resulting connection.
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Maximum message size in bytes (default: 16 MiB).
    pub max_message_size: usize,
    /// Maximum frame size in bytes (default: 4 MiB).
    pub max_frame_size: usize,
    /// Write buffer size in bytes (default: 128 KiB).
    pub write_buffer_size: usize,
    /// Subprotocols the server speaks, in preference order.
    pub protocols: Vec<String>,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_message_size: 16 << 20,
            max_frame_size: 4 << 20,
            write_buffer_size: 128 << 10,
            protocols: Vec::new(),
        }
    }
}

impl WebSocketConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum message size.
    #[must_use]
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Sets the write buffer size.
    #[must_use]
    pub fn write_buffer_size(mut self, size: usize) -> Self {
        self.write_buffer_size = size;
        self
    }

    /// Adds a supported subprotocol.
    #[must_use]
    pub fn protocol(mut self, name: impl Into<String>) -> Self {
        self.protocols.push(name.into());
        self
    }

    pub(crate) fn protocol_config(&self) -> tungstenite::protocol::WebSocketConfig {
        let mut config = tungstenite::protocol::WebSocketConfig::default();
        config.max_message_size = Some(self.max_message_size);
        config.max_frame_size = Some(self.max_frame_size);
        config.write_buffer_size = self.write_buffer_size;
        config.max_write_buffer_size = config.max_write_buffer_size.max(self.write_buffer_size * 2);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = WebSocketConfig::new()
            .max_message_size(1024)
            .max_frame_size(512)
            .protocol("chat")
            .protocol("json");

        assert_eq!(config.max_message_size, 1024);
        assert_eq!(config.protocols, ["chat", "json"]);

        let native = config.protocol_config();
        assert_eq!(native.max_message_size, Some(1024));
        assert_eq!(native.max_frame_size, Some(512));
    }
}
