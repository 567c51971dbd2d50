//! Client configuration

use crate::protocol::constants::DEFAULT_MAX_FRAME_SIZE;

/// Client configuration options
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server host name or IP literal
    pub host: String,

    /// Server port
    pub port: u16,

    /// Largest accepted frame body in bytes
    pub max_frame_size: usize,
}

impl ClientConfig {
    /// Create a config for `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Set the maximum frame size
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// `host:port` form, with IPv6 literals bracketed
    pub fn server_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}
