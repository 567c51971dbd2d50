//! Server configuration

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use crate::protocol::constants::DEFAULT_MAX_FRAME_SIZE;

/// Address family to listen on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    /// IPv4, all interfaces
    V4,
    /// IPv6, all interfaces
    V6,
}

impl AddressFamily {
    /// Wildcard address for this family on `port`
    pub fn any(self, port: u16) -> SocketAddr {
        match self {
            AddressFamily::V4 => SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            AddressFamily::V6 => SocketAddr::from((Ipv6Addr::UNSPECIFIED, port)),
        }
    }
}

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Largest accepted frame body in bytes
    pub max_frame_size: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Disconnect a client that sends nothing for this long (None = never)
    pub idle_timeout: Option<Duration>,

    /// How long shutdown waits for connections to close on their own
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: AddressFamily::V4.any(5151),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            tcp_nodelay: true, // chat lines are small and latency-sensitive
            idle_timeout: None,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the maximum frame size
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Set idle timeout
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Set shutdown grace period
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 5151);
        assert_eq!(config.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
        assert!(config.tcp_nodelay);
        assert!(config.idle_timeout.is_none());
    }

    #[test]
    fn test_address_family() {
        let v4 = AddressFamily::V4.any(4000);
        assert!(v4.is_ipv4());
        assert!(v4.ip().is_unspecified());
        assert_eq!(v4.port(), 4000);

        let v6 = AddressFamily::V6.any(4000);
        assert!(v6.is_ipv6());
        assert!(v6.ip().is_unspecified());
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:6000".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .max_frame_size(512)
            .idle_timeout(Duration::from_secs(30))
            .shutdown_grace(Duration::from_millis(100));

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_frame_size, 512);
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.shutdown_grace, Duration::from_millis(100));
    }
}
