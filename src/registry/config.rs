//! Registry configuration

use crate::protocol::constants::{DEFAULT_CAPACITY, DEFAULT_OUTBOUND_QUEUE};

/// Configuration for the session registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of simultaneously registered participants
    pub capacity: usize,

    /// Per-session outbound queue depth. A recipient whose queue is full
    /// misses the message instead of stalling the sender.
    pub outbound_queue: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            outbound_queue: DEFAULT_OUTBOUND_QUEUE,
        }
    }
}

impl RegistryConfig {
    /// Set the participant capacity
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the outbound queue depth (minimum 1)
    pub fn outbound_queue(mut self, depth: usize) -> Self {
        self.outbound_queue = depth.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.capacity, 15);
        assert_eq!(config.outbound_queue, DEFAULT_OUTBOUND_QUEUE);
    }

    #[test]
    fn test_builder_chaining() {
        let config = RegistryConfig::default().capacity(2).outbound_queue(0);
        assert_eq!(config.capacity, 2);
        assert_eq!(config.outbound_queue, 1);
    }
}
