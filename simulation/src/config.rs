//! Run parameters

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Parameters of a single network run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Capacity of every stack built by the nodes
    pub max_stack: usize,
    /// A window this long without any processed message counts as converged
    pub idle_timeout: Duration,
    /// How long a worker blocks on its queue before checking again
    pub receive_timeout: Duration,
    /// Hard cap on the wait for convergence (None = wait forever)
    pub max_duration: Option<Duration>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_stack: 4,
            idle_timeout: Duration::from_millis(50),
            receive_timeout: Duration::from_millis(10),
            max_duration: Some(Duration::from_secs(30)),
        }
    }
}

impl NetworkConfig {
    pub fn with_max_stack(mut self, max_stack: usize) -> Self {
        self.max_stack = max_stack;
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_receive_timeout(mut self, receive_timeout: Duration) -> Self {
        self.receive_timeout = receive_timeout;
        self
    }

    pub fn with_max_duration(mut self, max_duration: Option<Duration>) -> Self {
        self.max_duration = max_duration;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NetworkConfig::default();
        assert_eq!(config.max_stack, 4);
        assert_eq!(config.idle_timeout, Duration::from_millis(50));
        assert_eq!(config.receive_timeout, Duration::from_millis(10));
        assert_eq!(config.max_duration, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_builders() {
        let config = NetworkConfig::default()
            .with_max_stack(1)
            .with_idle_timeout(Duration::from_millis(5))
            .with_max_duration(None);
        assert_eq!(config.max_stack, 1);
        assert_eq!(config.idle_timeout, Duration::from_millis(5));
        assert!(config.max_duration.is_none());
    }

    #[test]
    fn test_config_serde() {
        let config = NetworkConfig::default().with_max_stack(2).with_max_duration(None);
        let json = serde_json::to_string(&config).unwrap();
        let back: NetworkConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
