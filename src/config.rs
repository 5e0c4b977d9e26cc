//! Bridge configuration

use crate::{
    error::{BridgeError, Result},
    middleware::{QosProfile, Reliability},
    node::SpinMode,
};

/// Default configuration constants
pub mod defaults {
    /// Keep-last depth for new endpoints
    pub const HISTORY_DEPTH: usize = 10;

    /// Namespace nodes are created in (root)
    pub const NAMESPACE: &str = "";

    /// Largest history depth accepted from configuration
    pub const MAX_HISTORY_DEPTH: usize = 1000;
}

/// Environment variable names read by [`BridgeConfig::from_env`]
pub mod env {
    pub const NAMESPACE: &str = "BRIDGE_NAMESPACE";
    pub const HISTORY_DEPTH: &str = "BRIDGE_HISTORY_DEPTH";
    pub const RELIABILITY: &str = "BRIDGE_RELIABILITY";
    pub const SPIN_MODE: &str = "BRIDGE_SPIN_MODE";
}

/// Settings applied to every node and endpoint the bridge creates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Namespace for new nodes; empty means root
    pub namespace: String,
    /// Keep-last history depth for new endpoints
    pub history_depth: usize,
    /// Delivery reliability for new endpoints
    pub reliability: Reliability,
    /// What `spin_once` does with its timeout
    pub spin_mode: SpinMode,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            namespace: defaults::NAMESPACE.to_string(),
            history_depth: defaults::HISTORY_DEPTH,
            reliability: Reliability::Reliable,
            spin_mode: SpinMode::Sleep,
        }
    }
}

impl BridgeConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// unset keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(namespace) = lookup(env::NAMESPACE) {
            config.namespace = namespace;
        }
        if let Some(depth) = lookup(env::HISTORY_DEPTH) {
            config.history_depth = depth.trim().parse().map_err(|_| {
                BridgeError::invalid_parameter(
                    env::HISTORY_DEPTH,
                    format!("'{}' is not a positive integer", depth),
                )
            })?;
        }
        if let Some(reliability) = lookup(env::RELIABILITY) {
            config.reliability = parse_reliability(&reliability)?;
        }
        if let Some(mode) = lookup(env::SPIN_MODE) {
            config.spin_mode = mode.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set history depth
    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }

    /// Set spin mode
    pub fn with_spin_mode(mut self, mode: SpinMode) -> Self {
        self.spin_mode = mode;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.history_depth == 0 {
            return Err(BridgeError::invalid_parameter(
                "history_depth",
                "History depth cannot be zero",
            ));
        }

        if self.history_depth > defaults::MAX_HISTORY_DEPTH {
            return Err(BridgeError::invalid_parameter(
                "history_depth",
                format!("History depth cannot exceed {}", defaults::MAX_HISTORY_DEPTH),
            ));
        }

        if !self.namespace.is_empty() && !self.namespace.starts_with('/') {
            return Err(BridgeError::invalid_parameter(
                "namespace",
                "Namespace must be empty or absolute",
            ));
        }

        Ok(())
    }

    /// QoS profile for endpoints created under this configuration
    pub fn qos(&self) -> QosProfile {
        QosProfile {
            history_depth: self.history_depth,
            reliability: self.reliability,
        }
    }
}

fn parse_reliability(value: &str) -> Result<Reliability> {
    match value.trim().to_ascii_lowercase().as_str() {
        "reliable" => Ok(Reliability::Reliable),
        "best_effort" | "best-effort" => Ok(Reliability::BestEffort),
        other => Err(BridgeError::invalid_parameter(
            env::RELIABILITY,
            format!("unknown reliability '{}'", other),
        )),
    }
}

/// Builder pattern for bridge configuration
#[derive(Debug, Default)]
pub struct BridgeConfigBuilder {
    config: BridgeConfig,
}

impl BridgeConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    pub fn history_depth(mut self, depth: usize) -> Self {
        self.config.history_depth = depth;
        self
    }

    pub fn reliability(mut self, reliability: Reliability) -> Self {
        self.config.reliability = reliability;
        self
    }

    pub fn spin_mode(mut self, mode: SpinMode) -> Self {
        self.config.spin_mode = mode;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<BridgeConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history_depth, 10);
        assert_eq!(config.spin_mode, SpinMode::Sleep);
        assert_eq!(config.qos().history_depth, 10);
    }

    #[test]
    fn test_from_lookup() {
        let config = BridgeConfig::from_lookup(lookup_from(&[
            (env::NAMESPACE, "/robot"),
            (env::HISTORY_DEPTH, " 3 "),
            (env::RELIABILITY, "best_effort"),
            (env::SPIN_MODE, "wait"),
        ]))
        .unwrap();
        assert_eq!(config.namespace, "/robot");
        assert_eq!(config.history_depth, 3);
        assert_eq!(config.reliability, Reliability::BestEffort);
        assert_eq!(config.spin_mode, SpinMode::Wait);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert!(BridgeConfig::from_lookup(lookup_from(&[(env::HISTORY_DEPTH, "many")])).is_err());
        assert!(BridgeConfig::from_lookup(lookup_from(&[(env::HISTORY_DEPTH, "0")])).is_err());
        assert!(BridgeConfig::from_lookup(lookup_from(&[(env::SPIN_MODE, "dispatch")])).is_err());
        assert!(BridgeConfig::from_lookup(lookup_from(&[(env::NAMESPACE, "relative")])).is_err());
    }

    #[test]
    fn test_builder() {
        let config = BridgeConfigBuilder::new()
            .namespace("/lab")
            .history_depth(1)
            .spin_mode(SpinMode::Wait)
            .build()
            .unwrap();
        assert_eq!(config.namespace, "/lab");
        assert!(BridgeConfigBuilder::new().history_depth(5000).build().is_err());
    }
}
