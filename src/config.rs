use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

use crate::utils::{CircuitBreakerConfig, RetryConfig};

// ============================================================================
// Runtime Configuration
// ============================================================================
//
// Settings for the adapters placed around the workflow. The workflow itself
// has nothing to configure.
//
// Sources (later wins):
// 1. Built-in defaults
// 2. JSON file named by `ORDER_WORKFLOW_CONFIG` (if set)
//
// Missing keys fall back to their defaults.
//
// ============================================================================

/// Environment variable naming the JSON config file
pub const CONFIG_ENV_VAR: &str = "ORDER_WORKFLOW_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_filter: String,
    pub address_retry: RetrySettings,
    pub price_circuit: CircuitSettings,
    /// Upper bound for a single price lookup
    pub price_lookup_timeout_ms: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            log_filter: "info,order_workflow=debug".to_string(),
            address_retry: RetrySettings::default(),
            price_circuit: CircuitSettings::default(),
            price_lookup_timeout_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 2_000,
            multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CircuitSettings {
    pub failure_threshold: u32,
    pub open_timeout_ms: u64,
    pub success_threshold: u32,
}

impl Default for CircuitSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout_ms: 30_000,
            success_threshold: 2,
        }
    }
}

impl WorkflowConfig {
    /// Load from the file named by `ORDER_WORKFLOW_CONFIG`, or defaults when unset.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file {}", path))?;
                let config = Self::from_json(&raw)
                    .with_context(|| format!("Failed to parse config file {}", path))?;
                tracing::info!(path = %path, "Loaded workflow configuration");
                Ok(config)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn price_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.price_lookup_timeout_ms)
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        RetryConfig {
            max_attempts: settings.max_attempts.max(1),
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            multiplier: settings.multiplier,
        }
    }
}

impl From<&CircuitSettings> for CircuitBreakerConfig {
    fn from(settings: &CircuitSettings) -> Self {
        CircuitBreakerConfig {
            failure_threshold: settings.failure_threshold.max(1),
            open_timeout: Duration::from_millis(settings.open_timeout_ms),
            success_threshold: settings.success_threshold.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = WorkflowConfig::default();
        assert_eq!(config.log_filter, "info,order_workflow=debug");
        assert_eq!(config.price_lookup_timeout(), Duration::from_millis(500));
        assert_eq!(RetryConfig::from(&config.address_retry), RetryConfig::default());
        assert_eq!(
            CircuitBreakerConfig::from(&config.price_circuit),
            CircuitBreakerConfig::default()
        );
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = WorkflowConfig::from_json(
            r#"{ "address_retry": { "max_attempts": 5 }, "price_lookup_timeout_ms": 50 }"#,
        )
        .unwrap();

        assert_eq!(config.address_retry.max_attempts, 5);
        assert_eq!(config.address_retry.initial_delay_ms, 100);
        assert_eq!(config.price_lookup_timeout_ms, 50);
        assert_eq!(config.price_circuit, CircuitSettings::default());
    }

    #[test]
    fn test_zero_attempts_still_calls_once() {
        let settings = RetrySettings {
            max_attempts: 0,
            ..RetrySettings::default()
        };
        assert_eq!(RetryConfig::from(&settings).max_attempts, 1);
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        assert!(WorkflowConfig::from_json("{ not json").is_err());
    }
}
