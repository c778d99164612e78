//! Runner configuration
//!
//! [`FlowConfig`] is plain serde data so it can be embedded in a host
//! application's own configuration file, and it can also be overridden
//! from the environment with [`FlowConfig::from_env`].

use crate::error::FlowError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// Environment variable overriding [`FlowConfig::default_limit`]
pub const ENV_DEFAULT_LIMIT: &str = "TASKFLOW_DEFAULT_LIMIT";
/// Environment variable overriding [`FlowConfig::on_failure`]
pub const ENV_ON_FAILURE: &str = "TASKFLOW_ON_FAILURE";

/// Default parallel count used when a caller does not pick a limit
pub const DEFAULT_LIMIT: usize = 10;

/// What fan-out runners do with siblings still in flight after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiblingPolicy {
    /// Let them run to completion on a detached task and discard their outcomes
    #[default]
    Detach,
    /// Drop them, cancelling them at their next suspension point
    Abort,
}

impl FromStr for SiblingPolicy {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detach" => Ok(Self::Detach),
            "abort" => Ok(Self::Abort),
            other => Err(FlowError::invalid_config(
                "on_failure",
                format!("expected 'detach' or 'abort', got '{other}'"),
            )),
        }
    }
}

/// Configuration shared by the runners of a [`Flow`](crate::Flow)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Concurrency ceiling used by [`Flow::limit_parallel_default`](crate::Flow::limit_parallel_default)
    pub default_limit: usize,
    /// Failure handling for `parallel` and `map`
    pub on_failure: SiblingPolicy,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            on_failure: SiblingPolicy::default(),
        }
    }
}

impl FlowConfig {
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_sibling_policy(mut self, policy: SiblingPolicy) -> Self {
        self.on_failure = policy;
        self
    }

    /// Check the configuration for values the runners cannot honor
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.default_limit == 0 {
            return Err(FlowError::invalid_config(
                "default_limit",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Defaults overridden by `TASKFLOW_*` environment variables
    pub fn from_env() -> Result<Self, FlowError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`
    ///
    /// Separated from [`FlowConfig::from_env`] so overrides can be tested
    /// without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FlowError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_DEFAULT_LIMIT) {
            config.default_limit = raw.trim().parse().map_err(|_| {
                FlowError::invalid_config(
                    "default_limit",
                    format!("{ENV_DEFAULT_LIMIT}='{raw}' is not a non-negative integer"),
                )
            })?;
            debug!("default_limit overridden from environment: {}", config.default_limit);
        }

        if let Some(raw) = lookup(ENV_ON_FAILURE) {
            config.on_failure = raw.parse()?;
            debug!("on_failure overridden from environment: {:?}", config.on_failure);
        }

        config.validate()?;
        Ok(config)
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
        let config = FlowConfig::default();
        assert_eq!(config.default_limit, DEFAULT_LIMIT);
        assert_eq!(config.on_failure, SiblingPolicy::Detach);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = FlowConfig::default()
            .with_default_limit(3)
            .with_sibling_policy(SiblingPolicy::Abort);
        assert_eq!(config.default_limit, 3);
        assert_eq!(config.on_failure, SiblingPolicy::Abort);
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        let err = FlowConfig::default()
            .with_default_limit(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidConfig { ref field, .. } if field == "default_limit"));
    }

    #[test]
    fn test_deserialize_partial_config_fills_defaults() {
        let config: FlowConfig = serde_json::from_str(r#"{"on_failure": "abort"}"#).unwrap();
        assert_eq!(config.on_failure, SiblingPolicy::Abort);
        assert_eq!(config.default_limit, DEFAULT_LIMIT);

        let config: FlowConfig = serde_json::from_str(r#"{"default_limit": 4}"#).unwrap();
        assert_eq!(config.default_limit, 4);
        assert_eq!(config.on_failure, SiblingPolicy::Detach);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = FlowConfig::from_lookup(lookup_from(&[
            (ENV_DEFAULT_LIMIT, " 2 "),
            (ENV_ON_FAILURE, "Abort"),
        ]))
        .unwrap();
        assert_eq!(config.default_limit, 2);
        assert_eq!(config.on_failure, SiblingPolicy::Abort);
    }

    #[test]
    fn test_from_lookup_without_overrides_is_default() {
        let config = FlowConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, FlowConfig::default());
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = FlowConfig::from_lookup(lookup_from(&[(ENV_DEFAULT_LIMIT, "-1")])).unwrap_err();
        assert!(err.to_string().contains("default_limit"));

        let err = FlowConfig::from_lookup(lookup_from(&[(ENV_DEFAULT_LIMIT, "0")])).unwrap_err();
        assert!(err.to_string().contains("must be at least 1"));

        let err = FlowConfig::from_lookup(lookup_from(&[(ENV_ON_FAILURE, "explode")])).unwrap_err();
        assert!(err.to_string().contains("on_failure"));
    }
}
