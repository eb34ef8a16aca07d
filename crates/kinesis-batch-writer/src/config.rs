//! Writer configuration.
//!
//! Layers, lowest first: defaults, an optional JSON file, environment
//! variables, then whatever the caller (usually CLI flags) sets directly.
//! [`SinkConfig::validate`] runs at adapter construction.

use crate::error::{ConfigError, ConfigResult};
use crate::sink::SinkVariant;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of buffered records that triggers a flush.
pub const DEFAULT_THRESHOLD: usize = 20;

/// Transport settings handed to the sink client untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Service region, e.g. `eu-west-1`.
    #[serde(default)]
    pub region: Option<String>,
    /// Explicit endpoint URL. Overrides the region-derived one.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Opaque credential passed as a bearer token, if any.
    #[serde(default)]
    pub credentials: Option<String>,
}

/// Configuration for one [`StreamAdapter`](crate::StreamAdapter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Target stream. Required and non-empty.
    #[serde(default)]
    pub stream_name: String,
    /// Sink variant, which selects call shapes and accepted statuses.
    #[serde(default)]
    pub variant: SinkVariant,
    /// Buffered record count that triggers a flush on single writes.
    #[serde(default = "default_threshold")]
    pub threshold: usize,
    /// Transport passthrough.
    #[serde(default)]
    pub transport: TransportConfig,
}

fn default_threshold() -> usize {
    DEFAULT_THRESHOLD
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            stream_name: String::new(),
            variant: SinkVariant::default(),
            threshold: DEFAULT_THRESHOLD,
            transport: TransportConfig::default(),
        }
    }
}

impl SinkConfig {
    /// Config for `stream_name` with every other field defaulted.
    pub fn new(stream_name: impl Into<String>, variant: SinkVariant) -> Self {
        Self {
            stream_name: stream_name.into(),
            variant,
            ..Self::default()
        }
    }

    /// Builder-style threshold override.
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SinkConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Override fields from environment variables that are set.
    ///
    /// - `KINESIS_STREAM_NAME`
    /// - `KINESIS_STREAM_VARIANT` (`partitioned` / `delivery`)
    /// - `KINESIS_THRESHOLD`
    /// - `AWS_REGION`
    /// - `KINESIS_ENDPOINT`
    pub fn load_from_env(&mut self) -> ConfigResult<()> {
        self.apply_env(|name| std::env::var(name).ok())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(name) = lookup("KINESIS_STREAM_NAME") {
            self.stream_name = name;
        }
        if let Some(variant) = lookup("KINESIS_STREAM_VARIANT") {
            self.variant = variant.parse()?;
        }
        if let Some(raw) = lookup("KINESIS_THRESHOLD") {
            self.threshold = raw.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "KINESIS_THRESHOLD",
                value: raw.clone(),
            })?;
        }
        if let Some(region) = lookup("AWS_REGION") {
            self.transport.region = Some(region);
        }
        if let Some(endpoint) = lookup("KINESIS_ENDPOINT") {
            self.transport.endpoint = Some(endpoint);
        }
        Ok(())
    }

    /// Check construction invariants.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.stream_name.trim().is_empty() {
            return Err(ConfigError::MissingStreamName);
        }
        if self.threshold == 0 {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}
