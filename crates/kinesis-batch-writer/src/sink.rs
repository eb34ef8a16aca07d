//! Sink abstraction.
//!
//! The writer only ever talks to a sink through [`SinkClient`]: one status
//! probe and the two put shapes. Which shapes are used, and which statuses
//! count as ready, is decided by the [`SinkVariant`].

use crate::error::{ConfigError, SinkResult};
use crate::protocol::{PutMany, PutOne};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which kind of sink the writer targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkVariant {
    /// Sharded stream; every record needs a partition key.
    #[default]
    Partitioned,
    /// Delivery stream; plain records, no shard concept.
    Delivery,
}

impl SinkVariant {
    /// Whether `state` allows writes for this variant.
    pub fn accepts(&self, state: &ReadinessState) -> bool {
        match self {
            SinkVariant::Partitioned => {
                matches!(state, ReadinessState::Active | ReadinessState::Updating)
            }
            SinkVariant::Delivery => matches!(state, ReadinessState::Active),
        }
    }

    /// Accepted statuses, for error messages.
    pub fn expected_statuses(&self) -> &'static str {
        match self {
            SinkVariant::Partitioned => "ACTIVE or UPDATING",
            SinkVariant::Delivery => "ACTIVE",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SinkVariant::Partitioned => "partitioned",
            SinkVariant::Delivery => "delivery",
        }
    }
}

impl fmt::Display for SinkVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SinkVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "partitioned" | "kinesis" | "stream" => Ok(SinkVariant::Partitioned),
            "delivery" | "firehose" => Ok(SinkVariant::Delivery),
            _ => Err(ConfigError::UnknownVariant(s.to_string())),
        }
    }
}

/// Status reported by the sink's describe call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessState {
    Active,
    Updating,
    /// Any other status, kept verbatim.
    Other(String),
}

impl ReadinessState {
    /// Classify a raw status string.
    pub fn parse(status: &str) -> Self {
        match status {
            "ACTIVE" => ReadinessState::Active,
            "UPDATING" => ReadinessState::Updating,
            other => ReadinessState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ReadinessState::Active => "ACTIVE",
            ReadinessState::Updating => "UPDATING",
            ReadinessState::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The remote ingestion endpoint.
///
/// Implementations own transport, authentication and any retry policy of
/// their own; the writer calls each method at most once per request and
/// never retries.
#[async_trait]
pub trait SinkClient: Send + Sync {
    /// Query the current status of `stream_name`.
    async fn describe_status(&self, stream_name: &str) -> SinkResult<ReadinessState>;

    /// Send a single record.
    async fn put_one(&self, request: PutOne) -> SinkResult<()>;

    /// Send up to [`MAX_BATCH`](crate::protocol::MAX_BATCH) records.
    async fn put_many(&self, request: PutMany) -> SinkResult<()>;
}
