//! Error types for the batch writer.
//!
//! Three classes of failure exist, matching when they can happen:
//! construction ([`ConfigError`]), the one-shot readiness probe
//! ([`ReadinessError`]) and individual sink calls ([`SinkError`]).
//! [`PipeError`] wraps these for the line pipe used by the binary.

use thiserror::Error;

/// Fatal, synchronous errors raised while building a [`SinkConfig`](crate::SinkConfig)
/// or a [`StreamAdapter`](crate::StreamAdapter).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The stream name was absent or empty.
    #[error("Missing stream name")]
    MissingStreamName,

    /// The flush threshold must be a positive integer.
    #[error("Invalid threshold: {0} (must be at least 1)")]
    InvalidThreshold(usize),

    /// An environment variable was present but could not be parsed.
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Raw value that failed to parse.
        value: String,
    },

    /// The stream variant name was not recognised.
    #[error("Unknown stream variant: {0}")]
    UnknownVariant(String),

    /// Reading a config file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A config file was not valid JSON for [`SinkConfig`](crate::SinkConfig).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a single describe/put call against the sink.
///
/// Delivered through the [`WriteHandle`](crate::WriteHandle) of whichever
/// accept triggered the flush. Never retried.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Network or transport-level HTTP error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Sink API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// Request or response body could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A put-many call was accepted but some records were rejected.
    #[error("{failed} of {total} records rejected by sink")]
    PartialFailure {
        /// Number of rejected records.
        failed: u64,
        /// Number of records in the call.
        total: usize,
    },

    /// Generic transport failure reported by a client implementation.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The spawned call task panicked or was cancelled.
    #[error("Sink call task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for SinkError {
    fn from(err: tokio::task::JoinError) -> Self {
        SinkError::Task(err.to_string())
    }
}

/// Asynchronous, advisory errors from the readiness probe.
///
/// These arrive on [`StreamEvents`](crate::StreamEvents) and never block writes.
#[derive(Debug, Error)]
pub enum ReadinessError {
    /// The describe-status call itself failed.
    #[error("Failed to describe stream {stream_name}: {source}")]
    Transport {
        /// Stream that was probed.
        stream_name: String,
        /// Underlying call failure.
        #[source]
        source: SinkError,
    },

    /// The stream exists but is in a status writes cannot use.
    #[error("Stream {stream_name} is not usable (status {status}, expected {expected})")]
    NotUsable {
        /// Stream that was probed.
        stream_name: String,
        /// Raw status reported by the sink.
        status: String,
        /// Human-readable list of accepted statuses.
        expected: &'static str,
    },
}

/// Failures of a line pipe run.
#[derive(Debug, Error)]
pub enum PipeError {
    /// Reading the input failed.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// The stream turned out not to be usable. Buffered records were still
    /// flushed before this was returned.
    #[error(transparent)]
    Readiness(#[from] ReadinessError),

    /// The final flush task panicked or was cancelled.
    #[error("Final flush task failed: {0}")]
    Flush(#[from] tokio::task::JoinError),
}

/// Result alias for sink calls and write completions.
pub type SinkResult<T> = Result<T, SinkError>;

/// Result alias for configuration and construction.
pub type ConfigResult<T> = Result<T, ConfigError>;
