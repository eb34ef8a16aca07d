//! Kinesis batch writer: buffered, batching writes to stream sinks.
//!
//! Producers hand records to a [`StreamAdapter`] one at a time or in groups.
//! The adapter buffers them, and once a threshold is reached (or input ends)
//! turns them into put-one / put-many calls against a [`SinkClient`].
//!
//! # Architecture
//!
//! ```text
//! Record -> StreamAdapter (buffer) -> Batcher -> Serializer -> SinkClient
//!                 |                                               |
//!                 +-- readiness probe (once, advisory) -----------+
//! ```
//!
//! # Guarantees
//!
//! - **Ordered chunking**: records are chunked in submission order, at most
//!   [`MAX_BATCH`] per call
//! - **Non-blocking small writes**: sub-threshold writes never wait on the network
//! - **No delivery guarantee**: failed calls are reported, never retried
//! - **Advisory readiness**: a stream that is not ready raises an event but
//!   does not block writes

pub mod adapter;
pub mod batcher;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipe;
pub mod protocol;
pub mod readiness;
pub mod record;
pub mod serializer;
pub mod sink;
pub mod value;

#[cfg(test)]
mod tests;

pub use adapter::{StreamAdapter, StreamEvents, WriteHandle};
pub use batcher::{Batcher, SinkCall};
pub use client::HttpSinkClient;
pub use config::{SinkConfig, TransportConfig, DEFAULT_THRESHOLD};
pub use error::{ConfigError, ConfigResult, PipeError, ReadinessError, SinkError, SinkResult};
pub use protocol::{PutMany, PutOne, MAX_BATCH};
pub use record::{Record, SerializedRecord};
pub use serializer::serialize;
pub use sink::{ReadinessState, SinkClient, SinkVariant};
pub use value::{ObjectNode, StructuredValue};
