//! Chunking and call-shape selection.
//!
//! One pending record becomes a put-one call. Anything more is split, in
//! submission order, into put-many calls of at most [`MAX_BATCH`] records.

use crate::protocol::{
    DeliveryRecord, PutDeliveryRecordBatchInput, PutDeliveryRecordInput, PutMany, PutOne,
    PutRecordInput, PutRecordsEntry, PutRecordsInput, MAX_BATCH,
};
use crate::record::{Record, SerializedRecord};
use crate::serializer::serialize;
use crate::sink::SinkVariant;
use rand::RngCore;
use std::fmt::Write as _;

/// Random bytes per partition key; rendered as twice as many hex characters.
const PARTITION_KEY_BYTES: usize = 64;

/// One planned sink call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    One(PutOne),
    Many(PutMany),
}

impl SinkCall {
    /// Number of records the call carries.
    pub fn len(&self) -> usize {
        match self {
            SinkCall::One(_) => 1,
            SinkCall::Many(many) => many.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split `len` records into group sizes of at most `MAX_BATCH`, in order.
pub fn chunk_sizes(len: usize) -> Vec<usize> {
    let mut sizes = Vec::with_capacity(len.div_ceil(MAX_BATCH));
    let mut remaining = len;
    while remaining > 0 {
        let size = remaining.min(MAX_BATCH);
        sizes.push(size);
        remaining -= size;
    }
    sizes
}

/// Builds sink calls for one stream.
#[derive(Debug, Clone)]
pub struct Batcher {
    stream_name: String,
    variant: SinkVariant,
}

impl Batcher {
    pub fn new(stream_name: impl Into<String>, variant: SinkVariant) -> Self {
        Self {
            stream_name: stream_name.into(),
            variant,
        }
    }

    /// Serialize and plan calls for every record, consuming them.
    ///
    /// Returns no calls for an empty input.
    pub fn plan(&self, records: Vec<Record>) -> Vec<SinkCall> {
        let serialized: Vec<SerializedRecord> = records.iter().map(serialize).collect();
        self.plan_serialized(serialized)
    }

    fn plan_serialized(&self, mut serialized: Vec<SerializedRecord>) -> Vec<SinkCall> {
        if serialized.len() == 1 {
            let record = serialized.remove(0);
            return vec![SinkCall::One(self.put_one(record))];
        }

        let mut calls = Vec::new();
        let mut rest = serialized.into_iter();
        for size in chunk_sizes(rest.len()) {
            let chunk: Vec<SerializedRecord> = rest.by_ref().take(size).collect();
            calls.push(SinkCall::Many(self.put_many(chunk)));
        }
        calls
    }

    fn put_one(&self, record: SerializedRecord) -> PutOne {
        match self.variant {
            SinkVariant::Partitioned => PutOne::Partitioned(PutRecordInput {
                stream_name: self.stream_name.clone(),
                partition_key: partition_key(),
                data: record.data,
            }),
            SinkVariant::Delivery => PutOne::Delivery(PutDeliveryRecordInput {
                delivery_stream_name: self.stream_name.clone(),
                record: DeliveryRecord { data: record.data },
            }),
        }
    }

    fn put_many(&self, chunk: Vec<SerializedRecord>) -> PutMany {
        match self.variant {
            SinkVariant::Partitioned => PutMany::Partitioned(PutRecordsInput {
                stream_name: self.stream_name.clone(),
                records: chunk
                    .into_iter()
                    .map(|record| PutRecordsEntry {
                        partition_key: partition_key(),
                        data: record.data,
                    })
                    .collect(),
            }),
            SinkVariant::Delivery => PutMany::Delivery(PutDeliveryRecordBatchInput {
                delivery_stream_name: self.stream_name.clone(),
                records: chunk
                    .into_iter()
                    .map(|record| DeliveryRecord { data: record.data })
                    .collect(),
            }),
        }
    }
}

/// Fresh random partition key for one record.
///
/// `thread_rng` is a CSPRNG, so keys spread evenly across shards.
pub fn partition_key() -> String {
    let mut bytes = [0u8; PARTITION_KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    let mut key = String::with_capacity(PARTITION_KEY_BYTES * 2);
    for byte in bytes {
        let _ = write!(key, "{:02x}", byte);
    }
    key
}
