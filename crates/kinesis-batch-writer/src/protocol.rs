//! Wire shapes for the two sink variants.
//!
//! Field names are the service's PascalCase names and must not change.
//! `Data` travels as base64 on the JSON protocol.
//!
//! | Variant     | put-one                                    | put-many                               |
//! |-------------|--------------------------------------------|----------------------------------------|
//! | Partitioned | `{StreamName, PartitionKey, Data}`         | `{StreamName, Records:[{PartitionKey, Data}]}` |
//! | Delivery    | `{DeliveryStreamName, Record:{Data}}`      | `{DeliveryStreamName, Records:[{Data}]}` |

use serde::{Deserialize, Serialize};

/// Maximum records per put-many call, for both variants.
pub const MAX_BATCH: usize = 500;

mod base64_data {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// Partitioned put-one: `PutRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutRecordInput {
    pub stream_name: String,
    pub partition_key: String,
    #[serde(with = "base64_data")]
    pub data: Vec<u8>,
}

/// One entry of a partitioned put-many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutRecordsEntry {
    pub partition_key: String,
    #[serde(with = "base64_data")]
    pub data: Vec<u8>,
}

/// Partitioned put-many: `PutRecords`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutRecordsInput {
    pub stream_name: String,
    pub records: Vec<PutRecordsEntry>,
}

/// Record body for the delivery variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeliveryRecord {
    #[serde(with = "base64_data")]
    pub data: Vec<u8>,
}

/// Delivery put-one: `PutRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutDeliveryRecordInput {
    pub delivery_stream_name: String,
    pub record: DeliveryRecord,
}

/// Delivery put-many: `PutRecordBatch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutDeliveryRecordBatchInput {
    pub delivery_stream_name: String,
    pub records: Vec<DeliveryRecord>,
}

/// A single-record call, in the shape of its variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOne {
    Partitioned(PutRecordInput),
    Delivery(PutDeliveryRecordInput),
}

impl PutOne {
    /// Payload bytes carried by the call.
    pub fn data(&self) -> &[u8] {
        match self {
            PutOne::Partitioned(input) => &input.data,
            PutOne::Delivery(input) => &input.record.data,
        }
    }
}

/// A multi-record call, in the shape of its variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutMany {
    Partitioned(PutRecordsInput),
    Delivery(PutDeliveryRecordBatchInput),
}

impl PutMany {
    /// Number of records in the call.
    pub fn len(&self) -> usize {
        match self {
            PutMany::Partitioned(input) => input.records.len(),
            PutMany::Delivery(input) => input.records.len(),
        }
    }

    /// Whether the call carries no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Payload bytes of every record, in order.
    pub fn data(&self) -> Vec<&[u8]> {
        match self {
            PutMany::Partitioned(input) => input.records.iter().map(|r| r.data.as_slice()).collect(),
            PutMany::Delivery(input) => input.records.iter().map(|r| r.data.as_slice()).collect(),
        }
    }
}

/// `DescribeStreamSummary` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeStreamSummaryInput {
    pub stream_name: String,
}

/// `DescribeStreamSummary` response, reduced to the status.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeStreamSummaryOutput {
    pub stream_description_summary: StreamDescriptionSummary,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamDescriptionSummary {
    pub stream_status: String,
}

/// `DescribeDeliveryStream` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDeliveryStreamInput {
    pub delivery_stream_name: String,
}

/// `DescribeDeliveryStream` response, reduced to the status.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDeliveryStreamOutput {
    pub delivery_stream_description: DeliveryStreamDescription,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeliveryStreamDescription {
    pub delivery_stream_status: String,
}

/// Put-many response. Both variants report rejected records the same way,
/// under a different field name.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutManyOutput {
    #[serde(default, alias = "FailedPutCount")]
    pub failed_record_count: u64,
}
