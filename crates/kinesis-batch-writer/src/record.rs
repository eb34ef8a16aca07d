//! Input records and their wire form.

use crate::value::StructuredValue;
use serde::Serialize;

/// One unit of application data accepted by the writer.
///
/// Records carry no identity beyond their position in submission order.
#[derive(Debug, Clone)]
pub enum Record {
    /// Pre-serialized text. Sent as-is, including any trailing newline.
    Text(String),
    /// Pre-formatted bytes, decoded as UTF-8 on the way out.
    Binary(Vec<u8>),
    /// A structured value, stringified with a timestamp and a newline.
    Structured(StructuredValue),
}

impl Record {
    /// Build a structured record from any serializable value.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        Ok(Record::Structured(serde_json::to_value(value)?.into()))
    }

    /// Short variant name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Text(_) => "text",
            Record::Binary(_) => "binary",
            Record::Structured(_) => "structured",
        }
    }
}

impl From<String> for Record {
    fn from(s: String) -> Self {
        Record::Text(s)
    }
}

impl From<&str> for Record {
    fn from(s: &str) -> Self {
        Record::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Record {
    fn from(bytes: Vec<u8>) -> Self {
        Record::Binary(bytes)
    }
}

impl From<serde_json::Value> for Record {
    fn from(value: serde_json::Value) -> Self {
        Record::Structured(value.into())
    }
}

impl From<StructuredValue> for Record {
    fn from(value: StructuredValue) -> Self {
        Record::Structured(value)
    }
}

/// Canonical wire payload of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedRecord {
    pub data: Vec<u8>,
}

impl SerializedRecord {
    /// View the payload as UTF-8 text.
    ///
    /// The serializer only ever produces valid UTF-8.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.data).unwrap_or_default()
    }
}
