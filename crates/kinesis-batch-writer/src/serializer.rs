//! Record serialization.
//!
//! Every record becomes one line-oriented payload. Text and binary records are
//! assumed to be pre-formatted and pass through untouched. Structured records
//! get a log-indexer-friendly `@timestamp` field and exactly one trailing
//! newline.

use crate::record::{Record, SerializedRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Canonical timestamp field written into structured records.
pub const TIMESTAMP_FIELD: &str = "@timestamp";

/// Field a canonical timestamp is derived from, when present.
pub const SOURCE_TIMESTAMP_FIELD: &str = "timestamp";

/// Serialize one record using the current time for missing timestamps.
pub fn serialize(record: &Record) -> SerializedRecord {
    serialize_at(record, Utc::now())
}

/// Serialize one record, using `now` when a timestamp has to be captured.
pub fn serialize_at(record: &Record, now: DateTime<Utc>) -> SerializedRecord {
    let data = match record {
        Record::Text(text) => text.as_bytes().to_vec(),
        Record::Binary(bytes) => String::from_utf8_lossy(bytes).into_owned().into_bytes(),
        Record::Structured(value) => {
            let mut json = value.to_json();
            if let Value::Object(map) = &mut json {
                normalize_timestamp(map, now);
            }
            // Display on Value cannot fail, unlike to_string/to_vec.
            let mut line = json.to_string();
            line.push('\n');
            line.into_bytes()
        }
    };

    SerializedRecord { data }
}

/// Ensure `map` carries an ISO-8601 UTC `@timestamp`.
///
/// An existing `@timestamp` is left alone. Otherwise it is derived from a
/// `timestamp` field (epoch milliseconds or RFC 3339), falling back to `now`.
fn normalize_timestamp(map: &mut Map<String, Value>, now: DateTime<Utc>) {
    if map.contains_key(TIMESTAMP_FIELD) {
        return;
    }

    let instant = map
        .get(SOURCE_TIMESTAMP_FIELD)
        .and_then(parse_timestamp)
        .unwrap_or(now);

    map.insert(TIMESTAMP_FIELD.to_string(), Value::String(format_iso(instant)));
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(millis)
        }
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

fn format_iso(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}
