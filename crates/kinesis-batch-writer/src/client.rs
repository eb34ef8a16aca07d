//! JSON-protocol HTTP sink client.
//!
//! Speaks the `application/x-amz-json-1.1` protocol: every operation is a POST
//! to the service root with an `X-Amz-Target` header naming it. Requests are
//! not signed; point `endpoint` at a local emulator or a signing proxy.

use crate::config::{SinkConfig, TransportConfig};
use crate::error::{SinkError, SinkResult};
use crate::protocol::{
    DescribeDeliveryStreamInput, DescribeDeliveryStreamOutput, DescribeStreamSummaryInput,
    DescribeStreamSummaryOutput, PutMany, PutManyOutput, PutOne,
};
use crate::sink::{ReadinessState, SinkClient, SinkVariant};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const PARTITIONED_TARGET_PREFIX: &str = "Kinesis_20131202";
const DELIVERY_TARGET_PREFIX: &str = "Firehose_20150804";
const DEFAULT_REGION: &str = "us-east-1";

/// HTTP client for either sink variant.
#[derive(Clone)]
pub struct HttpSinkClient {
    http_client: reqwest::Client,
    endpoint: String,
    variant: SinkVariant,
    credentials: Option<String>,
}

impl HttpSinkClient {
    /// Create a client from transport settings.
    ///
    /// Uses `transport.endpoint` when set, otherwise the public endpoint of
    /// `transport.region` (default `us-east-1`).
    pub fn new(variant: SinkVariant, transport: &TransportConfig) -> Self {
        let endpoint = transport
            .endpoint
            .clone()
            .unwrap_or_else(|| default_endpoint(variant, transport.region.as_deref()));

        Self {
            http_client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            variant,
            credentials: transport.credentials.clone(),
        }
    }

    /// Create a client matching a writer config.
    pub fn from_config(config: &SinkConfig) -> Self {
        Self::new(config.variant, &config.transport)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn target(&self, operation: &str) -> String {
        let prefix = match self.variant {
            SinkVariant::Partitioned => PARTITIONED_TARGET_PREFIX,
            SinkVariant::Delivery => DELIVERY_TARGET_PREFIX,
        };
        format!("{}.{}", prefix, operation)
    }

    async fn call<B, R>(&self, operation: &str, body: &B) -> SinkResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(endpoint = %self.endpoint, operation, "Sending sink request");

        let mut request = self
            .http_client
            .post(self.endpoint.as_str())
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", self.target(operation))
            .body(serde_json::to_vec(body)?);
        if let Some(token) = &self.credentials {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SinkError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_slice(b"{}")?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl SinkClient for HttpSinkClient {
    async fn describe_status(&self, stream_name: &str) -> SinkResult<ReadinessState> {
        let status = match self.variant {
            SinkVariant::Partitioned => {
                let output: DescribeStreamSummaryOutput = self
                    .call(
                        "DescribeStreamSummary",
                        &DescribeStreamSummaryInput {
                            stream_name: stream_name.to_string(),
                        },
                    )
                    .await?;
                output.stream_description_summary.stream_status
            }
            SinkVariant::Delivery => {
                let output: DescribeDeliveryStreamOutput = self
                    .call(
                        "DescribeDeliveryStream",
                        &DescribeDeliveryStreamInput {
                            delivery_stream_name: stream_name.to_string(),
                        },
                    )
                    .await?;
                output.delivery_stream_description.delivery_stream_status
            }
        };
        Ok(ReadinessState::parse(&status))
    }

    async fn put_one(&self, request: PutOne) -> SinkResult<()> {
        let _: serde_json::Value = match &request {
            PutOne::Partitioned(input) => self.call("PutRecord", input).await?,
            PutOne::Delivery(input) => self.call("PutRecord", input).await?,
        };
        Ok(())
    }

    async fn put_many(&self, request: PutMany) -> SinkResult<()> {
        let total = request.len();
        let output: PutManyOutput = match &request {
            PutMany::Partitioned(input) => self.call("PutRecords", input).await?,
            PutMany::Delivery(input) => self.call("PutRecordBatch", input).await?,
        };

        if output.failed_record_count > 0 {
            return Err(SinkError::PartialFailure {
                failed: output.failed_record_count,
                total,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for HttpSinkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSinkClient")
            .field("endpoint", &self.endpoint)
            .field("variant", &self.variant)
            .finish_non_exhaustive()
    }
}

fn default_endpoint(variant: SinkVariant, region: Option<&str>) -> String {
    let service = match variant {
        SinkVariant::Partitioned => "kinesis",
        SinkVariant::Delivery => "firehose",
    };
    format!(
        "https://{}.{}.amazonaws.com",
        service,
        region.unwrap_or(DEFAULT_REGION)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{
        DeliveryRecord, PutDeliveryRecordBatchInput, PutDeliveryRecordInput, PutRecordsEntry,
        PutRecordsInput,
    };
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// A request as seen by the canned server.
    struct CapturedRequest {
        /// Request line and headers, lowercased.
        head: String,
        body: String,
    }

    /// Accept one connection, capture the request, answer with `status` and `body`.
    async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<CapturedRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            CONTENT_TYPE,
            body.len(),
            body
        );

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];

            let head_end = loop {
                let n = stream.read(&mut buf).await.unwrap();
                assert!(n > 0, "connection closed before headers");
                raw.extend_from_slice(&buf[..n]);
                if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&raw[..head_end]).to_lowercase();
            let content_length: usize = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .map(|value| value.trim().parse().unwrap())
                .unwrap_or(0);
            while raw.len() < head_end + content_length {
                let n = stream.read(&mut buf).await.unwrap();
                assert!(n > 0, "connection closed before body");
                raw.extend_from_slice(&buf[..n]);
            }

            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();

            CapturedRequest {
                head,
                body: String::from_utf8_lossy(&raw[head_end..head_end + content_length])
                    .into_owned(),
            }
        });

        (endpoint, server)
    }

    fn client_for(variant: SinkVariant, endpoint: String) -> HttpSinkClient {
        let transport = TransportConfig {
            endpoint: Some(endpoint),
            ..TransportConfig::default()
        };
        HttpSinkClient::new(variant, &transport)
    }

    fn two_partitioned_records() -> PutMany {
        PutMany::Partitioned(PutRecordsInput {
            stream_name: "events".to_string(),
            records: vec![
                PutRecordsEntry {
                    partition_key: "k1".to_string(),
                    data: b"a".to_vec(),
                },
                PutRecordsEntry {
                    partition_key: "k2".to_string(),
                    data: b"b".to_vec(),
                },
            ],
        })
    }

    #[tokio::test]
    async fn rejected_records_are_partial_failure() {
        let (endpoint, server) = serve_once("200 OK", r#"{"FailedRecordCount":1}"#).await;
        let client = client_for(SinkVariant::Partitioned, endpoint);

        let err = client.put_many(two_partitioned_records()).await.unwrap_err();
        assert!(matches!(
            err,
            SinkError::PartialFailure {
                failed: 1,
                total: 2
            }
        ));

        let request = server.await.unwrap();
        assert!(request.head.starts_with("post / "));
        assert!(request
            .head
            .contains("x-amz-target: kinesis_20131202.putrecords\r\n"));
        assert!(request
            .head
            .contains("content-type: application/x-amz-json-1.1\r\n"));
        assert!(request.body.contains(r#""StreamName":"events""#));
        assert!(request.body.contains(r#""PartitionKey":"k1","Data":"YQ==""#));
        assert!(request.body.contains(r#""PartitionKey":"k2","Data":"Yg==""#));
    }

    #[tokio::test]
    async fn delivery_batch_without_failures_is_ok() {
        let (endpoint, server) = serve_once("200 OK", r#"{"FailedPutCount":0}"#).await;
        let client = client_for(SinkVariant::Delivery, endpoint);

        let request = PutMany::Delivery(PutDeliveryRecordBatchInput {
            delivery_stream_name: "firehose".to_string(),
            records: vec![
                DeliveryRecord { data: b"a".to_vec() },
                DeliveryRecord { data: b"b".to_vec() },
            ],
        });
        client.put_many(request).await.unwrap();

        let request = server.await.unwrap();
        assert!(request
            .head
            .contains("x-amz-target: firehose_20150804.putrecordbatch\r\n"));
        assert!(request.body.contains(r#""DeliveryStreamName":"firehose""#));
        assert!(request.body.contains(r#""Records":[{"Data":"YQ=="},{"Data":"Yg=="}]"#));
    }

    #[tokio::test]
    async fn delivery_failed_put_count_is_partial_failure() {
        let (endpoint, _server) = serve_once("200 OK", r#"{"FailedPutCount":2}"#).await;
        let client = client_for(SinkVariant::Delivery, endpoint);

        let request = PutMany::Delivery(PutDeliveryRecordBatchInput {
            delivery_stream_name: "firehose".to_string(),
            records: vec![
                DeliveryRecord { data: b"a".to_vec() },
                DeliveryRecord { data: b"b".to_vec() },
            ],
        });
        let err = client.put_many(request).await.unwrap_err();
        assert!(matches!(
            err,
            SinkError::PartialFailure {
                failed: 2,
                total: 2
            }
        ));
    }

    #[tokio::test]
    async fn error_status_is_api_error() {
        let body = r#"{"__type":"ResourceNotFoundException","message":"Stream events not found"}"#;
        let (endpoint, _server) = serve_once("400 Bad Request", body).await;
        let client = client_for(SinkVariant::Partitioned, endpoint);

        let err = client.put_many(two_partitioned_records()).await.unwrap_err();
        match err {
            SinkError::Api { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("ResourceNotFoundException"));
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_response_body_is_accepted() {
        let (endpoint, server) = serve_once("200 OK", "").await;
        let client = client_for(SinkVariant::Delivery, endpoint);

        let request = PutOne::Delivery(PutDeliveryRecordInput {
            delivery_stream_name: "firehose".to_string(),
            record: DeliveryRecord {
                data: b"line\n".to_vec(),
            },
        });
        client.put_one(request).await.unwrap();

        let request = server.await.unwrap();
        assert!(request
            .head
            .contains("x-amz-target: firehose_20150804.putrecord\r\n"));
        assert!(request.body.contains(r#""Record":{"Data":"bGluZQo="}"#));
    }

    #[tokio::test]
    async fn describe_reads_delivery_status() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"DeliveryStreamDescription":{"DeliveryStreamName":"firehose","DeliveryStreamStatus":"CREATING"}}"#,
        )
        .await;
        let client = client_for(SinkVariant::Delivery, endpoint);

        let state = client.describe_status("firehose").await.unwrap();
        assert_eq!(state, ReadinessState::Other("CREATING".to_string()));

        let request = server.await.unwrap();
        assert!(request
            .head
            .contains("x-amz-target: firehose_20150804.describedeliverystream\r\n"));
        assert_eq!(request.body, r#"{"DeliveryStreamName":"firehose"}"#);
    }

    #[tokio::test]
    async fn describe_reads_stream_summary_status() {
        let (endpoint, _server) = serve_once(
            "200 OK",
            r#"{"StreamDescriptionSummary":{"StreamName":"events","StreamStatus":"UPDATING"}}"#,
        )
        .await;
        let client = client_for(SinkVariant::Partitioned, endpoint);

        let state = client.describe_status("events").await.unwrap();
        assert_eq!(state, ReadinessState::Updating);
    }

    #[tokio::test]
    async fn credentials_are_sent_as_bearer_token() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"StreamDescriptionSummary":{"StreamStatus":"ACTIVE"}}"#,
        )
        .await;
        let transport = TransportConfig {
            endpoint: Some(endpoint),
            credentials: Some("secret-token".to_string()),
            ..TransportConfig::default()
        };
        let client = HttpSinkClient::new(SinkVariant::Partitioned, &transport);

        client.describe_status("events").await.unwrap();

        let request = server.await.unwrap();
        assert!(request.head.contains("authorization: bearer secret-token\r\n"));
    }

    #[test]
    fn endpoint_derived_from_region() {
        let transport = TransportConfig {
            region: Some("eu-west-1".to_string()),
            ..TransportConfig::default()
        };
        let client = HttpSinkClient::new(SinkVariant::Partitioned, &transport);
        assert_eq!(client.endpoint(), "https://kinesis.eu-west-1.amazonaws.com");

        let client = HttpSinkClient::new(SinkVariant::Delivery, &TransportConfig::default());
        assert_eq!(client.endpoint(), "https://firehose.us-east-1.amazonaws.com");
    }

    #[test]
    fn explicit_endpoint_wins() {
        let transport = TransportConfig {
            region: Some("eu-west-1".to_string()),
            endpoint: Some("http://localhost:4567/".to_string()),
            credentials: None,
        };
        let client = HttpSinkClient::new(SinkVariant::Partitioned, &transport);
        assert_eq!(client.endpoint(), "http://localhost:4567");
    }

    #[test]
    fn target_header_per_variant() {
        let kinesis = HttpSinkClient::new(SinkVariant::Partitioned, &TransportConfig::default());
        assert_eq!(kinesis.target("PutRecords"), "Kinesis_20131202.PutRecords");

        let firehose = HttpSinkClient::new(SinkVariant::Delivery, &TransportConfig::default());
        assert_eq!(
            firehose.target("PutRecordBatch"),
            "Firehose_20150804.PutRecordBatch"
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_http_error() {
        let transport = TransportConfig {
            endpoint: Some("http://127.0.0.1:1".to_string()),
            ..TransportConfig::default()
        };
        let client = HttpSinkClient::new(SinkVariant::Partitioned, &transport);

        let err = client.describe_status("events").await.unwrap_err();
        assert!(matches!(err, SinkError::Http(_)));
    }
}
