//! Readiness probe events per variant.

use super::harness::{adapter, MockSinkClient};
use crate::error::{ReadinessError, SinkError};
use crate::readiness::check_ready;
use crate::sink::{ReadinessState, SinkVariant};

#[tokio::test]
async fn active_stream_raises_no_event() {
    let mock = MockSinkClient::new();
    let (_adapter, mut events) = adapter(&mock, SinkVariant::Partitioned, 10);

    // Channel closes once the probe is done.
    assert!(events.recv().await.is_none());
    assert_eq!(mock.describe_count(), 1);
}

#[tokio::test]
async fn creating_stream_raises_event_but_accepts_writes() {
    let mock = MockSinkClient::new();
    mock.set_status("CREATING");
    let (mut adapter, mut events) = adapter(&mock, SinkVariant::Partitioned, 1);

    // Nothing has run yet on this single-threaded runtime.
    assert!(events.try_recv().is_none());

    match events.recv().await {
        Some(ReadinessError::NotUsable {
            stream_name,
            status,
            ..
        }) => {
            assert_eq!(stream_name, "events");
            assert_eq!(status, "CREATING");
        }
        other => panic!("expected NotUsable, got {:?}", other),
    }
    assert!(events.recv().await.is_none());
    assert!(events.try_recv().is_none());

    adapter.write("still sent\n").await.unwrap();
    assert_eq!(mock.put_one_count(), 1);
}

#[tokio::test]
async fn updating_is_ready_for_partitioned_only() {
    let mock = MockSinkClient::new();
    mock.set_status("UPDATING");

    let (_partitioned, mut events) = adapter(&mock, SinkVariant::Partitioned, 10);
    assert!(events.recv().await.is_none());

    let (_delivery, mut events) = adapter(&mock, SinkVariant::Delivery, 10);
    let err = events.recv().await.expect("delivery should reject UPDATING");
    assert!(matches!(err, ReadinessError::NotUsable { ref status, .. } if status == "UPDATING"));
    assert_eq!(
        err.to_string(),
        "Stream events is not usable (status UPDATING, expected ACTIVE)"
    );

    assert_eq!(mock.describe_count(), 2);
}

#[tokio::test]
async fn describe_failure_raises_transport_event() {
    let mock = MockSinkClient::new();
    mock.fail_describe("connection refused");
    let (_adapter, mut events) = adapter(&mock, SinkVariant::Delivery, 10);

    match events.recv().await {
        Some(ReadinessError::Transport {
            stream_name,
            source: SinkError::Transport(message),
        }) => {
            assert_eq!(stream_name, "events");
            assert_eq!(message, "connection refused");
        }
        other => panic!("expected Transport, got {:?}", other),
    }
}

#[tokio::test]
async fn probe_runs_once_per_adapter() {
    let mock = MockSinkClient::new();
    let (mut adapter, mut events) = adapter(&mock, SinkVariant::Partitioned, 1);

    for i in 0..5 {
        adapter.write(format!("{}\n", i)).await.unwrap();
    }
    assert!(events.recv().await.is_none());

    assert_eq!(mock.describe_count(), 1);
    assert_eq!(mock.put_one_count(), 5);
}

#[tokio::test]
async fn check_ready_returns_accepted_state() {
    let mock = MockSinkClient::new();
    mock.set_status("UPDATING");

    let state = check_ready(mock.as_ref(), "events", SinkVariant::Partitioned)
        .await
        .unwrap();
    assert_eq!(state, ReadinessState::Updating);
}
