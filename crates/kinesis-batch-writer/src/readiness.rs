//! One-shot readiness probe.

use crate::error::ReadinessError;
use crate::sink::{ReadinessState, SinkClient, SinkVariant};
use tracing::{debug, info};

/// Describe `stream_name` once and classify the result for `variant`.
pub async fn check_ready(
    client: &dyn SinkClient,
    stream_name: &str,
    variant: SinkVariant,
) -> Result<ReadinessState, ReadinessError> {
    debug!(stream_name, %variant, "Describing stream");

    let state = client
        .describe_status(stream_name)
        .await
        .map_err(|source| ReadinessError::Transport {
            stream_name: stream_name.to_string(),
            source,
        })?;

    if !variant.accepts(&state) {
        return Err(ReadinessError::NotUsable {
            stream_name: stream_name.to_string(),
            status: state.to_string(),
            expected: variant.expected_statuses(),
        });
    }

    info!(stream_name, status = %state, "Stream is ready");
    Ok(state)
}
