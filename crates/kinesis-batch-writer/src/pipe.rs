//! Line pipe: newline-delimited input into a stream adapter.
//!
//! Every non-empty line becomes one record and its write handle is awaited
//! before the next line is read. Input, shutdown and readiness events are
//! raced in that priority order, so input that is already available is
//! consumed before a readiness failure stops the run.
//!
//! The adapter is always ended before returning, so buffered records are
//! flushed on every exit path.

use crate::adapter::{StreamAdapter, StreamEvents};
use crate::error::PipeError;
use crate::record::Record;
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info, warn};

/// Turn one input line into a record.
///
/// With `json` set, a line that parses as JSON becomes a structured record.
/// Anything else is sent as text with its newline restored.
pub fn line_to_record(line: String, json: bool) -> Record {
    if json {
        match serde_json::from_str::<serde_json::Value>(&line) {
            Ok(value) => return Record::from(value),
            Err(err) => warn!(error = %err, "Line is not valid JSON, sending as text"),
        }
    }
    let mut text = line;
    text.push('\n');
    Record::Text(text)
}

/// Feed `reader` into `adapter` until EOF, `shutdown`, or a readiness failure.
///
/// Returns the number of records written. At EOF the readiness probe is
/// awaited if it has not finished yet, so a stream that is not usable always
/// turns into [`PipeError::Readiness`].
pub async fn pipe_lines<R, S>(
    mut adapter: StreamAdapter,
    mut events: StreamEvents,
    reader: R,
    json: bool,
    shutdown: S,
) -> Result<u64, PipeError>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut lines = reader.lines();
    let mut written: u64 = 0;
    let mut probe_done = false;
    let mut reached_eof = false;
    let mut failure: Option<PipeError> = None;

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                warn!("Interrupted, flushing buffered records");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.is_empty() {
                        continue;
                    }
                    if let Err(err) = adapter.write(line_to_record(line, json)).await {
                        error!(error = %err, "Write failed");
                    }
                    written += 1;
                }
                Ok(None) => {
                    reached_eof = true;
                    break;
                }
                Err(err) => {
                    failure = Some(err.into());
                    break;
                }
            },
            event = events.recv(), if !probe_done => match event {
                Some(err) => {
                    failure = Some(err.into());
                    break;
                }
                None => probe_done = true,
            },
        }
    }

    if reached_eof && !probe_done {
        if let Some(err) = events.recv().await {
            failure = Some(err.into());
        }
    }

    let buffered = adapter.buffered();
    if let Some(err) = &failure {
        error!(records = written, buffered, error = %err, "Pipe stopped, flushing buffered records");
    } else {
        info!(records = written, buffered, "Input finished, flushing");
    }
    adapter.end().await?;

    match failure {
        Some(err) => Err(err),
        None => Ok(written),
    }
}
