//! Stream adapter: the buffering write contract in front of a sink.
//!
//! # Flow
//!
//! ```text
//! write()/write_batch() -> buffer -> (threshold | batch | end) -> Batcher -> SinkClient
//!                                                                     |
//!                 WriteHandle <---------- settle all chunk calls <----+
//! ```
//!
//! Sub-threshold writes are acknowledged without waiting on the network. A
//! write that crosses the threshold, and every `write_batch`, returns a handle
//! tied to the flush it triggered. The buffer is emptied as soon as calls are
//! dispatched, so new writes accumulate while earlier calls are in flight.
//!
//! All accepts take `&mut self`, so the buffer is never mutated concurrently.

use crate::batcher::{Batcher, SinkCall};
use crate::config::SinkConfig;
use crate::error::{ConfigResult, ReadinessError, SinkError, SinkResult};
use crate::readiness::check_ready;
use crate::record::Record;
use crate::sink::SinkClient;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Completion of one accepted write.
///
/// Resolves to `Ok(())` immediately for buffered writes, or to the outcome
/// of the flush the write triggered.
#[must_use = "a WriteHandle reports the flush outcome; await it or drop it explicitly"]
#[derive(Debug)]
pub struct WriteHandle {
    state: HandleState,
}

#[derive(Debug)]
enum HandleState {
    Ready(Option<SinkResult<()>>),
    Pending(oneshot::Receiver<SinkResult<()>>),
}

impl WriteHandle {
    fn ready() -> Self {
        Self {
            state: HandleState::Ready(Some(Ok(()))),
        }
    }

    fn pending(receiver: oneshot::Receiver<SinkResult<()>>) -> Self {
        Self {
            state: HandleState::Pending(receiver),
        }
    }

    /// Whether this handle waits on a flush rather than being acknowledged
    /// straight away.
    pub fn is_flush(&self) -> bool {
        matches!(self.state, HandleState::Pending(_))
    }
}

impl Future for WriteHandle {
    type Output = SinkResult<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            HandleState::Ready(outcome) => Poll::Ready(outcome.take().unwrap_or(Ok(()))),
            HandleState::Pending(receiver) => Pin::new(receiver).poll(cx).map(|received| {
                received.unwrap_or_else(|_| {
                    Err(SinkError::Task("flush supervisor dropped".to_string()))
                })
            }),
        }
    }
}

/// Out-of-band, stream-lifetime events.
///
/// Carries readiness failures only. The channel closes once the readiness
/// probe has finished, so `recv` returning `None` means no event will come.
#[derive(Debug)]
pub struct StreamEvents {
    receiver: mpsc::UnboundedReceiver<ReadinessError>,
}

impl StreamEvents {
    /// Wait for the next event, or `None` once the probe is done.
    pub async fn recv(&mut self) -> Option<ReadinessError> {
        self.receiver.recv().await
    }

    /// Take an event if one is already queued.
    pub fn try_recv(&mut self) -> Option<ReadinessError> {
        self.receiver.try_recv().ok()
    }
}

/// Buffering writer for one logical output stream.
///
/// Created once per stream and kept for the whole writer session. Holds a
/// single long-lived sink client.
pub struct StreamAdapter {
    config: SinkConfig,
    client: Arc<dyn SinkClient>,
    batcher: Batcher,
    buffer: Vec<Record>,
    runtime: Handle,
}

impl StreamAdapter {
    /// Create an adapter and start the readiness probe in the background.
    ///
    /// Fails synchronously, before any call is made, if `config` is invalid.
    /// The probe's outcome is advisory: it is reported on the returned
    /// [`StreamEvents`] and never blocks writes.
    ///
    /// # Arguments
    /// * `config` - Stream identity, variant and threshold
    /// * `client` - Sink client shared by every call this adapter makes
    /// * `runtime` - Tokio runtime handle for spawning calls
    pub fn new(
        config: SinkConfig,
        client: Arc<dyn SinkClient>,
        runtime: Handle,
    ) -> ConfigResult<(Self, StreamEvents)> {
        config.validate()?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let probe_client = client.clone();
        let stream_name = config.stream_name.clone();
        let variant = config.variant;
        runtime.spawn(async move {
            if let Err(err) = check_ready(probe_client.as_ref(), &stream_name, variant).await {
                error!(stream_name = %stream_name, error = %err, "Stream readiness check failed");
                let _ = events_tx.send(err);
            }
        });

        info!(
            stream_name = %config.stream_name,
            variant = %config.variant,
            threshold = config.threshold,
            "Stream adapter created"
        );

        let adapter = Self {
            batcher: Batcher::new(config.stream_name.clone(), config.variant),
            config,
            client,
            buffer: Vec::new(),
            runtime,
        };
        Ok((adapter, StreamEvents { receiver: events_rx }))
    }

    /// Accept one record.
    ///
    /// Flushes once the buffer holds `threshold` records; otherwise the
    /// returned handle is already resolved.
    pub fn write(&mut self, record: impl Into<Record>) -> WriteHandle {
        let record = record.into();
        debug!(kind = record.kind(), buffered = self.buffer.len() + 1, "Record accepted");
        self.buffer.push(record);

        if self.buffer.len() >= self.config.threshold {
            self.flush()
        } else {
            WriteHandle::ready()
        }
    }

    /// Accept a coalesced group of records and flush unconditionally.
    ///
    /// One handle covers the whole group. An empty group on an empty buffer
    /// makes no call.
    pub fn write_batch<I>(&mut self, records: I) -> WriteHandle
    where
        I: IntoIterator,
        I::Item: Into<Record>,
    {
        self.buffer.extend(records.into_iter().map(Into::into));
        self.flush()
    }

    /// Signal end of input: flush whatever is buffered, fire-and-forget.
    ///
    /// The outcome is logged, not returned. The join handle only lets the
    /// caller wait for the dispatched calls to settle before shutting down.
    pub fn end(mut self) -> JoinHandle<()> {
        let records = self.buffer.len();
        let stream_name = self.config.stream_name.clone();
        let handle = self.flush();

        self.runtime.spawn(async move {
            match handle.await {
                Ok(()) => debug!(stream_name = %stream_name, records, "Final flush settled"),
                Err(err) => {
                    error!(stream_name = %stream_name, records, error = %err, "Final flush failed")
                }
            }
        })
    }

    /// Number of records waiting for the next flush.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    /// Drain the buffer into sink calls.
    ///
    /// Calls are spawned back-to-back without waiting on each other. The
    /// handle resolves once all of them have finished, with the first
    /// failure in chunk order.
    fn flush(&mut self) -> WriteHandle {
        let records = std::mem::take(&mut self.buffer);
        if records.is_empty() {
            return WriteHandle::ready();
        }

        let count = records.len();
        let calls = self.batcher.plan(records);
        debug!(
            stream_name = %self.config.stream_name,
            records = count,
            calls = calls.len(),
            "Flushing buffer"
        );

        let tasks: Vec<JoinHandle<SinkResult<()>>> = calls
            .into_iter()
            .map(|call| {
                let client = self.client.clone();
                self.runtime.spawn(async move {
                    match call {
                        SinkCall::One(request) => client.put_one(request).await,
                        SinkCall::Many(request) => client.put_many(request).await,
                    }
                })
            })
            .collect();

        let (tx, rx) = oneshot::channel();
        let stream_name = self.config.stream_name.clone();
        self.runtime.spawn(async move {
            let outcome = settle(&stream_name, tasks).await;
            let _ = tx.send(outcome);
        });

        WriteHandle::pending(rx)
    }
}

impl std::fmt::Debug for StreamAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamAdapter")
            .field("stream_name", &self.config.stream_name)
            .field("variant", &self.config.variant)
            .field("buffered", &self.buffer.len())
            .finish_non_exhaustive()
    }
}

impl Drop for StreamAdapter {
    fn drop(&mut self) {
        if !self.buffer.is_empty() {
            warn!(
                stream_name = %self.config.stream_name,
                records = self.buffer.len(),
                "Stream adapter dropped with unflushed records (call end() to flush)"
            );
        }
    }
}

/// Await every chunk call of one flush, logging each failure.
async fn settle(stream_name: &str, tasks: Vec<JoinHandle<SinkResult<()>>>) -> SinkResult<()> {
    let chunks = tasks.len();
    let mut first_error = None;

    for (chunk, task) in tasks.into_iter().enumerate() {
        let outcome = task.await.map_err(SinkError::from).and_then(|result| result);
        if let Err(err) = outcome {
            warn!(stream_name, chunk, chunks, error = %err, "Sink call failed");
            first_error.get_or_insert(err);
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
