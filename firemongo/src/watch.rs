//! Change-stream normalization and background dispatch.
//!
//! This module backs the `watch`/`on_change`/`on_snapshot` entry points on
//! [`MongoCollection`](crate::collection::MongoCollection) and
//! [`MongoReference`](crate::reference::MongoReference):
//!
//! - [`normalize`] reduces a raw driver change event to the (documents, metadata,
//!   read time) triple handed to snapshot callbacks
//! - the dispatch loop pulls events from a change stream on a background Tokio task
//!   and delivers them, strictly in stream order, to one callback
//! - [`Subscription`] is the handle returned by callback registration; it can cancel
//!   the loop (closing the underlying stream) or wait for it to finish
//!
//! Driver faults on the stream are terminal for the subscription: they are logged
//! through the `log` facade and end the background task. No reconnection is attempted,
//! and errors are never surfaced through the callback itself.

use std::sync::Arc;

use bson::{Document, Timestamp};
use futures::{Stream, StreamExt};
use log::{debug, error};
use mongodb::change_stream::event::{ChangeNamespace, ChangeStreamEvent, OperationType};
use tokio::{sync::Notify, task::JoinHandle};

/// The metadata of one change event, reduced to exactly the fields snapshot
/// callbacks receive.
///
/// Optional fields on the raw event (such as the update description) are deliberately
/// dropped, not forwarded. Subscribers that need them should use the raw event via
/// `on_change` or iterate the stream themselves.
#[derive(Debug)]
pub struct ChangeMeta {
    /// The key of the changed document; empty when the driver omits it.
    pub document_key: Document,
    /// What happened to the document (insert, update, delete, ...).
    pub operation_type: OperationType,
    /// The database and collection the change belongs to.
    pub ns: Option<ChangeNamespace>,
}

/// Reduces a raw change event to the triple handed to snapshot callbacks.
///
/// The returned document vector always has length exactly 1: the event's full document
/// when the driver supplied one, otherwise an empty document. Consumers rely on the
/// wrapping, so "document present but empty" and "document absent" are distinguished
/// only by the sentinel, never by vector length. The read time is the event's cluster
/// timestamp when present.
pub fn normalize(
    event: ChangeStreamEvent<Document>,
) -> (Vec<Document>, ChangeMeta, Option<Timestamp>) {
    let documents = vec![event.full_document.unwrap_or_default()];
    let meta = ChangeMeta {
        document_key: event.document_key.unwrap_or_default(),
        operation_type: event.operation_type,
        ns: event.ns,
    };

    (documents, meta, event.cluster_time)
}

/// Handle to one callback-based change subscription.
///
/// Each registration spawns one background task; this handle owns it. [`cancel`](Self::cancel)
/// stops the loop and drops the underlying stream, which closes it. Dropping the handle
/// instead detaches the task: it keeps running until the stream is exhausted, closed
/// from the server side, or fails.
#[derive(Debug)]
pub struct Subscription {
    stop: Arc<Notify>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Cancels the subscription and waits for the background task to finish.
    ///
    /// Any event already pulled from the stream is still delivered before the loop
    /// stops.
    pub async fn cancel(self) {
        self.stop.notify_one();
        let _ = self.task.await;
    }

    /// Waits for the subscription to terminate on its own (stream exhaustion or
    /// driver fault).
    pub async fn join(self) {
        let _ = self.task.await;
    }

    /// Returns whether the background task has terminated.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns the dispatch loop for a raw-event callback.
///
/// Events are delivered one at a time, in stream order, to the same callback; the loop
/// ends on cancellation, stream exhaustion, or the first driver fault.
pub(crate) fn spawn<S, F>(mut stream: S, mut deliver: F) -> Subscription
where
    S: Stream<Item = Result<ChangeStreamEvent<Document>, mongodb::error::Error>>
        + Send
        + Unpin
        + 'static,
    F: FnMut(ChangeStreamEvent<Document>) + Send + 'static,
{
    let stop = Arc::new(Notify::new());
    let stopped = stop.clone();
    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stopped.notified() => {
                    debug!("change subscription cancelled");
                    break;
                }
                next = stream.next() => match next {
                    Some(Ok(event)) => deliver(event),
                    Some(Err(err)) => {
                        error!("change stream terminated: {err}");
                        break;
                    }
                    None => {
                        debug!("change stream exhausted");
                        break;
                    }
                },
            }
        }
    });

    Subscription { stop, task }
}

/// Spawns the dispatch loop for a normalized snapshot callback.
pub(crate) fn spawn_snapshot<S, F>(stream: S, mut deliver: F) -> Subscription
where
    S: Stream<Item = Result<ChangeStreamEvent<Document>, mongodb::error::Error>>
        + Send
        + Unpin
        + 'static,
    F: FnMut(Vec<Document>, ChangeMeta, Option<Timestamp>) + Send + 'static,
{
    spawn(stream, move |event| {
        let (documents, meta, read_time) = normalize(event);
        deliver(documents, meta, read_time);
    })
}
