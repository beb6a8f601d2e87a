//! Dedicated reader/writer tasks.
//!
//! Interceptors that stream a body hand the production (or consumption)
//! side to its own task so other calls proceed independently. The channel
//! is closed from the task's outcome: gracefully on success, with the
//! task's error as cause on failure, and with a cancellation cause if the
//! task is aborted mid-stream.

use crate::base::error::PipeError;
use crate::channel::bytechannel::{byte_channel, ByteReadChannel, ByteWriteChannel, CloseHandle};
use std::future::Future;
use tokio::task::JoinHandle;

/// Closes the channel when dropped, so an aborted task still signals its
/// peer.
struct CloseGuard {
    handle: CloseHandle,
    cause: Option<PipeError>,
}

impl Drop for CloseGuard {
    fn drop(&mut self) {
        self.handle.close(self.cause.take());
    }
}

/// Spawn a task producing bytes into a fresh channel.
///
/// Returns the read half and the task handle. `produce` owns the write
/// half; when it returns `Ok` the channel closes gracefully, when it
/// returns `Err` the channel closes with that error as cause, and when
/// the task is aborted the channel closes with
/// [`PipeError::CallCancelled`].
pub fn writer<F, Fut>(
    capacity: usize,
    produce: F,
) -> (ByteReadChannel, JoinHandle<Result<(), PipeError>>)
where
    F: FnOnce(ByteWriteChannel) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), PipeError>> + Send + 'static,
{
    let (mut tx, rx) = byte_channel(capacity);
    tx.disarm();
    let mut guard = CloseGuard {
        handle: tx.shared_close_handle(),
        cause: Some(PipeError::CallCancelled),
    };
    let task = tokio::spawn(async move {
        let result = produce(tx).await;
        guard.cause = match &result {
            Ok(()) => None,
            Err(e) => {
                tracing::debug!(error = %e, "writer task failed");
                Some(e.clone())
            }
        };
        drop(guard);
        result
    });
    (rx, task)
}

/// Spawn a task consuming bytes from a fresh channel.
///
/// The dual of [`writer`]: returns the write half and the task handle,
/// with the same close-from-outcome semantics (a consumer failure fails
/// the producer's writes with that cause).
pub fn reader<F, Fut>(
    capacity: usize,
    consume: F,
) -> (ByteWriteChannel, JoinHandle<Result<(), PipeError>>)
where
    F: FnOnce(ByteReadChannel) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), PipeError>> + Send + 'static,
{
    let (tx, mut rx) = byte_channel(capacity);
    rx.disarm();
    let mut guard = CloseGuard {
        handle: rx.shared_close_handle(),
        cause: Some(PipeError::CallCancelled),
    };
    let task = tokio::spawn(async move {
        let result = consume(rx).await;
        guard.cause = match &result {
            Ok(()) => None,
            Err(e) => {
                tracing::debug!(error = %e, "reader task failed");
                Some(e.clone())
            }
        };
        drop(guard);
        result
    });
    (tx, task)
}
