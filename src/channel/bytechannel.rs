//! Suspending byte channel.
//!
//! A bounded single-producer/single-consumer byte buffer connecting
//! interceptor stages to each other and to the transport layer. Writers
//! suspend when the buffer is full, readers when it is empty; a close can
//! carry a cause that pending and future operations observe instead of
//! end-of-stream.

use crate::base::error::PipeError;
use crate::channel::suspension::Suspension;
use bytes::{Bytes, BytesMut};
use std::sync::{Arc, Mutex};

struct Inner {
    buffer: BytesMut,
    /// Bytes at `buffer[..flushed]` are visible to the reader.
    flushed: usize,
    capacity: usize,
    closed_write: bool,
    cause: Option<PipeError>,
}

struct Shared {
    inner: Mutex<Inner>,
    /// Parks the reader while the channel is empty.
    read_waiter: Suspension,
    /// Parks the writer while the channel is full.
    write_waiter: Suspension,
}

impl Shared {
    /// Terminal close for both ends. The first close wins; later closes
    /// are no-ops.
    fn close_with(&self, cause: Option<PipeError>) {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.closed_write {
                return;
            }
            inner.closed_write = true;
            match &cause {
                Some(cause) => {
                    // A cause close discards buffered bytes: every
                    // subsequent operation fails instead of draining.
                    inner.cause = Some(cause.clone());
                    inner.buffer.clear();
                    inner.flushed = 0;
                }
                None => {
                    // Graceful close flushes, letting the reader drain.
                    inner.flushed = inner.buffer.len();
                }
            }
        }
        if let Some(cause) = &cause {
            tracing::debug!(cause = %cause, "byte channel closed with cause");
        }
        self.read_waiter.close(cause.clone());
        self.write_waiter
            .close(Some(cause.unwrap_or(PipeError::ChannelClosedForWrite)));
    }
}

/// Create a bounded byte channel, returning its write and read halves.
///
/// `capacity` bounds the bytes buffered (staged plus flushed); a writer
/// suspends once it is reached until the reader drains. Exactly one half
/// of each kind exists, so concurrent writers or readers are
/// unrepresentable.
///
/// # Panics
///
/// Panics if `capacity` is 0.
pub fn byte_channel(capacity: usize) -> (ByteWriteChannel, ByteReadChannel) {
    assert!(capacity > 0, "byte channel capacity must be non-zero");
    let shared = Arc::new(Shared {
        inner: Mutex::new(Inner {
            buffer: BytesMut::with_capacity(capacity),
            flushed: 0,
            capacity,
            closed_write: false,
            cause: None,
        }),
        read_waiter: Suspension::new(),
        write_waiter: Suspension::new(),
    });
    (
        ByteWriteChannel {
            shared: Arc::clone(&shared),
            armed: true,
        },
        ByteReadChannel {
            shared,
            armed: true,
        },
    )
}

/// Write half of a byte channel.
///
/// Dropping it closes the channel gracefully.
pub struct ByteWriteChannel {
    shared: Arc<Shared>,
    armed: bool,
}

impl ByteWriteChannel {
    /// Copy as many bytes as currently fit, suspending only while the
    /// buffer is full.
    ///
    /// Returns the number of bytes accepted (at least 1 for non-empty
    /// input; 0 only for empty input). Written bytes become visible to
    /// the reader on [`flush`](Self::flush), on close, or implicitly when
    /// the buffer reaches capacity.
    pub async fn write_available(&mut self, src: &[u8]) -> Result<usize, PipeError> {
        if src.is_empty() {
            return Ok(0);
        }
        loop {
            let accepted = {
                let mut inner = self.shared.inner.lock().unwrap();
                if inner.closed_write {
                    return Err(inner
                        .cause
                        .clone()
                        .unwrap_or(PipeError::ChannelClosedForWrite));
                }
                let available = inner.capacity.saturating_sub(inner.buffer.len());
                if available == 0 {
                    // Flush before parking so the reader can always free
                    // capacity.
                    inner.flushed = inner.buffer.len();
                    None
                } else {
                    let n = available.min(src.len());
                    inner.buffer.extend_from_slice(&src[..n]);
                    let hit_capacity = inner.buffer.len() >= inner.capacity;
                    if hit_capacity {
                        inner.flushed = inner.buffer.len();
                    }
                    Some((n, hit_capacity))
                }
            };
            match accepted {
                Some((n, hit_capacity)) => {
                    if hit_capacity {
                        self.shared.read_waiter.resume();
                    }
                    return Ok(n);
                }
                None => {
                    self.shared.read_waiter.resume();
                    self.shared.write_waiter.suspend().await?;
                }
            }
        }
    }

    /// Write all of `src`, suspending as often as needed.
    ///
    /// Fails with the close cause if the channel closes for write before
    /// every byte is accepted.
    pub async fn write_fully(&mut self, src: &[u8]) -> Result<(), PipeError> {
        let mut written = 0;
        while written < src.len() {
            written += self.write_available(&src[written..]).await?;
        }
        Ok(())
    }

    /// Make previously written bytes visible to the reader. Never
    /// suspends.
    pub fn flush(&mut self) {
        {
            let mut inner = self.shared.inner.lock().unwrap();
            inner.flushed = inner.buffer.len();
        }
        self.shared.read_waiter.resume();
    }

    /// Close both ends.
    ///
    /// With `None`, buffered bytes remain readable until drained and the
    /// reader then sees end-of-stream. With a cause, buffered bytes are
    /// discarded and pending and future operations on either end fail
    /// with that cause.
    pub fn close(&mut self, cause: Option<PipeError>) {
        self.armed = false;
        self.shared.close_with(cause);
    }

    pub fn is_closed_for_write(&self) -> bool {
        self.shared.inner.lock().unwrap().closed_write
    }

    /// Disable the graceful close-on-drop, leaving the close decision to
    /// a task wrapper (see [`crate::channel::tasks`]).
    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }

    pub(crate) fn shared_close_handle(&self) -> CloseHandle {
        CloseHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for ByteWriteChannel {
    fn drop(&mut self) {
        if self.armed {
            self.shared.close_with(None);
        }
    }
}

impl std::fmt::Debug for ByteWriteChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.inner.lock().unwrap();
        f.debug_struct("ByteWriteChannel")
            .field("buffered", &inner.buffer.len())
            .field("closed", &inner.closed_write)
            .finish()
    }
}

/// Read half of a byte channel.
///
/// Dropping it cancels the channel so a live writer does not park
/// forever.
pub struct ByteReadChannel {
    shared: Arc<Shared>,
    armed: bool,
}

impl ByteReadChannel {
    /// Copy up to `dst.len()` flushed bytes into `dst`.
    ///
    /// Returns `Some(n)` with `n >= 1` once data is available (suspending
    /// until then), `Some(0)` only for an empty `dst`, and `None` once
    /// the channel is closed and fully drained. A cause close fails with
    /// the cause instead of returning `None`.
    pub async fn read_available(&mut self, dst: &mut [u8]) -> Result<Option<usize>, PipeError> {
        if dst.is_empty() {
            return Ok(Some(0));
        }
        loop {
            let taken = {
                let mut inner = self.shared.inner.lock().unwrap();
                if let Some(cause) = &inner.cause {
                    return Err(cause.clone());
                }
                if inner.flushed > 0 {
                    let n = inner.flushed.min(dst.len());
                    let chunk = inner.buffer.split_to(n);
                    dst[..n].copy_from_slice(&chunk);
                    inner.flushed -= n;
                    Some(n)
                } else if inner.closed_write {
                    return Ok(None);
                } else {
                    None
                }
            };
            match taken {
                Some(n) => {
                    self.shared.write_waiter.resume();
                    return Ok(Some(n));
                }
                None => self.shared.read_waiter.suspend().await?,
            }
        }
    }

    /// Read exactly `dst.len()` bytes.
    ///
    /// Fails with [`PipeError::UnexpectedEndOfStream`] if the channel
    /// closes gracefully first, or with the close cause.
    pub async fn read_fully(&mut self, dst: &mut [u8]) -> Result<(), PipeError> {
        let mut filled = 0;
        while filled < dst.len() {
            match self.read_available(&mut dst[filled..]).await? {
                Some(n) => filled += n,
                None => {
                    return Err(PipeError::UnexpectedEndOfStream {
                        expected: dst.len() - filled,
                    })
                }
            }
        }
        Ok(())
    }

    /// Read everything up to the graceful close.
    pub async fn read_remaining(&mut self) -> Result<Bytes, PipeError> {
        let mut out = BytesMut::new();
        let mut chunk = [0u8; 4096];
        loop {
            match self.read_available(&mut chunk).await? {
                Some(n) => out.extend_from_slice(&chunk[..n]),
                None => return Ok(out.freeze()),
            }
        }
    }

    /// Ungraceful close: discard unread bytes and fail pending
    /// operations right away.
    ///
    /// Uses [`PipeError::ChannelCancelled`] when no cause is given.
    pub fn cancel(&mut self, cause: Option<PipeError>) {
        self.armed = false;
        self.shared
            .close_with(Some(cause.unwrap_or(PipeError::ChannelCancelled)));
    }

    /// Flushed bytes ready for reading, without suspending.
    pub fn available_for_read(&self) -> usize {
        self.shared.inner.lock().unwrap().flushed
    }

    pub fn is_closed_for_read(&self) -> bool {
        let inner = self.shared.inner.lock().unwrap();
        inner.closed_write && inner.flushed == 0
    }

    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }

    pub(crate) fn shared_close_handle(&self) -> CloseHandle {
        CloseHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for ByteReadChannel {
    fn drop(&mut self) {
        if self.armed {
            self.shared.close_with(Some(PipeError::ChannelCancelled));
        }
    }
}

impl std::fmt::Debug for ByteReadChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.inner.lock().unwrap();
        f.debug_struct("ByteReadChannel")
            .field("available", &inner.flushed)
            .field("closed", &inner.closed_write)
            .finish()
    }
}

/// Close authority detached from either half, used by task wrappers to
/// attach a completion cause after the half itself is gone.
pub(crate) struct CloseHandle {
    shared: Arc<Shared>,
}

impl CloseHandle {
    pub(crate) fn close(&self, cause: Option<PipeError>) {
        self.shared.close_with(cause);
    }
}

/// Stream `src` into `dst` until end-of-stream, then close `dst`.
///
/// Returns the number of bytes copied. A cause observed on either side is
/// propagated to the other before returning it.
pub async fn copy_and_close(
    src: &mut ByteReadChannel,
    dst: &mut ByteWriteChannel,
) -> Result<u64, PipeError> {
    let mut buf = [0u8; 4096];
    let mut total = 0u64;
    loop {
        match src.read_available(&mut buf).await {
            Ok(Some(n)) => {
                if let Err(e) = dst.write_fully(&buf[..n]).await {
                    src.cancel(Some(e.clone()));
                    return Err(e);
                }
                total += n as u64;
            }
            Ok(None) => {
                dst.close(None);
                return Ok(total);
            }
            Err(e) => {
                dst.close(Some(e.clone()));
                return Err(e);
            }
        }
    }
}
