//! Synchronized buffered transport over an async duplex byte stream.
//!
//! [`BufferedTransport`] owns the read and write halves of one connection and
//! a growable read buffer shared by every caller. Two primitives guard it:
//!
//! - a one-shot **ready signal** that fires after construction wiring is done
//!   (or later, when a layered wrapper opens its [`ReadyGate`] itself)
//! - a FIFO **async mutex** around the read cursor, so at most one read is in
//!   flight against the underlying stream at any time
//!
//! Waiters are served in the order they suspended. Dropping a pending read
//! future releases its place in the queue without affecting other callers.
//! A read blocked on a silent peer gives way as soon as the transport is
//! disposed.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{watch, Mutex, MutexGuard};

use crate::error::{ShoutError, ShoutResult};
use crate::protocol_constants::READ_CHUNK_SIZE;

/// Hook run by [`BufferedTransport::dispose`] before any resource is released.
///
/// Layered wrappers use this to flush their own state while the connection is
/// still intact.
#[async_trait]
pub trait DisposeHook: Send + Sync {
    async fn before_dispose(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Pending,
    Open,
    Closed,
}

/// One-shot handle that marks a gated transport as ready for reads.
///
/// Returned by [`BufferedTransport::gated`]. Reads issued before [`open`]
/// suspend until it is called. Dropping the gate without opening it leaves
/// readers suspended until the transport is disposed.
///
/// [`open`]: ReadyGate::open
pub struct ReadyGate {
    ready: Arc<watch::Sender<Readiness>>,
}

impl ReadyGate {
    /// Opens the gate. Has no effect if the transport was already disposed.
    pub fn open(self) {
        let opened = self.ready.send_if_modified(|state| {
            if *state == Readiness::Pending {
                *state = Readiness::Open;
                true
            } else {
                false
            }
        });
        if opened {
            log::trace!("[Transport] Ready gate opened");
        }
    }
}

struct ReadState<R> {
    reader: Option<R>,
    buffer: BytesMut,
    ready: watch::Receiver<Readiness>,
}

impl<R: AsyncRead + Unpin> ReadState<R> {
    /// Reads from the stream until `want` bytes are buffered or EOF.
    /// Returns the number of buffered bytes.
    ///
    /// Fails with [`ShoutError::Disposed`] if the transport closes while
    /// waiting on the stream. `read_buf` is cancel-safe, so nothing already
    /// read is lost.
    async fn fill(&mut self, want: usize) -> ShoutResult<usize> {
        let reader = self.reader.as_mut().ok_or(ShoutError::Disposed)?;
        while self.buffer.len() < want {
            self.buffer.reserve(READ_CHUNK_SIZE.max(want - self.buffer.len()));
            let read = tokio::select! {
                read = reader.read_buf(&mut self.buffer) => read?,
                _ = self.ready.wait_for(|state| *state == Readiness::Closed) => {
                    return Err(ShoutError::Disposed);
                }
            };
            if read == 0 {
                break;
            }
        }
        Ok(self.buffer.len())
    }

    async fn take(&mut self, len: usize) -> ShoutResult<Bytes> {
        let available = self.fill(len).await?;
        if available < len {
            return Err(ShoutError::ConnectionClosed {
                received: available,
            });
        }
        Ok(self.buffer.split_to(len).freeze())
    }

    async fn take_delimited<F>(&mut self, max_len: usize, find_end: F) -> ShoutResult<Bytes>
    where
        F: Fn(&[u8]) -> Option<usize>,
    {
        loop {
            if let Some(end) = find_end(&self.buffer) {
                if end > max_len {
                    return Err(ShoutError::HeaderTooLarge { limit: max_len });
                }
                return Ok(self.buffer.split_to(end).freeze());
            }
            if self.buffer.len() >= max_len {
                return Err(ShoutError::HeaderTooLarge { limit: max_len });
            }

            let before = self.buffer.len();
            if self.fill(before + 1).await? == before {
                return Err(ShoutError::ConnectionClosed { received: before });
            }
        }
    }
}

/// Buffered, read-serialized wrapper around one duplex connection.
pub struct BufferedTransport<S> {
    ready: Arc<watch::Sender<Readiness>>,
    reader: Mutex<ReadState<ReadHalf<S>>>,
    writer: Mutex<Option<WriteHalf<S>>>,
    buffered: AtomicUsize,
    disposed: AtomicBool,
    dispose_hook: parking_lot::Mutex<Option<Arc<dyn DisposeHook>>>,
}

impl<S> BufferedTransport<S>
where
    S: AsyncRead + AsyncWrite + Send,
{
    /// Wraps `stream` and opens the ready gate immediately.
    pub fn new(stream: S) -> Self {
        let (transport, gate) = Self::gated(stream);
        gate.open();
        transport
    }

    /// Wraps `stream` with the ready gate closed.
    ///
    /// Reads suspend until the returned [`ReadyGate`] is opened.
    pub fn gated(stream: S) -> (Self, ReadyGate) {
        let (reader, writer) = tokio::io::split(stream);
        let (ready, _) = watch::channel(Readiness::Pending);
        let ready = Arc::new(ready);

        let transport = Self {
            ready: Arc::clone(&ready),
            reader: Mutex::new(ReadState {
                reader: Some(reader),
                buffer: BytesMut::with_capacity(READ_CHUNK_SIZE),
                ready: ready.subscribe(),
            }),
            writer: Mutex::new(Some(writer)),
            buffered: AtomicUsize::new(0),
            disposed: AtomicBool::new(false),
            dispose_hook: parking_lot::Mutex::new(None),
        };

        (transport, ReadyGate { ready })
    }

    /// Installs the hook run at the start of [`dispose`](Self::dispose).
    pub fn set_dispose_hook(&self, hook: Arc<dyn DisposeHook>) {
        *self.dispose_hook.lock() = Some(hook);
    }

    /// Number of buffered bytes not yet consumed.
    ///
    /// Returns `usize::MAX` while the reader is not established: before the
    /// ready gate opens or after disposal.
    #[must_use]
    pub fn unconsumed_buffer_length(&self) -> usize {
        if *self.ready.borrow() != Readiness::Open {
            return usize::MAX;
        }
        self.buffered.load(Ordering::Acquire)
    }

    /// Returns true once [`dispose`](Self::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    async fn lock_reader(&self) -> ShoutResult<MutexGuard<'_, ReadState<ReadHalf<S>>>> {
        let mut ready = self.ready.subscribe();
        let state = ready
            .wait_for(|state| *state != Readiness::Pending)
            .await
            .map(|state| *state)
            .map_err(|_| ShoutError::Disposed)?;
        if state == Readiness::Closed {
            return Err(ShoutError::Disposed);
        }

        let guard = self.reader.lock().await;
        // Disposal may have closed the gate while this read was queued
        if *self.ready.borrow() == Readiness::Closed {
            return Err(ShoutError::Disposed);
        }
        Ok(guard)
    }

    fn track(&self, state: &ReadState<ReadHalf<S>>) {
        self.buffered.store(state.buffer.len(), Ordering::Release);
    }

    /// Buffers at least `amount` bytes, or as many as arrive before EOF.
    ///
    /// Returns the number of unconsumed bytes now buffered.
    pub async fn load(&self, amount: usize) -> ShoutResult<usize> {
        let mut state = self.lock_reader().await?;
        let result = state.fill(amount).await;
        self.track(&state);
        result
    }

    /// Fills `buf` completely from the stream.
    pub async fn read_bytes(&self, buf: &mut [u8]) -> ShoutResult<()> {
        let mut state = self.lock_reader().await?;
        let result = state.take(buf.len()).await;
        self.track(&state);
        buf.copy_from_slice(&result?);
        Ok(())
    }

    /// Reads exactly `len` bytes and decodes them as UTF-8.
    pub async fn read_string(&self, len: usize) -> ShoutResult<String> {
        let bytes = self.read_buffer(len).await?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ShoutError::InvalidText)
    }

    /// Reads a single byte.
    pub async fn read_byte(&self) -> ShoutResult<u8> {
        let bytes = self.read_buffer(1).await?;
        Ok(bytes[0])
    }

    /// Reads exactly `len` bytes into a new buffer.
    pub async fn read_buffer(&self, len: usize) -> ShoutResult<Bytes> {
        let mut state = self.lock_reader().await?;
        let result = state.take(len).await;
        self.track(&state);
        result
    }

    /// Reads up to and including a delimiter located by `find_end`.
    ///
    /// `find_end` receives the buffered bytes and returns the index one past
    /// the delimiter when present. Bytes after the delimiter stay buffered for
    /// the next read. Fails with [`ShoutError::HeaderTooLarge`] once `max_len`
    /// bytes are buffered without a match.
    pub async fn read_delimited<F>(&self, max_len: usize, find_end: F) -> ShoutResult<Bytes>
    where
        F: Fn(&[u8]) -> Option<usize>,
    {
        let mut state = self.lock_reader().await?;
        let result = state.take_delimited(max_len, find_end).await;
        self.track(&state);
        result
    }

    /// Writes `data` in full and flushes it.
    ///
    /// A write stalled on a peer that stopped reading fails with
    /// [`ShoutError::Disposed`] once the transport is disposed.
    pub async fn write_all(&self, data: &[u8]) -> ShoutResult<()> {
        let mut closed = self.ready.subscribe();
        let mut writer = self.writer.lock().await;
        let writer = writer.as_mut().ok_or(ShoutError::Disposed)?;

        let write = async {
            writer.write_all(data).await?;
            writer.flush().await
        };
        tokio::select! {
            result = write => result.map_err(ShoutError::from),
            _ = closed.wait_for(|state| *state == Readiness::Closed) => Err(ShoutError::Disposed),
        }
    }

    /// Releases the reader, the writer, and the underlying stream, in that order.
    ///
    /// Runs the dispose hook first. Calling this more than once is a no-op.
    /// Closing the gate interrupts an in-flight read or write, so this never
    /// waits on the peer; interrupted and queued operations fail with
    /// [`ShoutError::Disposed`].
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        let hook = self.dispose_hook.lock().take();
        if let Some(hook) = hook {
            hook.before_dispose().await;
        }

        self.ready.send_replace(Readiness::Closed);

        let reader = {
            let mut state = self.reader.lock().await;
            state.buffer.clear();
            self.track(&state);
            state.reader.take()
        };
        drop(reader);

        // The stream itself is freed with the last half, so the writer goes last.
        if let Some(mut writer) = self.writer.lock().await.take() {
            if let Err(e) = writer.shutdown().await {
                log::debug!("[Transport] Writer shutdown failed: {}", e);
            }
            drop(writer);
        }

        log::debug!("[Transport] Disposed");
    }
}
