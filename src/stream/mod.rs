//! Outbound stream buffer with independent read and acknowledgement cursors.
//!
//! A [`StreamBuffer`] tracks three monotonic positions in the byte stream:
//!
//! ```text
//!   consumed              read                         pushed
//!      |                    |                             |
//!      ▼                    ▼                             ▼
//! ─────┬────────────────────┬─────────────────────────────┐
//!  ... │  in flight (sent,  │  unread (not yet handed to  │ ← push
//!      │  not acknowledged) │  the transport)             │
//! ─────┴────────────────────┴─────────────────────────────┘
//!      ◄──────────────────── length() ───────────────────►
//!                           ◄──────── remaining() ───────►
//! ```
//!
//! Bytes move from right to left: [`push`](StreamBuffer::push) extends the
//! stream, [`seek`](StreamBuffer::seek) and [`pull`](StreamBuffer::pull) move
//! the read cursor, and [`consume`](StreamBuffer::consume) moves the consumed
//! cursor, evicting every chunk that is now fully acknowledged.
use std::{collections::VecDeque, fmt, mem, sync::Arc};

use tracing::{debug, trace};

use crate::{
    buffers::{Chunk, Region},
    error::BufferError,
    sync::{Notifier, Status},
};

mod builder;
mod pull;

pub use builder::StreamBufferBuilder;
use builder::Config;
use pull::PendingPull;
pub use pull::{Done, PullOptions, PullOutcome, PullStatus};

/// Counters describing the activity of a [`StreamBuffer`].
#[cfg(feature = "stats")]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BufferStats {
    /// Number of chunks (non-empty regions) accepted by `push`.
    pub chunks_pushed: u64,
    /// Number of chunks released, either acknowledged or cancelled.
    pub chunks_evicted: u64,
    /// Number of submission notifiers fired.
    pub notified: u64,
}

/// A chunked outbound byte buffer for one reliable stream.
///
/// The application pushes owned [`Region`]s; the transport reads them either
/// by copying ([`seek`](Self::seek)) or through zero-copy vectored
/// descriptors ([`pull`](Self::pull)); acknowledgements
/// ([`consume`](Self::consume)) release memory and fire the submission
/// [`Notifier`]s in submission order.
///
/// All operations take `&mut self`: the buffer has no internal locking and
/// must be driven from a single task, or wrapped by the caller.
///
/// Dropping a buffer that still holds data behaves like
/// [`cancel()`](Self::cancel).
///
/// # Examples
///
/// ```
/// use ackbuf::{Notifier, Status, StreamBuffer};
///
/// #[tokio::main]
/// async fn main() {
///     let mut buffer = StreamBuffer::new();
///
///     // Two regions, one submission, one notifier
///     let (notifier, acked) = Notifier::channel();
///     buffer.push([vec![0u8; 50], vec![1u8; 50]], Some(notifier)).unwrap();
///     assert_eq!(buffer.length(), 100);
///
///     // The transport sends everything, then receives acknowledgements
///     assert_eq!(buffer.seek(100), 100);
///     assert_eq!(buffer.consume(60), 60);
///     assert_eq!(buffer.length(), 40);
///     assert_eq!(buffer.consume(40), 40);
///
///     assert_eq!(acked.await.unwrap(), Status::Ok);
/// }
/// ```
pub struct StreamBuffer {
    config: Config,
    queue: VecDeque<Chunk>,
    /// Index in `queue` of the first chunk ending past `read`.
    read_index: usize,
    pushed: u64,
    read: u64,
    consumed: u64,
    ended: bool,
    cancelled: bool,
    pending: Option<PendingPull>,
    #[cfg(feature = "stats")]
    stats: BufferStats,
}

impl StreamBuffer {
    /// Creates an empty buffer with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Returns a builder to configure a new buffer.
    #[must_use]
    pub fn builder() -> StreamBufferBuilder {
        StreamBufferBuilder::new()
    }

    fn with_config(config: Config) -> Self {
        Self {
            queue: VecDeque::with_capacity(config.capacity),
            config,
            read_index: 0,
            pushed: 0,
            read: 0,
            consumed: 0,
            ended: false,
            cancelled: false,
            pending: None,
            #[cfg(feature = "stats")]
            stats: BufferStats::default(),
        }
    }

    /// Identifier of this buffer, as configured with
    /// [`StreamBufferBuilder::id`].
    pub fn id(&self) -> u64 {
        self.config.id
    }

    /// Bytes held in memory and not yet acknowledged.
    pub fn length(&self) -> u64 {
        self.pushed - self.consumed
    }

    /// Bytes not yet handed to the transport.
    pub fn remaining(&self) -> u64 {
        self.pushed - self.read
    }

    /// Returns `true` once [`end()`](Self::end) has been called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Returns `true` once [`cancel()`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Returns `true` while a pull request is suspended waiting for data.
    pub fn is_pull_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Retrieves the activity counters of this buffer.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> BufferStats {
        self.stats
    }

    /// Appends a submission made of one or more regions.
    ///
    /// The regions are moved into the buffer, never copied. Empty regions are
    /// skipped. The optional `notifier` is shared by every region of the
    /// submission and fires once: when the last of them is evicted, or on
    /// cancellation. A submission contributing no bytes fires its notifier
    /// immediately with [`Status::Ok`].
    ///
    /// A suspended pull is resumed before this method returns.
    ///
    /// # Errors
    ///
    /// - [`BufferError::AlreadyCancelled`] if the buffer was cancelled.
    /// - [`BufferError::AlreadyEnded`] if [`end()`](Self::end) was called.
    ///
    /// On error the regions and the notifier are dropped; the notifier then
    /// reports [`Status::Cancelled`].
    pub fn push<I, R>(&mut self, regions: I, notifier: Option<Notifier>) -> Result<(), BufferError>
    where
        I: IntoIterator<Item = R>,
        R: Into<Region>,
    {
        if self.cancelled {
            return Err(BufferError::AlreadyCancelled);
        }
        if self.ended {
            return Err(BufferError::AlreadyEnded);
        }

        let notifier = notifier.map(Arc::new);
        let start = self.pushed;
        for region in regions.into_iter().map(Into::into) {
            if region.is_empty() {
                continue;
            }
            let chunk = Chunk::new(region, self.pushed, notifier.clone());
            self.pushed += chunk.len();
            self.queue.push_back(chunk);
            #[cfg(feature = "stats")]
            {
                self.stats.chunks_pushed += 1;
            }
        }
        trace!(id = self.config.id, start, len = self.pushed - start, "push");

        // Only the local reference is left when no chunk was queued
        if let Some(notifier) = notifier.and_then(Arc::into_inner) {
            notifier.notify(Status::Ok);
            #[cfg(feature = "stats")]
            {
                self.stats.notified += 1;
            }
        }

        if self.pushed > start {
            self.resume();
        }
        Ok(())
    }

    /// Marks that no further submission will be pushed.
    ///
    /// Once every pushed byte has been read, pulls report
    /// [`PullStatus::End`] or [`PullStatus::EmptyEnd`]. A suspended pull is
    /// resumed before this method returns. Calling `end` more than once, or
    /// after [`cancel()`](Self::cancel), has no effect.
    pub fn end(&mut self) {
        if self.cancelled || self.ended {
            return;
        }
        self.ended = true;
        debug!(id = self.config.id, pushed = self.pushed, "end of stream");
        self.resume();
    }

    /// Advances the read cursor by up to `amount` bytes.
    ///
    /// Used when the transport consumed data outside of [`pull`](Self::pull),
    /// e.g. by copying it. Returns the number of bytes actually advanced,
    /// which is less than `amount` if fewer bytes are unread. Never evicts.
    pub fn seek(&mut self, amount: u64) -> u64 {
        let amount = amount.min(self.remaining());
        self.read += amount;
        while self.queue.get(self.read_index).is_some_and(|c| c.end() <= self.read) {
            self.read_index += 1;
        }
        trace!(id = self.config.id, amount, read = self.read, "seek");
        amount
    }

    /// Acknowledges up to `amount` bytes as delivered.
    ///
    /// Acknowledgement cannot outrun the read cursor: the consumed cursor
    /// advances by `min(amount, read - consumed)` and the actual amount is
    /// returned. Every chunk now fully acknowledged is evicted in FIFO order,
    /// releasing its memory and firing its submission notifier with
    /// [`Status::Ok`] if it was the last chunk of that submission.
    pub fn consume(&mut self, amount: u64) -> u64 {
        let amount = amount.min(self.read - self.consumed);
        self.consumed += amount;
        trace!(id = self.config.id, amount, consumed = self.consumed, "consume");

        while self.queue.front().is_some_and(|c| c.end() <= self.consumed) {
            let Some(chunk) = self.queue.pop_front() else {
                break;
            };
            // Evicted chunks end at or before `read`, hence before `read_index`
            debug_assert!(self.read_index > 0);
            self.read_index -= 1;
            trace!(id = self.config.id, start = chunk.start(), len = chunk.len(), "evict");
            self.release(chunk, Status::Ok);
        }
        amount
    }

    /// Cancels the stream.
    ///
    /// Every queued chunk is released in FIFO order and every submission
    /// notifier still outstanding fires exactly once with
    /// [`Status::Cancelled`]. A suspended pull is resolved with
    /// [`PullStatus::Cancelled`]. Afterwards `length()` and `remaining()` are
    /// 0 and every push fails with [`BufferError::AlreadyCancelled`].
    /// Cancelling twice has no effect.
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        debug!(
            id = self.config.id,
            length = self.length(),
            chunks = self.queue.len(),
            "cancel"
        );

        while let Some(chunk) = self.queue.pop_front() {
            self.release(chunk, Status::Cancelled);
        }
        self.read_index = 0;
        self.read = self.pushed;
        self.consumed = self.pushed;

        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
    }

    /// Moves the content of this buffer into a new one.
    ///
    /// Queue, cursors, flags and any suspended pull are transferred; `self`
    /// becomes an empty buffer with the same configuration. No notifier fires.
    ///
    /// # Examples
    ///
    /// ```
    /// use ackbuf::StreamBuffer;
    ///
    /// let mut a = StreamBuffer::new();
    /// a.push([vec![0u8; 100]], None).unwrap();
    ///
    /// let b = a.take();
    /// assert_eq!(a.length(), 0);
    /// assert_eq!(b.length(), 100);
    /// ```
    #[must_use]
    pub fn take(&mut self) -> StreamBuffer {
        let fresh = Self::with_config(self.config.clone());
        mem::replace(self, fresh)
    }

    fn release(&mut self, chunk: Chunk, status: Status) {
        let notified = chunk.release(status);
        #[cfg(feature = "stats")]
        {
            self.stats.chunks_evicted += 1;
            if notified {
                self.stats.notified += 1;
            }
        }
        if notified {
            trace!(id = self.config.id, %status, "notify");
        }
    }
}

impl Default for StreamBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StreamBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamBuffer")
            .field("id", &self.config.id)
            .field("chunks", &self.queue.len())
            .field("pushed", &self.pushed)
            .field("read", &self.read)
            .field("consumed", &self.consumed)
            .field("ended", &self.ended)
            .field("cancelled", &self.cancelled)
            .field("pending", &self.pending.is_some())
            .finish()
    }
}

impl Drop for StreamBuffer {
    fn drop(&mut self) {
        if !self.queue.is_empty() || self.pending.is_some() {
            self.cancel();
        }
    }
}
