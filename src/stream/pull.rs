use std::{
    cell::Cell,
    fmt,
    io::IoSlice,
    ops::{BitOr, BitOrAssign},
};

use tracing::{debug, trace, warn};

use super::StreamBuffer;
use crate::error::BufferError;

/************************************ */
/* OPTIONS */
/************************************ */
/// Options of a [`pull`](StreamBuffer::pull) request, combined with `|`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PullOptions(u8);

impl PullOptions {
    /// No option: the request may be suspended.
    pub const NONE: Self = Self(0);
    /// The continuation must run before `pull` returns.
    pub const SYNC: Self = Self(1);
    /// Hint that this is the last pull the caller intends to issue.
    pub const END: Self = Self(1 << 1);

    /// Returns `true` if every option set in `other` is also set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PullOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PullOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for PullOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        if self.contains(Self::SYNC) {
            set.entry(&"SYNC");
        }
        if self.contains(Self::END) {
            set.entry(&"END");
        }
        set.finish()
    }
}

/************************************ */
/* STATUS */
/************************************ */
/// Status handed to a pull continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PullStatus {
    /// More data may follow this batch.
    More,
    /// This batch carries the last unread bytes of an ended stream.
    ///
    /// The status describes what was offered, not what gets completed: a
    /// continuation completing less than [`Done::offered`] leaves the tail
    /// unread and must pull again to send it. The next pull reports `End`
    /// again for the rest.
    End,
    /// The stream has ended and there is nothing left to read. No descriptor
    /// is provided.
    EmptyEnd,
    /// The buffer was cancelled. No descriptor is provided.
    Cancelled,
}

/// What happened to the continuation of a [`pull`](StreamBuffer::pull).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// The continuation ran before `pull` returned.
    Completed,
    /// The continuation is stored and runs on the next `push`, `end` or
    /// `cancel` that makes progress possible.
    Suspended,
}

/************************************ */
/* DONE */
/************************************ */
/// One-shot completion token handed to a pull continuation.
///
/// The continuation reports how many of the offered bytes it actually took
/// with [`complete`](Done::complete); the buffer advances its read cursor by
/// that amount once the continuation returns. A token dropped without being
/// completed counts as `complete(0)`.
#[must_use = "a pull must be completed, even with 0"]
pub struct Done<'a> {
    offered: usize,
    slot: &'a Cell<Option<usize>>,
}

impl Done<'_> {
    /// Total length of the descriptors handed to the continuation.
    pub fn offered(&self) -> usize {
        self.offered
    }

    /// Reports that the first `n` offered bytes were taken.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::CompletionOverrun`] if `n` exceeds
    /// [`offered()`](Self::offered). Nothing is recorded in that case.
    pub fn complete(self, n: usize) -> Result<(), BufferError> {
        if n > self.offered {
            return Err(BufferError::CompletionOverrun {
                offered: self.offered,
                completed: n,
            });
        }
        self.slot.set(Some(n));
        Ok(())
    }
}

impl fmt::Debug for Done<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Done").field("offered", &self.offered).finish()
    }
}

/// A continuation stored by a suspended pull.
pub(super) type Continuation = Box<dyn for<'a> FnOnce(PullStatus, &[IoSlice<'a>], Done<'a>) + Send>;

pub(super) struct PendingPull {
    max_regions: usize,
    continuation: Continuation,
}

impl PendingPull {
    /// Resolves the suspended request with [`PullStatus::Cancelled`].
    pub(super) fn cancel(self) {
        let slot = Cell::new(None);
        (self.continuation)(PullStatus::Cancelled, &[], Done { offered: 0, slot: &slot });
    }
}

/************************************ */
/* PULL */
/************************************ */
impl StreamBuffer {
    /// Hands the next unread bytes to `continuation` as zero-copy descriptors.
    ///
    /// Up to `max_regions` [`IoSlice`]s are built starting at the read cursor,
    /// spanning chunk boundaries; a `max_regions` of 0 is treated as 1. The
    /// continuation receives a [`PullStatus`], the descriptors, and a [`Done`]
    /// token to report how many bytes it took. The descriptors borrow the
    /// buffer and cannot outlive the continuation.
    ///
    /// When there is no unread data and the stream has not ended:
    /// - with [`PullOptions::SYNC`], `pull` fails with
    ///   [`BufferError::WouldBlock`] and drops the continuation;
    /// - otherwise the request is suspended and resumed by the next
    ///   [`push`](Self::push) or [`end`](Self::end), or resolved by
    ///   [`cancel`](Self::cancel).
    ///
    /// On a cancelled buffer the continuation runs immediately with
    /// [`PullStatus::Cancelled`].
    ///
    /// # Errors
    ///
    /// - [`BufferError::WouldBlock`] as described above.
    /// - [`BufferError::PullPending`] if a suspended request already exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use ackbuf::{PullOptions, PullOutcome, PullStatus, StreamBuffer};
    ///
    /// let mut buffer = StreamBuffer::new();
    /// buffer.push([vec![0u8; 100]], None).unwrap();
    /// buffer.end();
    ///
    /// let outcome = buffer
    ///     .pull(PullOptions::SYNC | PullOptions::END, 2, |status, slices, done| {
    ///         assert_eq!(status, PullStatus::End);
    ///         assert_eq!(slices.len(), 1);
    ///         done.complete(slices[0].len()).unwrap();
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(outcome, PullOutcome::Completed);
    /// assert_eq!(buffer.remaining(), 0);
    /// ```
    pub fn pull<F>(
        &mut self,
        options: PullOptions,
        max_regions: usize,
        continuation: F,
    ) -> Result<PullOutcome, BufferError>
    where
        F: for<'a> FnOnce(PullStatus, &[IoSlice<'a>], Done<'a>) + Send + 'static,
    {
        if self.cancelled {
            let slot = Cell::new(None);
            continuation(PullStatus::Cancelled, &[], Done { offered: 0, slot: &slot });
            return Ok(PullOutcome::Completed);
        }
        if self.pending.is_some() {
            return Err(BufferError::PullPending);
        }
        if options.contains(PullOptions::END) && !self.ended {
            debug!(id = self.config.id, remaining = self.remaining(), "END pull on open stream");
        }

        let max_regions = max_regions.max(1);
        if self.remaining() == 0 && !self.ended {
            if options.contains(PullOptions::SYNC) {
                return Err(BufferError::WouldBlock);
            }
            trace!(id = self.config.id, "pull suspended");
            self.pending = Some(PendingPull {
                max_regions,
                continuation: Box::new(continuation),
            });
            return Ok(PullOutcome::Suspended);
        }

        self.deliver(max_regions, continuation);
        Ok(PullOutcome::Completed)
    }

    /// Same as [`pull`](Self::pull), capped by the configured
    /// [`max_regions`](crate::StreamBufferBuilder::max_regions).
    pub fn pull_default<F>(&mut self, options: PullOptions, continuation: F) -> Result<PullOutcome, BufferError>
    where
        F: for<'a> FnOnce(PullStatus, &[IoSlice<'a>], Done<'a>) + Send + 'static,
    {
        self.pull(options, self.config.max_regions, continuation)
    }

    /// Runs a stored continuation if data or end of stream is now available.
    pub(super) fn resume(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if self.remaining() == 0 && !self.ended {
            self.pending = Some(pending);
            return;
        }
        trace!(id = self.config.id, remaining = self.remaining(), "pull resumed");
        self.deliver(pending.max_regions, pending.continuation);
    }

    fn deliver<F>(&mut self, max_regions: usize, continuation: F)
    where
        F: for<'a> FnOnce(PullStatus, &[IoSlice<'a>], Done<'a>),
    {
        let slot = Cell::new(None);
        let offered = {
            let slices: Vec<IoSlice<'_>> = self
                .queue
                .range(self.read_index..)
                .take(max_regions)
                .map(|chunk| IoSlice::new(chunk.slice_from(self.read)))
                .collect();
            let offered: usize = slices.iter().map(|s| s.len()).sum();

            let status = if offered == 0 {
                PullStatus::EmptyEnd
            } else if self.ended && offered as u64 == self.remaining() {
                PullStatus::End
            } else {
                PullStatus::More
            };
            trace!(id = self.config.id, ?status, regions = slices.len(), offered, "pull");

            continuation(status, &slices, Done { offered, slot: &slot });
            offered
        };

        match slot.get() {
            Some(n) => {
                self.seek(n as u64);
            }
            None => warn!(id = self.config.id, offered, "pull continuation did not complete"),
        }
    }
}
