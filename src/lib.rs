//! Ackbuf: a chunked, cursor-based outbound stream buffer with zero-copy
//! vectored reads and acknowledgement-driven completion.
//!
//! Ackbuf is the byte custody layer of a reliable stream transport (e.g. a
//! QUIC-like protocol stack). It accumulates application submissions, hands
//! them to the protocol engine without copying, and keeps every byte alive
//! until the engine confirms delivery. Only then is memory released and the
//! submission's completion notifier fired.
//!
//! # Overview
//!
//! The diagram below follows three submissions (*S1*, *S2*, *S3*) through a
//! [`StreamBuffer`].
//!
//! ```text
//!                                                               .....
//!  APPLICATION PUSH                                     User code   :
//! ┌────────────────────┐  ┌──────────┐  ┌──────────────┐            :
//! │  S1 = [A1, A2]     │  │ S2 = [B] │  │ S3 = [C1,C2] │            :
//! └─────────┬──────────┘  └────┬─────┘  └──────┬───────┘            :
//!           ▼                  ▼               ▼                    :
//! ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~  :
//!  STREAM BUFFER                              Ackbuf code           :
//! ┌──────────────────────────────────────────────────────────────┐  :
//! │  Queue:   [A1][A2][B][C1][C2]                                │  :
//! │                                                              │  :
//! │           consumed       read                    pushed      │  :
//! │               ▼            ▼                        ▼        │  :
//! │  Stream:  ....[A1 A2 B ....][C1 C2 ..................]       │  :
//! │               └ in flight ─┘└──── unread ───────────┘        │  :
//! └───────┬───────────────────────────────────────▲──────────────┘  :
//!         │ pull / seek                           │ consume         :
//!         ▼                                       │               .....
//! ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~  :
//!  PROTOCOL ENGINE                                   User code      :
//! ┌──────────────────────────────────────────────────────────────┐  :
//! │  Packetize, encrypt, send, retransmit, receive ACKs          │  :
//! └──────────────────────────────────────────────────────────────┘  :
//!                                                               .....
//! ```
//!
//! At the *Application Push* stage, each [`push`](StreamBuffer::push) moves
//! one submission made of one or more [`Region`]s into the buffer, optionally
//! with a [`Notifier`]. Regions are queued as-is, never copied.
//!
//! The *Protocol Engine* reads the unread range either with
//! [`pull`](StreamBuffer::pull), which offers [`IoSlice`](std::io::IoSlice)
//! descriptors pointing straight into the queued regions, or with
//! [`seek`](StreamBuffer::seek) after copying the data by other means. Reading
//! moves the `read` cursor but frees nothing: the bytes are still needed for
//! retransmission.
//!
//! When acknowledgements arrive, [`consume`](StreamBuffer::consume) moves the
//! `consumed` cursor. Every region now fully acknowledged is evicted in FIFO
//! order, and a submission's notifier fires with [`Status::Ok`] when its last
//! region is evicted. [`cancel`](StreamBuffer::cancel) instead drains
//! everything at once and fires every outstanding notifier with
//! [`Status::Cancelled`].
//!
//! # Features
//!
//! - **Zero-Copy Submissions**: any owned buffer implementing [`DynBuf`] can be pushed, and [`Region::view`] carves
//!   sub-regions without copying
//! - **Vectored Pulls**: up to `max_regions` descriptors per pull, spanning region boundaries
//! - **Suspendable Pulls**: a pull with no data is stored and resumed by the next [`push`](StreamBuffer::push) or
//!   [`end`](StreamBuffer::end) (see [`PullOptions`])
//! - **Batched Completion**: one [`Notifier`] per submission, however many regions it spans
//! - **Terminal Cancellation**: every notifier fires exactly once, in submission order
//! - **Buffer Reuse**: [`Boomerang`](crate::collections::Boomerang) returns a backing buffer once it is evicted
//!
//! # Quick Start
//!
//! ```
//! use ackbuf::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut buffer = StreamBuffer::builder().id(4).max_regions(8).build();
//!
//!     // Producer: one submission, two regions, awaitable completion
//!     let (notifier, acked) = Notifier::channel();
//!     buffer.push([Region::from("hello "), Region::from("world")], Some(notifier))?;
//!     buffer.end();
//!
//!     // Transport: build a packet from the unread bytes
//!     buffer.pull_default(PullOptions::SYNC, |status, slices, done| {
//!         assert_eq!(status, PullStatus::End);
//!         let len: usize = slices.iter().map(|s| s.len()).sum();
//!         done.complete(len).unwrap();
//!     })?;
//!     assert_eq!(buffer.remaining(), 0);
//!
//!     // Transport: the packet got acknowledged
//!     buffer.consume(11);
//!     assert_eq!(acked.await?, Status::Ok);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Cursors
//!
//! A buffer tracks three positions in the stream, with
//! `consumed <= read <= pushed` at all times:
//!
//! - [`length()`](StreamBuffer::length) is `pushed - consumed`, the bytes held in memory;
//! - [`remaining()`](StreamBuffer::remaining) is `pushed - read`, the bytes not yet handed to the transport.
//!
//! Seeking or consuming more than available is not an error: both operations
//! clamp and return the amount they actually advanced. In particular
//! acknowledgement can never outrun the read cursor.
//!
//! # Pulls
//!
//! A pull hands a continuation a [`PullStatus`], the descriptors, and a
//! one-shot [`Done`] token:
//!
//! ```text
//!   remaining > 0          ──►  More  (or End if this batch reaches the end of an ended stream)
//!   remaining = 0, ended   ──►  EmptyEnd
//!   remaining = 0, open    ──►  WouldBlock with SYNC, suspended otherwise
//!   cancelled              ──►  Cancelled
//! ```
//!
//! The descriptors borrow the buffer and cannot escape the continuation. The
//! read cursor advances by the amount passed to [`Done::complete`] once the
//! continuation returns, so a transport that takes less than it was offered
//! keeps pulling, even after [`PullStatus::End`], until
//! [`remaining()`](StreamBuffer::remaining) is 0. At most one pull can be
//! suspended per buffer.
//!
//! # Logging
//!
//! Ackbuf emits [`tracing`] events: `trace` for cursor movements, evictions
//! and pull deliveries, `debug` for end of stream and cancellation, and `warn`
//! for a pull continuation that never completed. Every event carries the
//! buffer `id` set with [`StreamBufferBuilder::id`].
mod buffers;
pub mod collections;
mod error;
mod stream;
mod sync;

pub use buffers::{DynBuf, Region};
pub use error::BufferError;
#[cfg(feature = "stats")]
pub use stream::BufferStats;
pub use stream::{Done, PullOptions, PullOutcome, PullStatus, StreamBuffer, StreamBufferBuilder};
pub use sync::{Notifier, Status};
