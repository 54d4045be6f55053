use thiserror::Error;

/// Errors surfaced by [`StreamBuffer`](crate::StreamBuffer) operations.
///
/// Clamped flow conditions (seeking or consuming more than available) are not
/// errors: those operations return the amount they actually advanced. Every
/// variant below is either a contract violation by the caller or the
/// [`WouldBlock`](BufferError::WouldBlock) synchronicity conflict.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// A submission was pushed after [`end()`](crate::StreamBuffer::end).
    #[error("Stream already ended - no further data can be pushed")]
    AlreadyEnded,

    /// An operation was attempted after [`cancel()`](crate::StreamBuffer::cancel).
    ///
    /// Cancellation is terminal: the buffer only reports zero length and zero
    /// remaining bytes afterwards.
    #[error("Stream already cancelled")]
    AlreadyCancelled,

    /// A [`SYNC`](crate::PullOptions::SYNC) pull found no unread data while the
    /// stream is still open.
    ///
    /// The caller may retry later or pull again without `SYNC` to be resumed
    /// by the next push.
    #[error("No data available for a synchronous pull")]
    WouldBlock,

    /// A pull was issued while another one is still suspended.
    ///
    /// At most one pull request can be pending per buffer.
    #[error("A pull request is already pending on this stream")]
    PullPending,

    /// [`Done::complete`](crate::Done::complete) was called with more bytes
    /// than the pull offered.
    #[error("Completed {completed} bytes but only {offered} were offered")]
    CompletionOverrun {
        /// Total length of the descriptors handed to the continuation.
        offered: usize,
        /// Amount passed to `complete`.
        completed: usize,
    },
}
