use std::fmt;

use tokio::sync::oneshot;

/// Final status delivered to a [`Notifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Every byte of the submission has been acknowledged by the transport.
    Ok,
    /// The stream was cancelled before the submission was fully acknowledged.
    Cancelled,
}

impl Status {
    /// Returns `true` if the submission was fully acknowledged.
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns `true` if the submission was dropped by a cancellation.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

type Callback = Box<dyn FnOnce(Status) + Send + Sync>;

/// A one-shot completion handle attached to a submission.
///
/// The notifier passed to [`StreamBuffer::push`](crate::StreamBuffer::push) is
/// shared by every region of that submission and invoked exactly once: with
/// [`Status::Ok`] when the last region is evicted after acknowledgement, or
/// with [`Status::Cancelled`] when the stream is cancelled first.
///
/// A notifier that is dropped without having fired (e.g. while unwinding)
/// reports [`Status::Cancelled`], so a waiter is never left pending.
///
/// # Examples
///
/// ```
/// use std::sync::{
///     Arc,
///     atomic::{AtomicBool, Ordering},
/// };
///
/// use ackbuf::{Notifier, Status, StreamBuffer};
///
/// let acked = Arc::new(AtomicBool::new(false));
/// let c_acked = acked.clone();
/// let notifier = Notifier::new(move |status| {
///     assert_eq!(status, Status::Ok);
///     c_acked.store(true, Ordering::SeqCst);
/// });
///
/// let mut buffer = StreamBuffer::new();
/// buffer.push([vec![0u8; 10]], Some(notifier)).unwrap();
/// buffer.seek(10);
/// buffer.consume(10);
/// assert!(acked.load(Ordering::SeqCst));
/// ```
pub struct Notifier {
    inner: Option<Callback>,
}

impl Notifier {
    /// Creates a notifier invoking `f` with the final [`Status`].
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Status) + Send + Sync + 'static,
    {
        Self {
            inner: Some(Box::new(f)),
        }
    }

    /// Creates a notifier that delivers its [`Status`] through a oneshot
    /// channel, for producers that want to `.await` acknowledgement.
    ///
    /// # Examples
    ///
    /// ```
    /// use ackbuf::{Notifier, Status, StreamBuffer};
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let (notifier, acked) = Notifier::channel();
    ///
    ///     let mut buffer = StreamBuffer::new();
    ///     buffer.push(["hello"], Some(notifier)).unwrap();
    ///     buffer.cancel();
    ///
    ///     assert_eq!(acked.await.unwrap(), Status::Cancelled);
    /// }
    /// ```
    pub fn channel() -> (Self, oneshot::Receiver<Status>) {
        let (sender, receiver) = oneshot::channel();
        let notifier = Self::new(move |status| {
            // The producer may have stopped waiting
            let _ = sender.send(status);
        });
        (notifier, receiver)
    }

    /// Fires the notifier. Subsequent calls, including the one from `Drop`,
    /// are no-ops.
    pub(crate) fn notify(mut self, status: Status) {
        if let Some(f) = self.inner.take() {
            f(status);
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("armed", &self.inner.is_some())
            .finish()
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        if let Some(f) = self.inner.take() {
            f(Status::Cancelled);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
        mpsc::channel,
    };

    use super::*;

    #[test]
    fn notifier_fires_once() {
        // 1. Explicit notify
        let count = Arc::new(AtomicUsize::new(0));
        let c_count = count.clone();
        let notifier = Notifier::new(move |status| {
            assert_eq!(status, Status::Ok);
            c_count.fetch_add(1, Ordering::SeqCst);
        });
        notifier.notify(Status::Ok);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // 2. Dropped without notify reports cancellation
        let (sender, receiver) = channel();
        let notifier = Notifier::new(move |status| sender.send(status).unwrap());
        drop(notifier);
        assert_eq!(receiver.try_recv().unwrap(), Status::Cancelled);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn status_display() {
        assert_eq!(Status::Ok.to_string(), "ok");
        assert_eq!(Status::Cancelled.to_string(), "cancelled");
        assert!(Status::Ok.is_ok());
        assert!(Status::Cancelled.is_cancelled());
    }

    #[tokio::test]
    async fn notifier_channel() {
        // 1. Status delivered through the channel
        let (notifier, receiver) = Notifier::channel();
        notifier.notify(Status::Ok);
        assert_eq!(receiver.await.unwrap(), Status::Ok);

        // 2. Receiver dropped before firing does not panic
        let (notifier, receiver) = Notifier::channel();
        drop(receiver);
        notifier.notify(Status::Cancelled);
    }
}
