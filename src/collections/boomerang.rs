use std::{any::Any, fmt};

use tokio::sync::oneshot;

use crate::buffers::{DynBuf, Region};

/// Storage that travels back to its producer once the stream releases it.
///
/// [`Boomerang::new`] turns an owned buffer into a [`Region`] ready to be
/// pushed, plus a receiver. When the last region referencing the storage is
/// dropped, which for a pushed region means evicted after acknowledgement or
/// released by a cancellation, the buffer is sent back through that receiver
/// and can be refilled without a new allocation.
///
/// # Examples
///
/// ```
/// use ackbuf::{StreamBuffer, collections::Boomerang};
///
/// #[tokio::main]
/// async fn main() {
///     let mut buffer = StreamBuffer::new();
///     let mut storage = vec![7u8; 1024];
///
///     for _ in 0..3 {
///         let (region, back) = Boomerang::new(storage);
///         buffer.push([region], None).unwrap();
///         buffer.seek(1024);
///         buffer.consume(1024);
///
///         // Evicted: the same vector is ready to be reused
///         storage = back.await.unwrap();
///     }
/// }
/// ```
pub struct Boomerang<T> {
    buf: Option<T>,
    home: Option<oneshot::Sender<T>>,
}

impl<T> Boomerang<T>
where
    T: DynBuf + 'static,
{
    /// Wraps `buf` into a region and returns the receiver `buf` comes back
    /// through.
    pub fn new(buf: T) -> (Region, oneshot::Receiver<T>) {
        let (home, back) = oneshot::channel();
        let boomerang = Self {
            buf: Some(buf),
            home: Some(home),
        };
        (Region::from(boomerang), back)
    }
}

impl<T> Boomerang<T> {
    /// The wrapped storage.
    pub fn get_ref(&self) -> Option<&T> {
        self.buf.as_ref()
    }
}

impl<T: fmt::Debug> fmt::Debug for Boomerang<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let awaited = self.home.as_ref().is_some_and(|home| !home.is_closed());
        f.debug_struct("Boomerang")
            .field("buf", &self.buf)
            .field("awaited", &awaited)
            .finish()
    }
}

impl<T> Drop for Boomerang<T> {
    fn drop(&mut self) {
        if let (Some(buf), Some(home)) = (self.buf.take(), self.home.take()) {
            // The producer may have stopped waiting
            let _ = home.send(buf);
        }
    }
}

impl<T> DynBuf for Boomerang<T>
where
    T: DynBuf + 'static,
{
    fn as_slice(&self) -> &[u8] {
        match &self.buf {
            Some(buf) => buf.as_slice(),
            None => &[],
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
