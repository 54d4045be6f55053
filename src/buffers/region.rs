use core::{
    fmt,
    ops::{Bound, Deref, Range, RangeBounds},
};
use std::{any::Any, sync::Arc};

/// Owned storage that can be handed to a [`StreamBuffer`](crate::StreamBuffer).
///
/// The buffer keeps the storage alive, behind an [`Arc`], from
/// [`push`](crate::StreamBuffer::push) until every byte of it is acknowledged
/// or the stream is cancelled. It is never copied nor mutated in between, and
/// it may be dropped on whichever task drives the buffer, hence
/// `Send + Sync`.
///
/// Implement it for a pooled or otherwise custom buffer to push it without
/// converting to a [`Vec<u8>`] first.
///
/// # Examples
///
/// ```
/// use std::any::Any;
///
/// use ackbuf::DynBuf;
///
/// struct Preamble;
///
/// impl DynBuf for Preamble {
///     fn as_slice(&self) -> &[u8] {
///         b"PRI * HTTP/2.0"
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
/// ```
pub trait DynBuf: Send + Sync {
    /// The bytes to transmit.
    fn as_slice(&self) -> &[u8];

    /// The concrete storage, for [`Region::downcast_ref`].
    fn as_any(&self) -> &dyn Any;
}

macro_rules! dyn_buf {
    ($($ty:ty),* $(,)?) => {$(
        impl DynBuf for $ty {
            fn as_slice(&self) -> &[u8] {
                AsRef::<[u8]>::as_ref(self)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    )*};
}

dyn_buf!(Vec<u8>, Box<[u8]>, String, &'static [u8], &'static str);

impl<const N: usize> DynBuf for [u8; N] {
    fn as_slice(&self) -> &[u8] {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A contiguous piece of a submission.
///
/// A push moves one or more regions into the stream buffer, which queues each
/// of them as-is and releases it once the transport acknowledges its last
/// byte. Regions are views over shared storage: [`view`](Region::view) carves
/// a sub-region without copying, so one allocation can be split across
/// several regions, or several submissions, and is freed when the last of
/// them is evicted.
///
/// # Examples
///
/// ```
/// use ackbuf::{Region, StreamBuffer};
///
/// let frame: Region = vec![0u8, 1, 2, 3, 4, 5, 6, 7].into();
///
/// // Header and payload queued as two regions of one submission
/// let header = frame.view(..2).unwrap();
/// let payload = frame.view(2..).unwrap();
/// assert_eq!(payload.as_slice(), &[2, 3, 4, 5, 6, 7]);
///
/// let mut buffer = StreamBuffer::new();
/// buffer.push([header, payload], None).unwrap();
/// assert_eq!(buffer.length(), 8);
///
/// // The storage is still reachable in its original type
/// let vec: &Vec<u8> = frame.downcast_ref().unwrap();
/// assert_eq!(vec.len(), 8);
/// ```
#[derive(Clone)]
pub struct Region {
    buf: Arc<dyn DynBuf>,
    /// Byte range of `buf` covered by this region, always within bounds.
    range: Range<usize>,
}

impl Region {
    /// Number of bytes this region contributes to the stream.
    pub const fn len(&self) -> usize {
        self.range.end - self.range.start
    }

    /// Returns `true` for a region that contributes nothing. Such regions are
    /// skipped by [`push`](crate::StreamBuffer::push).
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The bytes of this region.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf.as_slice()[self.range.clone()]
    }

    /// Returns the backing storage as `T`, if that is its type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.buf.as_any().downcast_ref()
    }

    /// Carves a sub-region sharing the same storage.
    ///
    /// `range` is relative to this region. Returns `None` if it does not fit.
    #[must_use]
    pub fn view(&self, range: impl RangeBounds<usize>) -> Option<Self> {
        let bounds = (range.start_bound().cloned(), range.end_bound().cloned());
        let len = self.as_slice().get(bounds)?.len();
        let offset = match bounds.0 {
            Bound::Included(n) => n,
            Bound::Excluded(n) => n + 1,
            Bound::Unbounded => 0,
        };
        let start = self.range.start + offset;
        Some(Self {
            buf: self.buf.clone(),
            range: start..start + len,
        })
    }

    /// Number of live references to the backing storage.
    #[cfg(test)]
    pub(crate) fn ref_count(&self) -> usize {
        Arc::strong_count(&self.buf)
    }

    #[cfg(test)]
    pub(crate) fn rand(len: usize) -> Self {
        use rand::Rng;
        let mut rng = rand::rng();
        (0..len).map(|_| rng.random()).collect::<Vec<u8>>().into()
    }
}

impl Deref for Region {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("len", &self.len())
            .field("shared", &(Arc::strong_count(&self.buf) > 1))
            .finish()
    }
}

impl<T> From<T> for Region
where
    T: DynBuf + 'static,
{
    fn from(buf: T) -> Self {
        let len = buf.as_slice().len();
        Self {
            buf: Arc::new(buf),
            range: 0..len,
        }
    }
}
